//! # Transcript Summarizer
//!
//! AI 会议转写稿批量摘要系统
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Clients）
//! - `clients/gemini` - Gemini generateContent 的单次调用封装，
//!   文本进、文本出，附带可选的 token 用量侧信道
//!
//! ### ② 业务能力层（Services）
//! - `services/transcript_reader` - 按候选编码列表容错读取文本文件
//! - `services/summary_service` - 重试与退避包装下的摘要能力
//! - `services/output_path` - 确定性输出路径推导
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理：发现、排序、统计
//! - `orchestrator/file_processor` - 单个文件的完整流水线
//!
//! ### ④ 交互层（App）
//! - `app` - 菜单交互与结果展示，不含流水线逻辑
//!
//! ## 失败语义
//!
//! 预检失败（输入目录无效、密钥缺失）中止整个批次；
//! 单个文件的读取 / 解码 / 摘要 / 写入失败只计入失败数，批次继续

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::{GeminiClient, GenerateReply, GenerativeClient};
pub use config::{ApiMode, Config, DEFAULT_PROMPT};
pub use error::{AppError, AppResult, ConfigError, FileError, SummarizeError};
pub use models::{BatchReport, SummaryRecord, TokenUsage, TranscriptFile, UsageMetadata};
pub use orchestrator::{discover_transcripts, BatchProcessor};
pub use services::{resolve_output_path, sanitize_model_name, SummaryService};
