//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量摘要处理器
//! - 预检输入 / 输出目录
//! - 递归发现并排序 .txt 转写文件
//! - 顺序驱动逐文件流水线，隔离单文件失败
//! - 持有 token 用量累计器，输出最终报告
//!
//! ### `file_processor` - 单个文件处理器
//! - 一个文件的完整流水线：读取 → 摘要 → 写入
//! - 不做计数，失败直接上抛给批处理器
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<TranscriptFile>)
//!     ↓
//! file_processor (处理单个 TranscriptFile)
//!     ↓
//! services (能力层：reader / summary / output_path)
//!     ↓
//! clients (基础设施：GeminiClient)
//! ```

pub mod batch_processor;
pub mod file_processor;

// 重新导出主要类型
pub use batch_processor::{discover_transcripts, BatchProcessor, TRANSCRIPT_EXTENSION};
pub use file_processor::process_file;
