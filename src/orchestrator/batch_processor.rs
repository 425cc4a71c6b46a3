//! 批量摘要处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个流水线的入口，负责批量转写文件的处理与统计。
//!
//! ## 核心功能
//!
//! 1. **预检**：校验输入目录、创建输出目录
//! 2. **文件发现**：递归扫描 .txt 文件并按相对路径排序
//! 3. **顺序处理**：逐个文件走 读取 → 摘要 → 写入 流水线
//! 4. **失败隔离**：单个文件失败只计数，不中止批次
//! 5. **全局统计**：累计 token 用量，汇总最终报告
//!
//! ## 设计特点
//!
//! - 串行处理：同一时刻只有一个文件在途，调用间隔由摘要服务控制
//! - 失败语义：只有预检失败会在处理任何文件之前中止并上抛
//! - 向下委托：单个文件的细节交给 file_processor

use std::path::Path;
use tokio::fs;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::clients::gemini::{GeminiClient, GenerativeClient};
use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::{BatchReport, SummaryRecord, TokenUsage, TranscriptFile};
use crate::orchestrator::file_processor::process_file;
use crate::services::summary_service::SummaryService;

/// 转写文件扩展名（字面量精确匹配，区分大小写）
pub const TRANSCRIPT_EXTENSION: &str = "txt";

/// 批量摘要处理器
pub struct BatchProcessor<C: GenerativeClient> {
    service: SummaryService<C>,
}

impl BatchProcessor<GeminiClient> {
    /// 按配置创建批量处理器
    pub fn new(config: &Config) -> Self {
        Self {
            service: SummaryService::new(config),
        }
    }
}

impl<C: GenerativeClient> BatchProcessor<C> {
    /// 使用指定摘要服务创建批量处理器（测试可注入假客户端）
    pub fn with_service(service: SummaryService<C>) -> Self {
        Self { service }
    }

    /// 处理整个输入目录
    ///
    /// # 参数
    /// - `input_root`: 转写文件所在根目录
    /// - `output_root`: 摘要输出根目录（不存在会创建）
    ///
    /// # 返回
    /// 返回批处理报告；预检失败（输入目录无效等）直接返回错误
    pub async fn process_folder(
        &self,
        input_root: &Path,
        output_root: &Path,
    ) -> AppResult<BatchReport> {
        // ========== 预检 ==========
        if !input_root.exists() {
            return Err(AppError::Config(ConfigError::InputDirNotFound {
                path: input_root.display().to_string(),
            }));
        }
        if !input_root.is_dir() {
            return Err(AppError::Config(ConfigError::NotADirectory {
                path: input_root.display().to_string(),
            }));
        }

        fs::create_dir_all(output_root)
            .await
            .map_err(|e| AppError::create_dir_failed(output_root, e))?;

        // ========== 文件发现 ==========
        let files = discover_transcripts(input_root)?;

        if files.is_empty() {
            warn!("⚠️ 没有找到待处理的 .txt 文件");
            return Ok(BatchReport::empty());
        }

        log_files_found(files.len(), self.service.model_name());

        // ========== 逐个处理 ==========
        let mut usage = TokenUsage::default();
        let mut records = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            log_file_progress(index + 1, files.len(), &file.file_name());

            match process_file(&self.service, file, input_root, output_root, &mut usage).await {
                Ok(output_path) => {
                    records.push(SummaryRecord::succeeded(
                        file.absolute_path.clone(),
                        output_path,
                    ));
                }
                Err(e) => {
                    error!("❌ 文件处理失败 ({}): {}", file.absolute_path.display(), e);
                    records.push(SummaryRecord::failed(
                        file.absolute_path.clone(),
                        e.to_string(),
                    ));
                }
            }
        }

        // ========== 汇总 ==========
        let report = BatchReport::from_records(&records);
        log_batch_complete(&report, &usage, self.service.model_name());

        Ok(report)
    }
}

/// 递归发现输入目录下的所有转写文件
///
/// 遍历顺序与平台相关，这里统一按相对路径字典序排序，
/// 保证处理顺序与进度日志可复现
pub fn discover_transcripts(input_root: &Path) -> AppResult<Vec<TranscriptFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(input_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(TRANSCRIPT_EXTENSION) {
            // 由根目录遍历得到的文件必然在根目录之下，strip 不会失败
            if let Ok(relative) = path.strip_prefix(input_root) {
                files.push(TranscriptFile::new(
                    path.to_path_buf(),
                    relative.to_path_buf(),
                ));
            }
        }
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    info!("📁 共发现 {} 个 .txt 文件", files.len());

    Ok(files)
}

// ========== 日志辅助函数 ==========

fn log_files_found(total: usize, model_name: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 开始批量摘要，共 {} 个文件", total);
    info!("📊 使用模型: {}", model_name);
    info!("{}", "=".repeat(60));
}

fn log_file_progress(index: usize, total: usize, file_name: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📄 文件处理中... [{}/{}] {}", index, total, file_name);
}

fn log_batch_complete(report: &BatchReport, usage: &TokenUsage, model_name: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "✅ 成功: {}/{}，❌ 失败: {}",
        report.processed, report.total, report.failed
    );
    info!(
        "全部 token 用量 - 输入: {}, 输出: {}, 总计: {} (模型: {})",
        usage.total_input_tokens,
        usage.total_output_tokens,
        usage.total(),
        model_name
    );
    info!("{}", "=".repeat(60));
}
