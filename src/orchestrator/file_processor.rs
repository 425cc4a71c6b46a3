//! 单个文件处理器 - 编排层
//!
//! 负责一个转写文件的完整流水线：
//! 读取 → 摘要 → 解析输出路径 → 写入。
//! 任何一步失败都向上返回错误，由批处理器决定计数与继续

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::clients::gemini::GenerativeClient;
use crate::error::{AppError, AppResult};
use crate::models::{TokenUsage, TranscriptFile};
use crate::services::output_path::resolve_output_path;
use crate::services::summary_service::SummaryService;
use crate::services::transcript_reader::read_transcript;

/// 处理单个转写文件
///
/// # 参数
/// - `service`: 摘要服务
/// - `file`: 待处理文件
/// - `input_root`: 输入根目录
/// - `output_root`: 输出根目录
/// - `usage`: 批次级 token 用量累计器
///
/// # 返回
/// 返回摘要写入的输出路径
pub async fn process_file<C: GenerativeClient>(
    service: &SummaryService<C>,
    file: &TranscriptFile,
    input_root: &Path,
    output_root: &Path,
    usage: &mut TokenUsage,
) -> AppResult<PathBuf> {
    // 读取内容（自动尝试候选编码）
    let content = read_transcript(&file.absolute_path).await?;
    debug!(
        "文件 {} 读取完成，{} 字符",
        file.file_name(),
        content.chars().count()
    );

    // AI 摘要（内部带重试）
    let summary = service.summarize(&content, usage).await?;

    // 推导输出路径（镜像目录结构，文件名带模型标识）
    let output_path = resolve_output_path(
        &file.absolute_path,
        input_root,
        output_root,
        service.model_name(),
    )?;

    // 写入结果，按需创建中间目录
    save_summary(&summary, &output_path).await?;

    Ok(output_path)
}

/// 把摘要写入输出文件（UTF-8，只含原始摘要文本）
async fn save_summary(summary: &str, output_path: &Path) -> AppResult<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::create_dir_failed(parent, e))?;
    }

    fs::write(output_path, summary.as_bytes())
        .await
        .map_err(|e| AppError::file_write_failed(output_path, e))?;

    info!("✓ 摘要已保存: {}", output_path.display());

    Ok(())
}
