//! 输出路径解析服务 - 业务能力层
//!
//! 只负责"由输入路径推导输出路径"能力。
//! 输出路径完全由 (输出根目录, 相对路径, 文件主名, 模型标识)
//! 决定，与摘要内容无关，因此重复运行会覆盖旧输出而不是追加

use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, FileError};

/// 清理模型标识中不适合做文件名的字符
///
/// 连字符和点统一替换为下划线
pub fn sanitize_model_name(model_name: &str) -> String {
    model_name.replace(['-', '.'], "_")
}

/// 解析单个输入文件的输出路径
///
/// 规则：保留相对输入根目录的中间目录结构，
/// 文件名为 `{主名}_summary_{清理后的模型标识}{原扩展名}`
pub fn resolve_output_path(
    input_file: &Path,
    input_root: &Path,
    output_root: &Path,
    model_name: &str,
) -> AppResult<PathBuf> {
    let relative = input_file.strip_prefix(input_root).map_err(|_| {
        AppError::File(FileError::OutsideRoot {
            path: input_file.display().to_string(),
            root: input_root.display().to_string(),
        })
    })?;

    let stem = input_file
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy();
    let extension = input_file
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let file_name = format!(
        "{}_summary_{}{}",
        stem,
        sanitize_model_name(model_name),
        extension
    );

    let parent = relative.parent().unwrap_or_else(|| Path::new(""));

    Ok(output_root.join(parent).join(file_name))
}
