//! 转写文件模型

use std::path::PathBuf;

/// 已发现的转写文件
///
/// 只读引用，发现后不再变更
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFile {
    /// 绝对（或调用方给定的完整）路径
    pub absolute_path: PathBuf,
    /// 相对输入根目录的路径，用于镜像输出目录结构
    pub relative_path: PathBuf,
}

impl TranscriptFile {
    pub fn new(absolute_path: PathBuf, relative_path: PathBuf) -> Self {
        Self {
            absolute_path,
            relative_path,
        }
    }

    /// 获取文件名（用于进度日志）
    pub fn file_name(&self) -> String {
        self.absolute_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}
