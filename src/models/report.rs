//! 批处理结果模型

use std::path::PathBuf;

/// 单个文件的处理结果
///
/// 每个被发现的文件恰好产生一条记录，process_file 完成后不再变更
#[derive(Debug)]
pub struct SummaryRecord {
    /// 源文件路径
    pub source: PathBuf,
    /// 摘要输出路径（失败时为 None）
    pub output: Option<PathBuf>,
    /// 失败原因（成功时为 None）
    pub error: Option<String>,
}

impl SummaryRecord {
    /// 创建成功记录
    pub fn succeeded(source: PathBuf, output: PathBuf) -> Self {
        Self {
            source,
            output: Some(output),
            error: None,
        }
    }

    /// 创建失败记录
    pub fn failed(source: PathBuf, error: String) -> Self {
        Self {
            source,
            output: None,
            error: Some(error),
        }
    }

    /// 该文件是否处理成功
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// 批处理最终报告
///
/// 批次结束时构建一次，之后不可变。
/// 不变式：processed + failed == total
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// 发现的文件总数
    pub total: usize,
    /// 成功处理数
    pub processed: usize,
    /// 失败数
    pub failed: usize,
    /// 批次整体是否成功（预检失败时为 false）
    pub success: bool,
    /// 预检失败的原因
    pub error: Option<String>,
}

impl BatchReport {
    /// 从逐文件记录构建完成报告
    pub fn from_records(records: &[SummaryRecord]) -> Self {
        let processed = records.iter().filter(|r| r.is_success()).count();
        Self {
            total: records.len(),
            processed,
            failed: records.len() - processed,
            success: true,
            error: None,
        }
    }

    /// 构建空批次报告（没有发现任何文件，不算错误）
    pub fn empty() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// 构建预检失败报告
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            ..Default::default()
        }
    }
}
