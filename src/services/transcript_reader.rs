//! 转写文件读取服务 - 业务能力层
//!
//! 只负责"把一个文本文件读成字符串"能力，不关心流程。
//! 转写稿可能来自不同系统导出，编码不统一，因此按候选编码
//! 列表逐个尝试解码

use encoding_rs::{Encoding, EUC_KR, UTF_8};
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 候选编码列表（按优先级排列）
///
/// UTF-8 优先；EUC-KR 即 WHATWG 的 windows-949，同时覆盖
/// 旧系统导出的 cp949 / euc-kr 两种标法
const CANDIDATE_ENCODINGS: &[&Encoding] = &[UTF_8, EUC_KR];

/// 读取转写文件内容
///
/// 依次用候选编码解码，第一个无错解码的编码胜出；
/// 所有候选都失败时返回解码错误。
/// 读不到文件（权限、不存在）立即失败，本层不做重试
pub async fn read_transcript(path: &Path) -> AppResult<String> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| AppError::file_read_failed(path, e))?;

    for encoding in CANDIDATE_ENCODINGS {
        let (text, _, had_errors) = encoding.decode(&bytes);
        if !had_errors {
            debug!("文件 {} 以 {} 编码读取成功", path.display(), encoding.name());
            return Ok(text.into_owned());
        }
    }

    Err(AppError::decode_failed(path, candidate_names()))
}

/// 候选编码名称列表（用于错误信息）
pub fn candidate_names() -> Vec<&'static str> {
    CANDIDATE_ENCODINGS.iter().map(|e| e.name()).collect()
}
