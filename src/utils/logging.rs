//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// 默认 info 级别，可通过 RUST_LOG 环境变量覆盖；
/// 重复初始化（如测试中多次调用）静默忽略
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
