use std::time::Duration;

use crate::error::{AppResult, ConfigError};

/// 默认摘要提示词
///
/// 在用户未输入自定义提示词时使用
pub const DEFAULT_PROMPT: &str = "你是一名出色的会议纪要整理者。给定的 txt 文件是一份会议\
逐字转写稿，请做一份非常详细且符合 MECE 原则的整理。注意：删除时间戳；不要使用表格形式。";

/// 默认最大重试次数
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// API 模式枚举
///
/// 免费和付费密钥的速率上限不同，因此模型与调用间隔按模式区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMode {
    /// 免费 API（有速率限制）
    Free,
    /// 付费 API（最高速率）
    Paid,
}

impl ApiMode {
    /// 尝试从字符串解析 API 模式（精确匹配）
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(ApiMode::Free),
            "paid" => Some(ApiMode::Paid),
            _ => None,
        }
    }

    /// 获取该模式使用的模型标识
    pub fn model_name(self) -> &'static str {
        match self {
            ApiMode::Free => "gemini-1.5-flash-latest",
            ApiMode::Paid => "gemini-2.5-flash-preview-05-20",
        }
    }

    /// 获取该模式的基础调用间隔（秒）
    pub fn delay_seconds(self) -> f64 {
        match self {
            ApiMode::Free => 4.0,
            ApiMode::Paid => 0.2,
        }
    }

    /// 获取该模式的基础调用间隔
    pub fn base_delay(self) -> Duration {
        Duration::from_secs_f64(self.delay_seconds())
    }

    /// 获取显示名称
    pub fn display_name(self) -> &'static str {
        match self {
            ApiMode::Free => "免费 API (有速率限制)",
            ApiMode::Paid => "付费 API (最高速率)",
        }
    }

    /// 获取存放 API 密钥的环境变量名
    pub fn env_key_name(self) -> &'static str {
        match self {
            ApiMode::Free => "GOOGLE_API_KEY_FREE",
            ApiMode::Paid => "GOOGLE_API_KEY_PAID",
        }
    }
}

impl std::fmt::Display for ApiMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// 程序运行配置
///
/// 一次批处理运行期间不可变
#[derive(Clone, Debug)]
pub struct Config {
    /// API 模式
    pub api_mode: ApiMode,
    /// 用户自定义提示词（None 表示使用默认提示词）
    pub custom_prompt: Option<String>,
    /// 单个文件的最大 API 重试次数
    pub max_retries: usize,
    /// 当前模式对应的 API 密钥
    pub api_key: String,
}

impl Config {
    /// 按模式从环境加载配置
    ///
    /// 先加载 .env 文件（不存在则忽略），再读取模式对应的密钥环境变量；
    /// 密钥缺失视为配置错误
    pub fn from_env(api_mode: ApiMode, custom_prompt: Option<String>) -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let env_key = api_mode.env_key_name();
        let api_key = std::env::var(env_key).map_err(|_| {
            crate::error::AppError::Config(ConfigError::MissingApiKey {
                env_key: env_key.to_string(),
                display_name: api_mode.display_name().to_string(),
            })
        })?;

        let max_retries = std::env::var("SUMMARY_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n| n >= 1)
            .unwrap_or(DEFAULT_MAX_RETRIES);

        Ok(Self {
            api_mode,
            custom_prompt,
            max_retries,
            api_key,
        })
    }

    /// 使用显式密钥构造配置（测试用）
    pub fn with_api_key(api_mode: ApiMode, api_key: impl Into<String>) -> Self {
        Self {
            api_mode,
            custom_prompt: None,
            max_retries: DEFAULT_MAX_RETRIES,
            api_key: api_key.into(),
        }
    }

    /// 获取本次运行实际使用的提示词
    pub fn prompt(&self) -> &str {
        self.custom_prompt.as_deref().unwrap_or(DEFAULT_PROMPT)
    }
}
