//! Gemini API 客户端
//!
//! 封装对 generateContent 接口的单次调用：文本进、文本出，
//! 外加可选的 usageMetadata 侧信道。重试逻辑不在本层，由
//! services::summary_service 负责

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult, SummarizeError};
use crate::models::UsageMetadata;
use crate::utils::logging::truncate_text;

/// Gemini API 默认基础地址
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// 单次请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// 错误响应正文在日志与错误信息中的最大保留长度
const ERROR_BODY_MAX_LEN: usize = 200;

/// 一次生成调用的结果
#[derive(Debug, Clone)]
pub struct GenerateReply {
    /// 模型返回的文本（各 part 拼接；可能为空串）
    pub text: String,
    /// token 用量元数据（缺失或无效时为 None）
    pub usage: Option<UsageMetadata>,
}

/// 生成式模型客户端接口
///
/// 摘要服务通过该接口发起调用，测试时可注入假实现
#[allow(async_fn_in_trait)]
pub trait GenerativeClient {
    /// 发起一次生成调用
    async fn generate(&self, prompt: &str) -> AppResult<GenerateReply>;
}

// ========== 请求 / 响应报文 ==========

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Vec<Candidate>,
    /// 先按任意 JSON 接收，再尽力转换，避免字段形状变化导致整个响应解析失败
    usage_metadata: Option<JsonValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: String,
}

// ========== 客户端 ==========

/// Gemini 客户端
pub struct GeminiClient {
    http: Client,
    api_base: String,
    api_key: String,
    model_name: String,
}

impl GeminiClient {
    /// 按配置创建客户端（模型由 API 模式决定）
    pub fn new(config: &Config) -> Self {
        Self::with_model(config, config.api_mode.model_name())
    }

    /// 创建使用指定模型的客户端
    pub fn with_model(config: &Config, model_name: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: GEMINI_API_BASE.to_string(),
            api_key: config.api_key.clone(),
            model_name: model_name.into(),
        }
    }

    /// 覆盖 API 基础地址（测试或代理场景）
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// 获取当前使用的模型标识
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl GenerativeClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> AppResult<GenerateReply> {
        tracing::debug!(
            "调用 Gemini API，模型: {}，请求长度: {} 字符",
            self.model_name,
            prompt.len()
        );

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model_name, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await
            .map_err(AppError::request_failed)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Summarize(SummarizeError::BadStatus {
                status: status.as_u16(),
                message: truncate_text(&body, ERROR_BODY_MAX_LEN),
            }));
        }

        let parsed: GenerateResponse = response.json().await.map_err(AppError::request_failed)?;

        // 各候选 part 拼接成完整文本；候选缺失时得到空串，由上层决定是否重试
        let text: String = parsed
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect()
            })
            .unwrap_or_default();

        let usage = parsed
            .usage_metadata
            .as_ref()
            .and_then(UsageMetadata::from_value);

        Ok(GenerateReply { text, usage })
    }
}
