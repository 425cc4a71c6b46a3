//! 摘要服务 - 业务能力层
//!
//! 只负责"把一段文本变成摘要"能力，不关心流程。
//! 在客户端的单次调用之外包一层显式重试循环：
//! 每次调用的结果先归类为成功 / 瞬时失败 / 致命失败，
//! 再由循环决定退避重试还是立即放弃

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::clients::gemini::{GeminiClient, GenerativeClient};
use crate::config::Config;
use crate::error::{AppError, AppResult, SummarizeError};
use crate::models::{TokenUsage, UsageMetadata};

/// 指数退避的指数上限，防止移位溢出
const MAX_BACKOFF_EXPONENT: usize = 16;

/// 单次调用的归类结果
enum CallOutcome {
    /// 调用成功，拿到非空文本
    Success {
        text: String,
        usage: Option<UsageMetadata>,
    },
    /// 瞬时失败（空响应、网络故障、限流、服务端错误），可重试
    Transient { reason: String },
    /// 致命失败（如无效密钥），重试无意义
    Fatal { error: AppError },
}

/// 摘要服务
///
/// 职责：
/// - 拼接提示词与正文，发起生成调用
/// - 重试与退避：固定的模式间隔 + 指数退避
/// - 成功后把用量元数据累加进调用方持有的累计器
pub struct SummaryService<C: GenerativeClient> {
    client: C,
    prompt: String,
    model_name: String,
    max_retries: usize,
    base_delay: Duration,
}

impl SummaryService<GeminiClient> {
    /// 按配置创建摘要服务
    pub fn new(config: &Config) -> Self {
        Self::with_client(
            GeminiClient::new(config),
            config.prompt(),
            config.api_mode.model_name(),
            config.max_retries,
            config.api_mode.base_delay(),
        )
    }
}

impl<C: GenerativeClient> SummaryService<C> {
    /// 使用指定客户端创建摘要服务（测试可注入假客户端）
    pub fn with_client(
        client: C,
        prompt: impl Into<String>,
        model_name: impl Into<String>,
        max_retries: usize,
        base_delay: Duration,
    ) -> Self {
        Self {
            client,
            prompt: prompt.into(),
            model_name: model_name.into(),
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    /// 获取当前使用的模型标识
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 对一段转写文本生成摘要
    ///
    /// 最多尝试 max_retries 次；全部失败时返回带最后一次
    /// 失败原因的错误。成功调用的 token 用量累加进 `usage`
    pub async fn summarize(&self, content: &str, usage: &mut TokenUsage) -> AppResult<String> {
        let payload = format!("{}\n\n{}", self.prompt, content);
        let mut last_error = String::new();

        for attempt in 0..self.max_retries {
            // 第一次尝试不等待，之后每次调用前先遵守模式的基础间隔
            if attempt > 0 {
                info!(
                    "⏳ 为遵守 API 速率限制，等待 {:.1} 秒...",
                    self.base_delay.as_secs_f64()
                );
                sleep(self.base_delay).await;
            }

            match self.call_once(&payload).await {
                CallOutcome::Success { text, usage: meta } => {
                    self.record_usage(meta, usage);
                    return Ok(text);
                }
                CallOutcome::Transient { reason } => {
                    warn!(
                        "API 请求失败 (尝试 {}/{}): {}",
                        attempt + 1,
                        self.max_retries,
                        reason
                    );
                    last_error = reason;

                    if attempt + 1 < self.max_retries {
                        let backoff = self.backoff_delay(attempt);
                        info!("⏳ 等待 {:.1} 秒后重试...", backoff.as_secs_f64());
                        sleep(backoff).await;
                    }
                }
                CallOutcome::Fatal { error } => {
                    return Err(error);
                }
            }
        }

        Err(AppError::Summarize(SummarizeError::RetriesExhausted {
            attempts: self.max_retries,
            last_error,
        }))
    }

    /// 发起单次调用并归类结果
    async fn call_once(&self, payload: &str) -> CallOutcome {
        match self.client.generate(payload).await {
            Ok(reply) => {
                if reply.text.is_empty() {
                    // 空响应与限流导致的空内容此处不作区分，一律按瞬时失败重试
                    CallOutcome::Transient {
                        reason: SummarizeError::EmptyResponse.to_string(),
                    }
                } else {
                    CallOutcome::Success {
                        text: reply.text,
                        usage: reply.usage,
                    }
                }
            }
            Err(AppError::Summarize(e)) if e.is_retryable() => CallOutcome::Transient {
                reason: e.to_string(),
            },
            Err(error) => CallOutcome::Fatal { error },
        }
    }

    /// 计算第 attempt 次失败后的退避时长
    ///
    /// 指数项叠加模式的基础间隔，保证首个重试也不低于该模式的稳态上限
    fn backoff_delay(&self, attempt: usize) -> Duration {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        Duration::from_secs(1u64 << exponent) + self.base_delay
    }

    /// 记录并累计一次成功调用的 token 用量
    ///
    /// 用量元数据缺失或无效只写日志，不影响调用结果
    fn record_usage(&self, metadata: Option<UsageMetadata>, usage: &mut TokenUsage) {
        match metadata {
            Some(meta) => {
                usage.add(&meta);
                info!(
                    "Token 用量 - 输入: {}, 输出: {}, 总计: {} (模型: {})",
                    meta.prompt_token_count,
                    meta.candidates_token_count,
                    meta.total_token_count,
                    self.model_name
                );
            }
            None => {
                info!("未能获取 token 用量信息 (模型: {})", self.model_name);
            }
        }
    }
}
