//! Token 用量统计模型

use serde_json::Value as JsonValue;

/// 单次生成调用返回的 token 用量元数据
///
/// Gemini 响应中的 usageMetadata 字段，可能缺失
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageMetadata {
    /// 输入（提示词）token 数
    pub prompt_token_count: u64,
    /// 输出（候选内容）token 数
    pub candidates_token_count: u64,
    /// 总 token 数
    pub total_token_count: u64,
}

impl UsageMetadata {
    /// 从响应 JSON 中尽力提取用量元数据
    ///
    /// 字段缺失时按 0 计；整体不是对象则视为无效，返回 None。
    /// 无效或缺失的用量信息只影响统计，不影响调用本身
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        let obj = value.as_object()?;

        let count = |key: &str| obj.get(key).and_then(JsonValue::as_u64).unwrap_or(0);

        Some(Self {
            prompt_token_count: count("promptTokenCount"),
            candidates_token_count: count("candidatesTokenCount"),
            total_token_count: count("totalTokenCount"),
        })
    }
}

/// 整个批次的 token 用量累计
///
/// 由编排层持有，每次成功调用后累加，运行开始时归零
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    /// 累计输入 token 数
    pub total_input_tokens: u64,
    /// 累计输出 token 数
    pub total_output_tokens: u64,
}

impl TokenUsage {
    /// 累加一次调用的用量
    pub fn add(&mut self, metadata: &UsageMetadata) {
        self.total_input_tokens += metadata.prompt_token_count;
        self.total_output_tokens += metadata.candidates_token_count;
    }

    /// 获取输入与输出的总和
    pub fn total(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }
}
