//! 模型网关的统一响应类型与Gemini REST协议的线上类型

use serde::{Deserialize, Serialize};

/// 一次模型调用的归一化结果
///
/// 网关把provider的原始响应收敛成这个形状后交给各阶段，
/// 阶段代码不感知底层协议细节。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    /// 模型输出的文本内容（candidates的parts拼接）
    pub text: Option<String>,
    /// token使用量元数据
    pub usage: Option<UsageMetadata>,
    /// 搜索溯源引用，仅在授予搜索工具时出现
    pub grounding_references: Vec<GroundingReference>,
}

impl ModelResponse {
    /// 取出非空的输出文本
    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// token使用量
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// 输入token数
    pub prompt_token_count: Option<u64>,
    /// 输出token数
    pub candidates_token_count: Option<u64>,
    /// 总token数
    pub total_token_count: Option<u64>,
}

impl UsageMetadata {
    pub fn new(prompt_tokens: u64, candidates_tokens: u64) -> Self {
        Self {
            prompt_token_count: Some(prompt_tokens),
            candidates_token_count: Some(candidates_tokens),
            total_token_count: Some(prompt_tokens + candidates_tokens),
        }
    }

    /// 总token数，缺失时从输入/输出推算
    pub fn total_tokens(&self) -> u64 {
        self.total_token_count.unwrap_or_else(|| {
            self.prompt_token_count.unwrap_or(0) + self.candidates_token_count.unwrap_or(0)
        })
    }
}

/// 搜索溯源引用（citation），作为"发现的来源"的代理
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingReference {
    pub uri: String,
    pub title: String,
}

// ---- 以下为Gemini generateContent协议的线上类型 ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<WireGenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

impl WireContent {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![WirePart { text: Some(text.into()) }],
        }
    }

    pub fn system_text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![WirePart { text: Some(text.into()) }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireGenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WireTool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<WireCandidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireCandidate {
    pub content: Option<WireContent>,
    pub grounding_metadata: Option<WireGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireGroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<WireGroundingChunk>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireGroundingChunk {
    pub web: Option<WireWebSource>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireWebSource {
    pub uri: Option<String>,
    pub title: Option<String>,
}
