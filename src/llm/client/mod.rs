//! 模型网关 - 与外部生成式模型服务通信的唯一接口

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::LLMConfig;
use crate::llm::client::types::{
    GenerateContentRequest, GenerateContentResponse, GroundingReference, ModelResponse,
    WireContent, WireGenerationConfig, WireTool,
};

pub mod types;
pub mod utils;

/// 单次模型调用的可选项
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// 作为持久上下文前置的系统指令
    pub system_instruction: Option<String>,
    /// 要求模型遵循的结构化输出schema
    pub response_schema: Option<serde_json::Value>,
    /// 授予模型的工具能力
    pub tools: Vec<ToolGrant>,
}

impl GenerateOptions {
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn with_tool(mut self, tool: ToolGrant) -> Self {
        self.tools.push(tool);
        self
    }
}

/// 工具授权，目前仅支持搜索溯源能力
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolGrant {
    GoogleSearch,
}

/// 模型网关接口
///
/// 网关只负责请求构造与响应提取，不做重试也不解释失败——
/// 失败处理策略属于各阶段（见pipeline::stages），或上抛给流水线驱动方。
/// 测试通过实现该trait注入确定性桩网关。
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// 执行一次模型调用
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<ModelResponse>;
}

/// Gemini REST协议的网关实现
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: LLMConfig,
}

impl GeminiClient {
    /// 创建新的网关客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("构建HTTP客户端失败")?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            model
        )
    }

    fn build_request(&self, prompt: &str, options: &GenerateOptions) -> GenerateContentRequest {
        let response_mime_type = options
            .response_schema
            .as_ref()
            .map(|_| "application/json".to_string());

        GenerateContentRequest {
            contents: vec![WireContent::user_text(prompt)],
            system_instruction: options
                .system_instruction
                .as_deref()
                .map(WireContent::system_text),
            generation_config: Some(WireGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                response_mime_type,
                response_schema: options.response_schema.clone(),
            }),
            tools: options
                .tools
                .iter()
                .map(|tool| match tool {
                    ToolGrant::GoogleSearch => WireTool {
                        google_search: Some(serde_json::json!({})),
                    },
                })
                .collect(),
        }
    }

    fn extract_response(&self, raw: GenerateContentResponse) -> ModelResponse {
        let mut text_parts: Vec<String> = Vec::new();
        let mut grounding_references = Vec::new();

        for candidate in raw.candidates {
            if let Some(content) = candidate.content {
                for part in content.parts {
                    if let Some(text) = part.text {
                        text_parts.push(text);
                    }
                }
            }
            if let Some(grounding) = candidate.grounding_metadata {
                for chunk in grounding.grounding_chunks {
                    if let Some(web) = chunk.web
                        && let (Some(uri), Some(title)) = (web.uri, web.title)
                    {
                        grounding_references.push(GroundingReference { uri, title });
                    }
                }
            }
        }

        let text = if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join(""))
        };

        ModelResponse {
            text,
            usage: raw.usage_metadata,
            grounding_references,
        }
    }
}

#[async_trait]
impl ModelGateway for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<ModelResponse> {
        let request = self.build_request(prompt, options);

        let response = self
            .http
            .post(self.endpoint(model))
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context(format!("调用模型服务失败: {}", model))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("模型服务返回异常状态 {}: {}", status, body));
        }

        let raw: GenerateContentResponse = response
            .json()
            .await
            .context("解析模型服务响应失败")?;

        Ok(self.extract_response(raw))
    }
}
