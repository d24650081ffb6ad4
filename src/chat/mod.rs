//! 报告追问会话 - 基于最终报告构建的常驻对话上下文

use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::config::LLMConfig;
use crate::llm::client::utils::{ReasoningTier, evaluate_befitting_model};
use crate::llm::client::{GenerateOptions, ModelGateway, ToolGrant};

/// 会话工厂
///
/// 以最终报告为种子上下文创建对话句柄。会话的轮次管理只保留最小实现，
/// 历史裁剪与会话取消不在核心范围内。
pub struct ChatSessionFactory {
    gateway: Arc<dyn ModelGateway>,
    llm_config: LLMConfig,
}

impl ChatSessionFactory {
    pub fn new(gateway: Arc<dyn ModelGateway>, llm_config: LLMConfig) -> Self {
        Self {
            gateway,
            llm_config,
        }
    }

    /// 创建以报告为上下文的追问会话
    pub fn create_session(&self, report_context: &str) -> ChatSession {
        let system_instruction = format!(
            r#"你是竞争情报报告的答疑助手。以下是本次生成的分析报告，回答与报告相关的问题时优先引用其中内容：

{}

用户也可能提出与报告无关的问题。此时不要拒绝，直接利用你的通用知识与搜索能力作答。"#,
            report_context
        );

        ChatSession {
            gateway: Arc::clone(&self.gateway),
            model: evaluate_befitting_model(&self.llm_config, ReasoningTier::Routine),
            options: GenerateOptions::default()
                .with_system_instruction(system_instruction)
                .with_tool(ToolGrant::GoogleSearch),
            transcript: Vec::new(),
        }
    }
}

/// 对话中的一轮发言
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Speaker {
    User,
    Assistant,
}

/// 会话句柄
pub struct ChatSession {
    gateway: Arc<dyn ModelGateway>,
    model: String,
    options: GenerateOptions,
    transcript: Vec<ChatTurn>,
}

impl ChatSession {
    /// 发送一轮用户消息，返回助手回答
    pub async fn send(&mut self, message: &str) -> Result<String> {
        let mut prompt = String::new();
        for turn in &self.transcript {
            let label = match turn.speaker {
                Speaker::User => "用户",
                Speaker::Assistant => "助手",
            };
            prompt.push_str(&format!("{}: {}\n", label, turn.text));
        }
        prompt.push_str(&format!("用户: {}", message));

        let response = self
            .gateway
            .generate(&self.model, &prompt, &self.options)
            .await?;

        let answer = response
            .text_content()
            .ok_or_else(|| anyhow!("模型未返回任何回答"))?
            .to_string();

        self.transcript.push(ChatTurn {
            speaker: Speaker::User,
            text: message.to_string(),
        });
        self.transcript.push(ChatTurn {
            speaker: Speaker::Assistant,
            text: answer.clone(),
        });

        Ok(answer)
    }

    /// 已发生的轮次
    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }
}
