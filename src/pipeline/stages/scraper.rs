//! Scraper阶段 - 把零散来源整理为单份事实摘要

use async_trait::async_trait;

use crate::llm::client::GenerateOptions;
use crate::llm::client::utils::{ReasoningTier, evaluate_befitting_model};
use crate::pipeline::audit::{AgentKind, StageMeter};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StageError;
use crate::pipeline::stages::{PipelineStage, StageRun, gateway_failure};
use crate::pipeline::types::{ExtractedContent, SourceRecord};
use crate::utils::text_truncator::truncate_chars;

const SCRAPER_SYSTEM_PROMPT: &str = r#"你是竞争情报流水线的内容整理员。
对提供的来源材料进行去重、剔除营销话术，只保留事实性内容，
特别是数字、日期、价格等硬信息。输出控制在约1200字以内。"#;

/// 来源序列为空时替换进prompt的固定指令（no specific URLs）
pub const NO_SOURCES_FALLBACK: &str =
    "未提供具体的来源URL。请依靠你对该领域的通用知识，整理目标公司的已知事实。";

/// 模型返回空文本时替换的占位摘要
pub const EMPTY_DIGEST_PLACEHOLDER: &str = "（未能从来源材料中提取到有效内容）";

/// 单条来源进入prompt的摘要截断上限（字符）
const PER_SOURCE_SUMMARY_CAP: usize = 1500;

/// 内容整理员
#[derive(Default, Clone)]
pub struct ScraperStage;

impl ScraperStage {
    /// 把来源记录拼接为 来源/标题/摘要 文本块；空序列替换为固定指令
    fn build_source_blob(sources: &[SourceRecord]) -> String {
        if sources.is_empty() {
            return NO_SOURCES_FALLBACK.to_string();
        }

        let mut blob = String::new();
        for record in sources {
            blob.push_str(&format!(
                "来源: {}\n标题: {}\n摘要: {}\n\n",
                record.url,
                record.title,
                truncate_chars(&record.content, PER_SOURCE_SUMMARY_CAP)
            ));
        }
        blob
    }
}

#[async_trait]
impl PipelineStage for ScraperStage {
    type Input = Vec<SourceRecord>;
    type Output = ExtractedContent;

    fn agent(&self) -> AgentKind {
        AgentKind::Scraper
    }

    async fn run(
        &self,
        sources: Vec<SourceRecord>,
        context: &PipelineContext,
    ) -> Result<StageRun<ExtractedContent>, StageError> {
        let meter = StageMeter::start(self.agent());
        let model = evaluate_befitting_model(&context.config.llm, ReasoningTier::Routine);

        let options = GenerateOptions::default().with_system_instruction(SCRAPER_SYSTEM_PROMPT);

        let prompt = format!(
            "请整理以下来源材料：\n\n{}",
            Self::build_source_blob(&sources)
        );

        let response = context
            .gateway
            .generate(&model, &prompt, &options)
            .await
            .map_err(|error| gateway_failure(&meter, error))?;

        // 空响应不向下游传播空摘要，替换为固定占位串
        let text = response
            .text_content()
            .map(str::to_string)
            .unwrap_or_else(|| EMPTY_DIGEST_PLACEHOLDER.to_string());

        let log = meter.success(
            format!("整理完成，处理了 {} 个来源", sources.len()),
            &model,
            response.usage.as_ref(),
        );

        Ok(StageRun {
            payload: ExtractedContent { text },
            log,
        })
    }
}
