//! Hunter阶段 - 通过搜索溯源发现情报来源

use async_trait::async_trait;

use crate::llm::client::{GenerateOptions, ToolGrant};
use crate::llm::client::utils::{ReasoningTier, evaluate_befitting_model};
use crate::pipeline::audit::{AgentKind, StageMeter};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StageError;
use crate::pipeline::stages::{PipelineStage, StageRun, gateway_failure};
use crate::pipeline::types::{RoutingDecision, SourceRecord};
use crate::utils::text_truncator::{truncate_chars, truncate_for_display};

const HUNTER_SYSTEM_PROMPT: &str = r#"你是竞争情报流水线的信息猎手。
利用搜索工具，围绕目标公司收集最近的新闻、定价变动、产品功能动态。
回答中应尽量包含具体的数字、日期与价格等事实信息。"#;

/// 单条来源内容的截断上限（字符），防止上下文无界膨胀到下一阶段
pub const CONTENT_CAP: usize = 2000;

/// 展示摘要的截断上限（字符）
pub const SNIPPET_CAP: usize = 200;

/// 信息猎手
///
/// 网关不提供逐引用的正文，模型的整段回答会被复用为每条引用的content，
/// 这是已接受的近似实现。
#[derive(Default, Clone)]
pub struct HunterStage;

impl HunterStage {
    /// 兜底来源指向的通用检索URL
    fn fallback_search_url(company: &str) -> String {
        format!("https://www.google.com/search?q={}", company.replace(' ', "+"))
    }
}

#[async_trait]
impl PipelineStage for HunterStage {
    type Input = RoutingDecision;
    type Output = Vec<SourceRecord>;

    fn agent(&self) -> AgentKind {
        AgentKind::Hunter
    }

    async fn run(
        &self,
        decision: RoutingDecision,
        context: &PipelineContext,
    ) -> Result<StageRun<Vec<SourceRecord>>, StageError> {
        let meter = StageMeter::start(self.agent());
        let model = evaluate_befitting_model(&context.config.llm, ReasoningTier::Routine);

        let options = GenerateOptions::default()
            .with_system_instruction(HUNTER_SYSTEM_PROMPT)
            .with_tool(ToolGrant::GoogleSearch);

        let mut prompt = format!(
            "请搜集关于「{}」的最新竞争情报（关注方向: {}）。",
            decision.target_company, decision.analysis_type
        );
        if !decision.search_queries.is_empty() {
            prompt.push_str(&format!(
                "\n可参考的检索词：{}",
                decision.search_queries.join("、")
            ));
        }

        let response = context
            .gateway
            .generate(&model, &prompt, &options)
            .await
            .map_err(|error| gateway_failure(&meter, error))?;

        let answer = response.text_content().unwrap_or_default().to_string();

        // 每条同时具备uri与title的溯源引用合成一条来源记录
        let mut records: Vec<SourceRecord> = response
            .grounding_references
            .iter()
            .map(|reference| SourceRecord {
                url: reference.uri.clone(),
                title: reference.title.clone(),
                snippet: truncate_for_display(&answer, SNIPPET_CAP),
                content: answer.clone(),
            })
            .collect();

        // 兜底：没有任何引用但模型给出了非空回答时，合成一条指向通用检索URL的记录
        if records.is_empty() && !answer.is_empty() {
            records.push(SourceRecord {
                url: Self::fallback_search_url(&decision.target_company),
                title: format!("关于 {} 的综合检索结果", decision.target_company),
                snippet: truncate_for_display(&answer, SNIPPET_CAP),
                content: answer.clone(),
            });
        }

        // 后处理：截断content，防止上下文无界增长
        for record in &mut records {
            record.content = truncate_chars(&record.content, CONTENT_CAP);
        }

        let log = meter.success(
            format!("发现 {} 个情报来源", records.len()),
            &model,
            response.usage.as_ref(),
        );

        Ok(StageRun {
            payload: records,
            log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_search_url_contains_company() {
        let url = HunterStage::fallback_search_url("Acme Corp");
        assert_eq!(url, "https://www.google.com/search?q=Acme+Corp");
    }
}
