//! Router阶段 - 把自由文本查询解析为路由决策

use async_trait::async_trait;

use crate::llm::client::GenerateOptions;
use crate::llm::client::utils::{ReasoningTier, evaluate_befitting_model, response_schema_for};
use crate::pipeline::audit::{AgentKind, StageMeter};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StageError;
use crate::pipeline::stages::{PipelineStage, StageRun, gateway_failure, parse_failure};
use crate::pipeline::types::RoutingDecision;
use crate::utils::json_extractor::extract_json_payload;

const ROUTER_SYSTEM_PROMPT: &str = r#"你是竞争情报流水线的任务路由器。
根据用户的自由文本查询，识别出：
1. target_company - 要分析的目标公司名称
2. analysis_type - 分析类型（如 pricing、product、marketing、综合）
3. search_queries - 2~4条用于后续检索的query

严格按照给定的JSON schema返回结果，不要附加任何解释文字。"#;

/// 路由器
///
/// 结构化输出解析失败在本阶段是致命的：不做本地修复，直接作为阶段失败上抛。
/// 这与Analyst的可恢复策略刻意不对称。
#[derive(Default, Clone)]
pub struct RouterStage;

#[async_trait]
impl PipelineStage for RouterStage {
    type Input = String;
    type Output = RoutingDecision;

    fn agent(&self) -> AgentKind {
        AgentKind::Router
    }

    async fn run(
        &self,
        query: String,
        context: &PipelineContext,
    ) -> Result<StageRun<RoutingDecision>, StageError> {
        let meter = StageMeter::start(self.agent());
        let model = evaluate_befitting_model(&context.config.llm, ReasoningTier::Routine);

        let options = GenerateOptions::default()
            .with_system_instruction(ROUTER_SYSTEM_PROMPT)
            .with_response_schema(response_schema_for::<RoutingDecision>());

        let prompt = format!("用户查询：{}", query);

        let response = context
            .gateway
            .generate(&model, &prompt, &options)
            .await
            .map_err(|error| gateway_failure(&meter, error))?;

        let raw = response
            .text_content()
            .ok_or_else(|| parse_failure(&meter, "模型未返回任何文本"))?;

        let payload = extract_json_payload(raw)
            .ok_or_else(|| parse_failure(&meter, "输出中未找到JSON内容"))?;

        let decision: RoutingDecision = serde_json::from_str(payload)
            .map_err(|error| parse_failure(&meter, error.to_string()))?;

        let log = meter.success(
            format!(
                "识别到目标公司「{}」，分析类型: {}",
                decision.target_company, decision.analysis_type
            ),
            &model,
            response.usage.as_ref(),
        );

        Ok(StageRun {
            payload: decision,
            log,
        })
    }
}
