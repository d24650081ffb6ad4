#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;

    use crate::config::Config;
    use crate::llm::client::types::{GroundingReference, ModelResponse, UsageMetadata};
    use crate::llm::client::{GenerateOptions, ModelGateway, ToolGrant};
    use crate::pipeline::audit::{AgentKind, StageStatus};
    use crate::pipeline::context::PipelineContext;
    use crate::pipeline::stages::scraper::{EMPTY_DIGEST_PLACEHOLDER, NO_SOURCES_FALLBACK};
    use crate::pipeline::stages::analyst::NO_DATA_SENTINEL;
    use crate::pipeline::stages::hunter::CONTENT_CAP;
    use crate::pipeline::stages::reporter::REPORT_FAILURE_PLACEHOLDER;
    use crate::pipeline::stages::{
        AnalystStage, HunterStage, PipelineStage, ReporterInput, ReporterStage, RouterStage,
        ScraperStage,
    };
    use crate::pipeline::types::{
        ExtractedContent, RoutingDecision, SourceRecord, SwotAnalysis, SwotScores,
    };

    /// 脚本化步骤：按顺序回放的响应或失败
    pub enum ScriptStep {
        Respond(ModelResponse),
        Fail(String),
    }

    /// 一次网关调用的捕获记录，用于断言prompt构造
    pub struct CapturedCall {
        pub model: String,
        pub prompt: String,
        pub has_schema: bool,
        pub search_granted: bool,
    }

    /// 确定性桩网关：回放预置脚本并捕获请求
    pub struct ScriptedGateway {
        steps: Mutex<VecDeque<ScriptStep>>,
        calls: Mutex<Vec<CapturedCall>>,
    }

    impl ScriptedGateway {
        pub fn new(steps: Vec<ScriptStep>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn captured_prompts(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|call| call.prompt.clone())
                .collect()
        }

        pub fn captured_calls(&self) -> Vec<CapturedCall> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn generate(
            &self,
            model: &str,
            prompt: &str,
            options: &GenerateOptions,
        ) -> Result<ModelResponse> {
            self.calls.lock().unwrap().push(CapturedCall {
                model: model.to_string(),
                prompt: prompt.to_string(),
                has_schema: options.response_schema.is_some(),
                search_granted: options.tools.contains(&ToolGrant::GoogleSearch),
            });

            match self.steps.lock().unwrap().pop_front() {
                Some(ScriptStep::Respond(response)) => Ok(response),
                Some(ScriptStep::Fail(message)) => Err(anyhow!(message)),
                None => Err(anyhow!("测试脚本已耗尽")),
            }
        }
    }

    fn text_response(text: &str) -> ModelResponse {
        ModelResponse {
            text: Some(text.to_string()),
            usage: Some(UsageMetadata::new(100, 50)),
            grounding_references: Vec::new(),
        }
    }

    fn grounded_response(text: &str, references: Vec<(&str, &str)>) -> ModelResponse {
        ModelResponse {
            text: Some(text.to_string()),
            usage: Some(UsageMetadata::new(200, 80)),
            grounding_references: references
                .into_iter()
                .map(|(uri, title)| GroundingReference {
                    uri: uri.to_string(),
                    title: title.to_string(),
                })
                .collect(),
        }
    }

    fn scripted_context(steps: Vec<ScriptStep>) -> (PipelineContext, Arc<ScriptedGateway>) {
        let gateway = Arc::new(ScriptedGateway::new(steps));
        let context = PipelineContext::with_gateway(Config::default(), gateway.clone());
        (context, gateway)
    }

    fn sample_decision() -> RoutingDecision {
        RoutingDecision {
            target_company: "Acme Corp".to_string(),
            analysis_type: "pricing".to_string(),
            search_queries: vec!["pricing".to_string()],
        }
    }

    // ---- Router ----

    #[tokio::test]
    async fn test_router_parses_decision() {
        let (context, gateway) = scripted_context(vec![ScriptStep::Respond(text_response(
            r#"{"target_company": "Acme Corp", "analysis_type": "pricing", "search_queries": ["pricing"]}"#,
        ))]);

        let run = RouterStage
            .run("Analyze Acme Corp pricing".to_string(), &context)
            .await
            .unwrap();

        assert_eq!(run.payload, sample_decision());
        assert_eq!(run.log.agent, AgentKind::Router);
        assert_eq!(run.log.status, StageStatus::Success);
        assert!(run.log.message.contains("Acme Corp"));
        assert!(run.log.token_usage > 0);

        // Router必须请求结构化schema，且使用高能效模型
        let calls = gateway.captured_calls();
        assert!(calls[0].has_schema);
        assert!(!calls[0].search_granted);
        assert_eq!(calls[0].model, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_router_parse_failure_is_fatal() {
        let (context, _gateway) =
            scripted_context(vec![ScriptStep::Respond(text_response("这不是JSON输出"))]);

        let error = RouterStage
            .run("query".to_string(), &context)
            .await
            .unwrap_err();

        assert_eq!(error.agent, AgentKind::Router);
        assert_eq!(error.log.status, StageStatus::Error);
    }

    #[tokio::test]
    async fn test_router_gateway_failure_propagates() {
        let (context, _gateway) =
            scripted_context(vec![ScriptStep::Fail("连接超时".to_string())]);

        let error = RouterStage
            .run("query".to_string(), &context)
            .await
            .unwrap_err();

        assert!(error.source.is_some());
        assert!(error.message.contains("连接超时"));
    }

    // ---- Hunter ----

    #[tokio::test]
    async fn test_hunter_synthesizes_records_from_references() {
        let (context, gateway) = scripted_context(vec![ScriptStep::Respond(grounded_response(
            "Acme Corp近期上调了订阅价格。",
            vec![
                ("https://news.example.com/1", "Acme提价"),
                ("https://news.example.com/2", "Acme财报"),
            ],
        ))]);

        let run = HunterStage.run(sample_decision(), &context).await.unwrap();

        assert_eq!(run.payload.len(), 2);
        assert_eq!(run.payload[0].url, "https://news.example.com/1");
        assert_eq!(run.payload[1].title, "Acme财报");
        // 模型的整段回答被复用为每条引用的content
        assert_eq!(run.payload[0].content, run.payload[1].content);
        assert!(run.log.message.contains('2'));

        let calls = gateway.captured_calls();
        assert!(calls[0].search_granted);
    }

    #[tokio::test]
    async fn test_hunter_fallback_single_record() {
        let answer = "Acme Corp的旗舰产品定价为每月99美元。";
        let (context, _gateway) =
            scripted_context(vec![ScriptStep::Respond(text_response(answer))]);

        let run = HunterStage.run(sample_decision(), &context).await.unwrap();

        assert_eq!(run.payload.len(), 1);
        let record = &run.payload[0];
        assert_eq!(record.content, answer);
        assert!(record.url.contains("Acme+Corp"));
        assert!(run.log.message.contains('1'));
    }

    #[tokio::test]
    async fn test_hunter_no_text_no_records() {
        let (context, _gateway) = scripted_context(vec![ScriptStep::Respond(ModelResponse {
            text: None,
            usage: Some(UsageMetadata::new(10, 0)),
            grounding_references: Vec::new(),
        })]);

        let run = HunterStage.run(sample_decision(), &context).await.unwrap();

        // 退化结果不是错误：返回空来源序列，由下游替换哨兵
        assert!(run.payload.is_empty());
        assert_eq!(run.log.status, StageStatus::Success);
        assert!(run.log.message.contains('0'));
    }

    #[tokio::test]
    async fn test_hunter_caps_record_content() {
        let long_answer = "数".repeat(CONTENT_CAP + 500);
        let (context, _gateway) = scripted_context(vec![ScriptStep::Respond(grounded_response(
            &long_answer,
            vec![("https://news.example.com/1", "长文")],
        ))]);

        let run = HunterStage.run(sample_decision(), &context).await.unwrap();

        assert_eq!(run.payload[0].content.chars().count(), CONTENT_CAP);
    }

    // ---- Scraper ----

    #[tokio::test]
    async fn test_scraper_empty_sources_substitutes_instruction() {
        let (context, gateway) = scripted_context(vec![ScriptStep::Respond(text_response(
            "基于通用知识的整理结果。",
        ))]);

        let run = ScraperStage.run(Vec::new(), &context).await.unwrap();

        assert_eq!(run.payload.text, "基于通用知识的整理结果。");
        assert!(run.log.message.contains('0'));

        // 空来源时prompt必须包含固定替换指令，而不是空文本块
        let prompts = gateway.captured_prompts();
        assert!(prompts[0].contains(NO_SOURCES_FALLBACK));
    }

    #[tokio::test]
    async fn test_scraper_empty_response_uses_placeholder() {
        let (context, _gateway) = scripted_context(vec![ScriptStep::Respond(ModelResponse {
            text: Some("   ".to_string()),
            usage: None,
            grounding_references: Vec::new(),
        })]);

        let sources = vec![SourceRecord {
            url: "https://example.com".to_string(),
            title: "标题".to_string(),
            snippet: "摘要".to_string(),
            content: "内容".to_string(),
        }];
        let run = ScraperStage.run(sources, &context).await.unwrap();

        assert_eq!(run.payload.text, EMPTY_DIGEST_PLACEHOLDER);
        assert_eq!(run.log.status, StageStatus::Success);
        assert!(run.log.message.contains('1'));
    }

    // ---- Analyst ----

    #[tokio::test]
    async fn test_analyst_substitutes_sentinel_for_degenerate_input() {
        let (context, gateway) = scripted_context(vec![ScriptStep::Respond(text_response(
            r#"{"strengths": [], "weaknesses": [], "opportunities": [], "threats": [], "scores": {"innovation": 50, "market_share": 50, "pricing_power": 50, "brand_reputation": 50, "velocity": 50}}"#,
        ))]);

        let run = AnalystStage
            .run(
                ExtractedContent {
                    text: "太短".to_string(),
                },
                &context,
            )
            .await
            .unwrap();

        assert_eq!(run.payload.scores.average(), 50.0);
        let prompts = gateway.captured_prompts();
        assert!(prompts[0].contains(NO_DATA_SENTINEL));
        assert!(!prompts[0].contains("太短"));
    }

    #[tokio::test]
    async fn test_analyst_degrades_on_parse_failure() {
        let (context, _gateway) =
            scripted_context(vec![ScriptStep::Respond(text_response("模型输出了散文而非JSON"))]);

        let long_input = "有效的情报材料。".repeat(20);
        let run = AnalystStage
            .run(ExtractedContent { text: long_input }, &context)
            .await
            .unwrap();

        // 降级而非失败
        assert_eq!(run.payload, SwotAnalysis::degraded());
        assert_eq!(run.log.status, StageStatus::Success);
        assert!(run.log.message.contains("降级"));
        assert!(run.log.message.contains("0.0"));
    }

    #[tokio::test]
    async fn test_analyst_backfills_partial_scores() {
        let (context, _gateway) = scripted_context(vec![ScriptStep::Respond(text_response(
            r#"{"strengths": ["强项"], "scores": {"innovation": 90, "velocity": 130}}"#,
        ))]);

        let long_input = "有效的情报材料。".repeat(20);
        let run = AnalystStage
            .run(ExtractedContent { text: long_input }, &context)
            .await
            .unwrap();

        let scores = &run.payload.scores;
        assert_eq!(scores.innovation, 90);
        assert_eq!(scores.velocity, 100);
        assert_eq!(scores.market_share, SwotScores::NEUTRAL);
        assert_eq!(scores.pricing_power, SwotScores::NEUTRAL);
        assert_eq!(scores.brand_reputation, SwotScores::NEUTRAL);
    }

    #[tokio::test]
    async fn test_analyst_gateway_failure_propagates() {
        let (context, _gateway) =
            scripted_context(vec![ScriptStep::Fail("服务过载".to_string())]);

        let long_input = "有效的情报材料。".repeat(20);
        let error = AnalystStage
            .run(ExtractedContent { text: long_input }, &context)
            .await
            .unwrap_err();

        assert_eq!(error.agent, AgentKind::Analyst);
    }

    // ---- Reporter ----

    fn reporter_input() -> ReporterInput {
        ReporterInput {
            company: "Acme Corp".to_string(),
            analysis: SwotAnalysis::degraded(),
            content: ExtractedContent {
                text: "情报材料".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_reporter_failure_returns_placeholder() {
        let (context, _gateway) =
            scripted_context(vec![ScriptStep::Fail("网络中断".to_string())]);

        let run = ReporterStage.run(reporter_input(), &context).await.unwrap();

        // 终端阶段：失败也必须返回可渲染的报告
        assert_eq!(run.payload.text, REPORT_FAILURE_PLACEHOLDER);
        assert_eq!(run.log.status, StageStatus::Error);
        assert_eq!(run.log.latency_ms, 0);
        assert_eq!(run.log.token_usage, 0);
        assert_eq!(run.log.cost, 0.0);
    }

    #[tokio::test]
    async fn test_reporter_empty_response_returns_placeholder() {
        let (context, _gateway) = scripted_context(vec![ScriptStep::Respond(ModelResponse {
            text: None,
            usage: None,
            grounding_references: Vec::new(),
        })]);

        let run = ReporterStage.run(reporter_input(), &context).await.unwrap();

        assert_eq!(run.payload.text, REPORT_FAILURE_PLACEHOLDER);
        assert_eq!(run.log.status, StageStatus::Error);
    }

    #[tokio::test]
    async fn test_reporter_success_keeps_markdown() {
        let (context, _gateway) = scripted_context(vec![ScriptStep::Respond(text_response(
            "# Acme Corp 竞争情报报告\n\n执行摘要……",
        ))]);

        let run = ReporterStage.run(reporter_input(), &context).await.unwrap();

        assert!(run.payload.text.starts_with("# Acme Corp"));
        assert_eq!(run.log.status, StageStatus::Success);
    }

    // ---- Driver ----

    #[tokio::test]
    async fn test_launch_aborts_on_router_failure() {
        let (context, gateway) =
            scripted_context(vec![ScriptStep::Fail("凭证无效".to_string())]);

        let result = crate::pipeline::launch("Analyze Acme Corp pricing", &context).await;

        assert!(result.is_err());
        // 失败发生在第一阶段，后续阶段不再调用
        assert_eq!(gateway.captured_calls().len(), 1);
    }
}
