//! Reporter阶段 - 汇总分析结果生成最终markdown报告

use async_trait::async_trait;

use crate::llm::client::GenerateOptions;
use crate::llm::client::utils::{ReasoningTier, evaluate_befitting_model};
use crate::pipeline::audit::{AgentKind, StageMeter};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StageError;
use crate::pipeline::stages::{PipelineStage, StageRun};
use crate::pipeline::types::{ExtractedContent, Report, SwotAnalysis};

const REPORTER_SYSTEM_PROMPT: &str = r#"你是资深的竞争情报报告撰写人。
以专业、克制的商业分析文风撰写markdown报告，结构包括：
执行摘要、市场表现、SWOT分析详述、五维评分解读、结论与建议。
报告中引用情报材料里的具体数字、日期与价格，不要编造数据。"#;

/// 终端失败占位报告：流水线驱动方永远能拿到可渲染的报告正文
pub const REPORT_FAILURE_PLACEHOLDER: &str = r#"# 报告生成失败

很抱歉，模型服务暂时不可用，本次未能生成完整的竞争情报报告。

请稍后重试本次查询。"#;

/// Reporter的类型化输入
#[derive(Debug, Clone)]
pub struct ReporterInput {
    pub company: String,
    pub analysis: SwotAnalysis,
    pub content: ExtractedContent,
}

/// 报告撰写人
///
/// 终端失败策略与之前所有阶段都不同：作为最后一个阶段，任何网关失败或
/// 空响应都不向上抛错，而是返回携带固定占位正文的成功形态结果，
/// 并产出一条计量全零的ERROR审计条目。
#[derive(Default, Clone)]
pub struct ReporterStage;

#[async_trait]
impl PipelineStage for ReporterStage {
    type Input = ReporterInput;
    type Output = Report;

    fn agent(&self) -> AgentKind {
        AgentKind::Reporter
    }

    async fn run(
        &self,
        input: ReporterInput,
        context: &PipelineContext,
    ) -> Result<StageRun<Report>, StageError> {
        let meter = StageMeter::start(self.agent());
        let model = evaluate_befitting_model(&context.config.llm, ReasoningTier::Complex);

        let options = GenerateOptions::default().with_system_instruction(REPORTER_SYSTEM_PROMPT);

        let swot_json = serde_json::to_string_pretty(&input.analysis).unwrap_or_default();
        let prompt = format!(
            "请为「{}」撰写竞争情报分析报告。\n\n## SWOT分析结果\n{}\n\n## 情报材料\n{}",
            input.company, swot_json, input.content.text
        );

        let outcome = context.gateway.generate(&model, &prompt, &options).await;

        let (report, log) = match outcome {
            Ok(response) => match response.text_content() {
                Some(text) => {
                    let log = meter.success(
                        format!("报告生成完成（{} 字符）", text.chars().count()),
                        &model,
                        response.usage.as_ref(),
                    );
                    (
                        Report {
                            text: text.to_string(),
                        },
                        log,
                    )
                }
                None => {
                    let log = meter.failure("模型返回空报告，已使用占位报告");
                    (
                        Report {
                            text: REPORT_FAILURE_PLACEHOLDER.to_string(),
                        },
                        log,
                    )
                }
            },
            Err(error) => {
                let log = meter.failure(format!("模型调用失败: {}，已使用占位报告", error));
                (
                    Report {
                        text: REPORT_FAILURE_PLACEHOLDER.to_string(),
                    },
                    log,
                )
            }
        };

        Ok(StageRun {
            payload: report,
            log,
        })
    }
}
