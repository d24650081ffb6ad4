//! Analyst阶段 - 基于整理后的情报生成SWOT分析

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::llm::client::GenerateOptions;
use crate::llm::client::utils::{ReasoningTier, evaluate_befitting_model, response_schema_for};
use crate::pipeline::audit::{AgentKind, StageMeter};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::StageError;
use crate::pipeline::stages::{PipelineStage, StageRun, gateway_failure};
use crate::pipeline::types::{ExtractedContent, SwotAnalysis, SwotScores};
use crate::utils::json_extractor::extract_json_payload;

const ANALYST_SYSTEM_PROMPT: &str = r#"你是资深的竞争战略分析师。
基于提供的情报材料，输出目标公司的SWOT分析：
- strengths / weaknesses / opportunities / threats 各列出3~5条要点
- scores 给出五个维度的0~100整数评分：innovation、market_share、pricing_power、brand_reputation、velocity

严格按照给定的JSON schema返回结果。"#;

/// 输入文本低于该长度视为退化输入，替换为无数据哨兵串后再提示模型
const MIN_INPUT_CHARS: usize = 50;

/// 无数据哨兵串，保证模型不会被要求分析一个退化的字符串
pub const NO_DATA_SENTINEL: &str =
    "没有可用的调研数据。请基于对该公司及其所在行业的通用了解，给出保守的分析。";

/// 解析阶段的宽容形态：列表缺省为空，评分允许缺失/不完整
#[derive(Debug, Default, Serialize, Deserialize)]
struct SwotAnalysisDraft {
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    opportunities: Vec<String>,
    #[serde(default)]
    threats: Vec<String>,
    #[serde(default)]
    scores: Option<SwotScoresDraft>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SwotScoresDraft {
    innovation: Option<i64>,
    market_share: Option<i64>,
    pricing_power: Option<i64>,
    brand_reputation: Option<i64>,
    velocity: Option<i64>,
}

impl SwotAnalysisDraft {
    /// 收敛为最终形态，强制"评分永远完整填充"不变量：
    /// 缺失项回填中位值，越界项收敛到[0,100]
    fn finalize(self) -> SwotAnalysis {
        let draft_scores = self.scores.unwrap_or_default();
        SwotAnalysis {
            strengths: self.strengths,
            weaknesses: self.weaknesses,
            opportunities: self.opportunities,
            threats: self.threats,
            scores: SwotScores {
                innovation: settle_score(draft_scores.innovation),
                market_share: settle_score(draft_scores.market_share),
                pricing_power: settle_score(draft_scores.pricing_power),
                brand_reputation: settle_score(draft_scores.brand_reputation),
                velocity: settle_score(draft_scores.velocity),
            },
        }
    }
}

fn settle_score(value: Option<i64>) -> u8 {
    match value {
        Some(score) => score.clamp(0, 100) as u8,
        None => SwotScores::NEUTRAL,
    }
}

/// 战略分析师
///
/// 与Router不同，本阶段对格式错误的输出宽容降级：
/// 解析彻底失败时产出空SWOT（评分全0）并记录警告，不作为阶段失败。
#[derive(Default, Clone)]
pub struct AnalystStage;

impl AnalystStage {
    /// 容错解析模型输出，失败返回None由调用方降级
    fn parse_analysis(raw: &str) -> Option<SwotAnalysis> {
        let payload = extract_json_payload(raw)?;
        let draft: SwotAnalysisDraft = serde_json::from_str(payload).ok()?;
        Some(draft.finalize())
    }
}

#[async_trait]
impl PipelineStage for AnalystStage {
    type Input = ExtractedContent;
    type Output = SwotAnalysis;

    fn agent(&self) -> AgentKind {
        AgentKind::Analyst
    }

    async fn run(
        &self,
        content: ExtractedContent,
        context: &PipelineContext,
    ) -> Result<StageRun<SwotAnalysis>, StageError> {
        let meter = StageMeter::start(self.agent());
        let model = evaluate_befitting_model(&context.config.llm, ReasoningTier::Complex);

        // 退化输入保护：近空文本替换为无数据哨兵串
        let material = if content.text.trim().chars().count() < MIN_INPUT_CHARS {
            NO_DATA_SENTINEL
        } else {
            content.text.as_str()
        };

        let options = GenerateOptions::default()
            .with_system_instruction(ANALYST_SYSTEM_PROMPT)
            .with_response_schema(response_schema_for::<SwotAnalysis>());

        let prompt = format!("情报材料如下：\n\n{}", material);

        let response = context
            .gateway
            .generate(&model, &prompt, &options)
            .await
            .map_err(|error| gateway_failure(&meter, error))?;

        let (analysis, message) = match response.text_content().and_then(Self::parse_analysis) {
            Some(analysis) => {
                let message = format!("SWOT分析完成，综合评分 {:.1}", analysis.scores.average());
                (analysis, message)
            }
            None => {
                // 降级而非失败：空SWOT + 全0评分，记录警告
                eprintln!("   ⚠️ SWOT结构化输出解析失败，已降级为空分析");
                let analysis = SwotAnalysis::degraded();
                let message = format!(
                    "SWOT解析失败，已降级为空分析，综合评分 {:.1}",
                    analysis.scores.average()
                );
                (analysis, message)
            }
        };

        let log = meter.success(message, &model, response.usage.as_ref());

        Ok(StageRun {
            payload: analysis,
            log,
        })
    }
}
