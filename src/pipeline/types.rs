//! 流水线各阶段之间传递的类型化产物
//!
//! 所有实体都是阶段作用域的值对象：在阶段开始时创建，之后不可变地向后传递。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 路由决策 - Router阶段的产物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoutingDecision {
    /// 目标公司
    pub target_company: String,
    /// 分析类型（定价、产品、综合等）
    pub analysis_type: String,
    /// 建议的检索query列表
    #[serde(default)]
    pub search_queries: Vec<String>,
}

/// 情报来源记录 - Hunter阶段的产物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub url: String,
    pub title: String,
    /// 展示用摘要（约200字符内）
    pub snippet: String,
    /// 来源内容，离开Hunter前截断到固定上限
    pub content: String,
}

/// 整理后的情报文本 - Scraper阶段的产物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub text: String,
}

/// SWOT五维评分，键固定、永远完整填充
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SwotScores {
    pub innovation: u8,
    pub market_share: u8,
    pub pricing_power: u8,
    pub brand_reputation: u8,
    pub velocity: u8,
}

impl SwotScores {
    /// 评分中位缺省值，解析结果缺失某项评分时回填
    pub const NEUTRAL: u8 = 50;

    /// 全零评分，解析完全失败时的降级形态
    pub fn zeroed() -> Self {
        Self {
            innovation: 0,
            market_share: 0,
            pricing_power: 0,
            brand_reputation: 0,
            velocity: 0,
        }
    }

    /// 五项评分的平均值
    pub fn average(&self) -> f64 {
        (self.innovation as u64
            + self.market_share as u64
            + self.pricing_power as u64
            + self.brand_reputation as u64
            + self.velocity as u64) as f64
            / 5.0
    }
}

/// SWOT分析结果 - Analyst阶段的产物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SwotAnalysis {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
    pub scores: SwotScores,
}

impl SwotAnalysis {
    /// 降级形态：四个列表为空，五项评分全0
    pub fn degraded() -> Self {
        Self {
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            opportunities: Vec::new(),
            threats: Vec::new(),
            scores: SwotScores::zeroed(),
        }
    }
}

/// 最终报告（markdown） - Reporter阶段的产物
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub text: String,
}
