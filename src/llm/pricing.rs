//! 模型定价表与成本估算

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::llm::client::types::UsageMetadata;

/// 单个模型的定价规则（美元 / 1000 tokens）
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    /// 输入token单价
    pub input_per_1k: f64,
    /// 输出token单价
    pub output_per_1k: f64,
}

/// 未知模型兜底使用的定价档位
///
/// 选用flash档：它是流水线默认使用的最便宜档位，未知模型按它计价不会高估成本。
pub const DEFAULT_PRICING_MODEL: &str = "gemini-2.5-flash";

/// 进程级只读定价表，在任何阶段执行前完成初始化
static MODEL_PRICING: LazyLock<HashMap<&'static str, ModelPricing>> = LazyLock::new(|| {
    HashMap::from([
        (
            "gemini-2.5-flash",
            ModelPricing {
                input_per_1k: 0.0003,
                output_per_1k: 0.0025,
            },
        ),
        (
            "gemini-2.5-flash-lite",
            ModelPricing {
                input_per_1k: 0.0001,
                output_per_1k: 0.0004,
            },
        ),
        (
            "gemini-2.5-pro",
            ModelPricing {
                input_per_1k: 0.00125,
                output_per_1k: 0.01,
            },
        ),
        (
            "gemini-2.0-flash",
            ModelPricing {
                input_per_1k: 0.0001,
                output_per_1k: 0.0004,
            },
        ),
    ])
});

/// 解析模型对应的定价，未知模型回落到默认档位
pub fn resolve_pricing(model_id: &str) -> ModelPricing {
    MODEL_PRICING
        .get(model_id)
        .or_else(|| MODEL_PRICING.get(DEFAULT_PRICING_MODEL))
        .copied()
        .unwrap_or(ModelPricing {
            input_per_1k: 0.0,
            output_per_1k: 0.0,
        })
}

/// 估算一次模型调用的成本（美元）
///
/// 纯函数，永不失败：usage缺失或计数缺失时按0处理。
pub fn estimate_cost(model_id: &str, usage: Option<&UsageMetadata>) -> f64 {
    let Some(usage) = usage else {
        return 0.0;
    };

    let pricing = resolve_pricing(model_id);
    let prompt_tokens = usage.prompt_token_count.unwrap_or(0) as f64;
    let candidates_tokens = usage.candidates_token_count.unwrap_or(0) as f64;

    prompt_tokens / 1000.0 * pricing.input_per_1k
        + candidates_tokens / 1000.0 * pricing.output_per_1k
}
