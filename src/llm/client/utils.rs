use schemars::JsonSchema;
use serde_json::Value;

use crate::config::LLMConfig;

/// 推理任务档位
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReasoningTier {
    /// 常规任务（路由、检索、内容整理）
    Routine,
    /// 复杂任务（SWOT分析、报告撰写）
    Complex,
}

/// 根据任务档位选择合适的模型
pub fn evaluate_befitting_model(llm_config: &LLMConfig, tier: ReasoningTier) -> String {
    match tier {
        ReasoningTier::Routine => llm_config.model_efficient.clone(),
        ReasoningTier::Complex => llm_config.model_powerful.clone(),
    }
}

/// 将schemars生成的JSON Schema转换为provider接受的responseSchema方言
///
/// 转换内容：去除`$schema`/`title`元信息，并把`$defs`引用内联展开。
/// 协议层的schema只是"请求模型遵循"，不由传输层强制校验。
pub fn response_schema_for<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    let mut value =
        serde_json::to_value(schema).unwrap_or_else(|_| Value::Object(Default::default()));

    let defs = value
        .as_object_mut()
        .and_then(|obj| obj.remove("$defs"))
        .and_then(|defs| match defs {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();

    inline_schema_refs(&mut value, &defs);
    value
}

/// 递归内联`#/$defs/...`引用并剥离schema元信息
fn inline_schema_refs(value: &mut Value, defs: &serde_json::Map<String, Value>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref")
                && let Some(name) = reference.strip_prefix("#/$defs/")
                && let Some(definition) = defs.get(name)
            {
                let mut replacement = definition.clone();
                inline_schema_refs(&mut replacement, defs);
                *value = replacement;
                return;
            }

            map.remove("$schema");
            map.remove("title");
            for nested in map.values_mut() {
                inline_schema_refs(nested, defs);
            }
        }
        Value::Array(items) => {
            for item in items {
                inline_schema_refs(item, defs);
            }
        }
        _ => {}
    }
}
