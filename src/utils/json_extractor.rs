/// 从LLM返回的半结构化文本中提取JSON载荷
///
/// 模型即使被要求返回纯JSON，实际输出也经常带有markdown代码围栏或前后说明文字。
/// 该函数做容错提取：先剥离```json围栏，再截取最外层大括号之间的内容。
/// 提取不到疑似JSON内容时返回None，由调用方决定是失败还是降级。
pub fn extract_json_payload(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();

    // 剥离markdown代码围栏（```json ... ``` 或 ``` ... ```）
    let inner = if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.rsplit_once("```").map(|(body, _)| body).unwrap_or(rest)
    } else {
        trimmed
    };

    // 截取最外层大括号之间的内容，容忍前后附带的解释性文字
    let start = inner.find('{')?;
    let end = inner.rfind('}')?;
    if end < start {
        return None;
    }
    Some(inner[start..=end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_json() {
        let raw = r#"{"target_company": "Acme Corp"}"#;
        assert_eq!(extract_json_payload(raw), Some(raw));
    }

    #[test]
    fn test_extract_fenced_json() {
        let raw = "```json\n{\"analysis_type\": \"pricing\"}\n```";
        assert_eq!(
            extract_json_payload(raw),
            Some("{\"analysis_type\": \"pricing\"}")
        );
    }

    #[test]
    fn test_extract_json_with_surrounding_prose() {
        let raw = "好的，以下是分析结果：\n{\"scores\": {\"innovation\": 80}}\n希望对你有帮助。";
        assert_eq!(
            extract_json_payload(raw),
            Some("{\"scores\": {\"innovation\": 80}}")
        );
    }

    #[test]
    fn test_extract_rejects_non_json() {
        assert_eq!(extract_json_payload("这段文本没有任何JSON内容"), None);
        assert_eq!(extract_json_payload(""), None);
        assert_eq!(extract_json_payload("} 残缺内容 {"), None);
    }

    #[test]
    fn test_extract_unclosed_fence() {
        let raw = "```json\n{\"key\": 1}";
        assert_eq!(extract_json_payload(raw), Some("{\"key\": 1}"));
    }
}
