/// 按字符数安全截断文本
///
/// 直接按字节截断会切坏多字节字符（中文、emoji），这里统一按char计数。
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

/// 截断并在被截断时附加省略标记，用于展示性摘要
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact_boundary() {
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_multibyte_text() {
        // 中文字符按char计数，不会在字节边界切坏
        assert_eq!(truncate_chars("竞争情报分析报告", 4), "竞争情报");
    }

    #[test]
    fn test_truncate_for_display_appends_ellipsis() {
        assert_eq!(truncate_for_display("hello world", 5), "hello...");
        assert_eq!(truncate_for_display("hi", 5), "hi");
    }
}
