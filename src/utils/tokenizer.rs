use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("word pattern is valid"));

/// Distinct lowercase word tokens of a document field.
pub fn tokenize_text(text: &str) -> BTreeSet<String> {
    WORD.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Query tokens in the order they were typed, duplicates removed.
pub fn tokenize_query(query: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    WORD.find_iter(&query.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Empty text and `*` both mean "match everything".
pub fn is_wildcard(query: &str) -> bool {
    let trimmed = query.trim();
    trimmed.is_empty() || trimmed == "*"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_text_lowercase_and_punctuation() {
        let tokens = tokenize_text("Solve: 2x + 3 = 7, then CHECK!");

        assert!(tokens.contains("solve"));
        assert!(tokens.contains("2x"));
        assert!(tokens.contains("3"));
        assert!(tokens.contains("check"));
        assert!(!tokens.contains("solve:"));
        assert!(!tokens.contains("CHECK"));
    }

    #[test]
    fn test_tokenize_text_unicode_words() {
        let tokens = tokenize_text("Üçgenin iç açıları");

        assert!(tokens.contains("üçgenin"));
        assert!(tokens.contains("iç"));
        assert!(tokens.contains("açıları"));
    }

    #[test]
    fn test_tokenize_query_keeps_order_without_duplicates() {
        let tokens = tokenize_query("Prime prime NUMBERS");
        assert_eq!(tokens, vec!["prime".to_string(), "numbers".to_string()]);
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(is_wildcard(""));
        assert!(is_wildcard("   "));
        assert!(is_wildcard("*"));
        assert!(!is_wildcard("algebra"));
    }
}
