//! Multi-image intent detection (spec §4.3, §9).
//!
//! An explicit `count` field on the request always wins. The `\d+张`
//! prompt heuristic is a fallback only, kept for clients that haven't
//! migrated to the explicit field yet (spec §9 marks it deprecated).

/// Resolves the target image count for a request, preferring the
/// explicit field and falling back to scanning the prompt for a
/// "<N>张" token.
pub fn resolve_count(explicit_count: Option<u32>, prompt: &str) -> Option<u32> {
    explicit_count.or_else(|| scan_zhang_token(prompt))
}

/// Scans for the first `<digits>张` occurrence and parses the digits.
fn scan_zhang_token(prompt: &str) -> Option<u32> {
    let bytes: Vec<char> = prompt.chars().collect();
    for (i, ch) in bytes.iter().enumerate() {
        if *ch == '张' {
            let mut start = i;
            while start > 0 && bytes[start - 1].is_ascii_digit() {
                start -= 1;
            }
            if start < i {
                let digits: String = bytes[start..i].iter().collect();
                if let Ok(n) = digits.parse::<u32>() {
                    return Some(n);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_count_wins_over_prompt_heuristic() {
        assert_eq!(resolve_count(Some(3), "生成4张猫的图片"), Some(3));
    }

    #[test]
    fn prompt_heuristic_used_when_no_explicit_count() {
        assert_eq!(resolve_count(None, "生成4张猫的图片"), Some(4));
    }

    #[test]
    fn no_token_and_no_explicit_count_is_none() {
        assert_eq!(resolve_count(None, "a sunset over mountains"), None);
    }

    #[test]
    fn multi_digit_counts_parse_fully() {
        assert_eq!(resolve_count(None, "来12张图"), Some(12));
    }
}
