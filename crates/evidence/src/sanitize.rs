//! Free-text sanitizing helpers shared by evidence building and model output
//! repair.

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}')
}

/// Normalize whitespace, drop control characters, and cap at `max_len` chars.
pub fn sanitize_free_text(value: &str, max_len: usize) -> String {
    normalize_whitespace(value)
        .chars()
        .filter(|c| !is_stripped_control(*c))
        .take(max_len)
        .collect()
}

/// Clamp `value` into `[min, max]`. NaN clamps to `min`.
pub fn clamp_number(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// `"data  ENGINEERING"` → `"Data Engineering"`.
pub fn to_title_case(value: &str) -> String {
    normalize_whitespace(value)
        .split(' ')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove a single surrounding markdown code fence, if present.
///
/// A fence with an info line (```` ```json ````) drops that first line.
pub fn strip_markdown_code_fence(value: &str) -> String {
    const FENCE: &str = "```";
    let trimmed = value.trim();
    if !trimmed.starts_with(FENCE) || !trimmed.ends_with(FENCE) {
        return trimmed.to_string();
    }

    match trimmed.find('\n') {
        None => trimmed.replace(FENCE, "").trim().to_string(),
        Some(newline) => {
            let start = newline + 1;
            let end = trimmed.len() - FENCE.len();
            if start >= end {
                String::new()
            } else {
                trimmed[start..end].trim().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize_whitespace("  a \n\t b   c "), "a b c");
    }

    #[test]
    fn control_characters_removed_and_truncated() {
        assert_eq!(sanitize_free_text("ab\u{0007}cd\u{007F}ef", 4), "abcd");
        assert_eq!(sanitize_free_text("héllo wörld", 7), "héllo w");
    }

    #[test]
    fn clamp_handles_nan() {
        assert_eq!(clamp_number(150.0, 0.0, 100.0), 100.0);
        assert_eq!(clamp_number(-3.0, 0.0, 100.0), 0.0);
        assert_eq!(clamp_number(f64::NAN, 0.35, 0.92), 0.35);
    }

    #[test]
    fn title_case() {
        assert_eq!(to_title_case("data  ENGINEERING"), "Data Engineering");
        assert_eq!(to_title_case("   "), "");
    }

    #[test]
    fn fence_with_language_tag() {
        let raw = "```json\n{\"summary\":\"ok\"}\n```";
        assert_eq!(strip_markdown_code_fence(raw), "{\"summary\":\"ok\"}");
    }

    #[test]
    fn fence_on_one_line() {
        assert_eq!(strip_markdown_code_fence("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn unfenced_text_only_trimmed() {
        assert_eq!(strip_markdown_code_fence("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn empty_fence() {
        assert_eq!(strip_markdown_code_fence("```\n```"), "");
        assert_eq!(strip_markdown_code_fence("```"), "");
    }
}
