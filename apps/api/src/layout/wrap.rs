//! Greedy word-wrap over the fixed body font.
//!
//! `wrap_text` is a pure function of its inputs: explicit line breaks split the
//! text into paragraphs, blank paragraphs survive as empty lines, and each
//! paragraph is filled word by word until the next word would push the line
//! past the content width. A word that is wider than the content width on its
//! own still gets a line to itself, unbroken.

use tracing::debug;

use crate::layout::font_metrics::{FontMetricTable, PageConfig};

/// Removes control characters and the 0x7F-0xFF range from text.
///
/// Tab, line feed and carriage return survive; paragraph splitting and
/// measurement deal with them downstream.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|&c| !is_stripped(c)).collect()
}

fn is_stripped(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'..='\u{FF}')
}

/// Wraps `text` into lines no wider than `config.content_width()` at the body size.
///
/// Words that cannot be measured (unsupported glyphs) are dropped from the
/// output; the remaining words keep their order.
pub fn wrap_text(text: &str, metrics: &FontMetricTable, config: &PageConfig) -> Vec<String> {
    let max_width = config.content_width();
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split(' ') {
            let word = sanitize(word);
            let candidate = if current.is_empty() {
                word.clone()
            } else {
                format!("{current} {word}")
            };

            let Some(width) = metrics.measure_str(&candidate, config.text_size) else {
                debug!(word = %word, face = ?metrics.face, "Skipping word with unsupported glyphs");
                continue;
            };

            if width > max_width && !current.is_empty() {
                lines.push(std::mem::replace(&mut current, word));
            } else {
                current = candidate;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::{default_page_config, get_metrics, FontFace};

    fn wrap(text: &str) -> Vec<String> {
        wrap_text(text, get_metrics(FontFace::Regular), &default_page_config())
    }

    fn width(line: &str) -> f32 {
        let config = default_page_config();
        get_metrics(FontFace::Regular)
            .measure_str(line, config.text_size)
            .unwrap()
    }

    #[test]
    fn test_sanitize_strips_control_and_latin1() {
        assert_eq!(sanitize("a\u{00}b\u{07}c"), "abc");
        assert_eq!(sanitize("Jos\u{E9}"), "Jos");
        assert_eq!(sanitize("tab\tand\nnewline\r"), "tab\tand\nnewline\r");
        assert_eq!(sanitize("del\u{7F}"), "del");
    }

    #[test]
    fn test_sanitize_keeps_characters_above_latin1() {
        assert_eq!(sanitize("\u{2014}"), "\u{2014}");
    }

    #[test]
    fn test_short_text_is_single_line() {
        let lines = wrap("Senior engineer with 5 years experience");
        assert_eq!(lines, vec!["Senior engineer with 5 years experience"]);
    }

    #[test]
    fn test_empty_text_is_one_blank_line() {
        assert_eq!(wrap(""), vec![String::new()]);
    }

    #[test]
    fn test_long_paragraph_respects_content_width() {
        let config = default_page_config();
        let text = "Designed and operated a multi-region ingestion pipeline ".repeat(12);
        let lines = wrap(&text);
        assert!(lines.len() > 1, "long paragraph should wrap");
        for line in &lines {
            assert!(
                width(line) <= config.content_width(),
                "line too wide: {line:?}"
            );
        }
    }

    #[test]
    fn test_wrap_preserves_word_order_and_count() {
        let text = "one two three four five six seven eight nine ten ".repeat(10);
        let lines = wrap(text.trim_end());
        let rejoined: Vec<&str> = lines.iter().flat_map(|l| l.split(' ')).collect();
        let original: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_oversized_word_gets_its_own_line() {
        let config = default_page_config();
        let giant = "W".repeat(80);
        let lines = wrap(&format!("before {giant} after"));
        assert_eq!(lines, vec!["before".to_string(), giant.clone(), "after".to_string()]);
        assert!(width(&giant) > config.content_width());
    }

    #[test]
    fn test_blank_paragraphs_are_preserved() {
        let lines = wrap("first\n\nsecond\r\n\r\n\r\nthird");
        assert_eq!(lines, vec!["first", "", "second", "", "", "third"]);
        let blanks = lines.iter().filter(|l| l.is_empty()).count();
        assert_eq!(blanks, 3);
    }

    #[test]
    fn test_whitespace_only_paragraph_is_blank() {
        assert_eq!(wrap("a\n   \t \nb"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_unmeasurable_word_is_skipped() {
        assert_eq!(wrap("hello 世界 world"), vec!["hello world"]);
    }

    #[test]
    fn test_wrap_is_restartable() {
        let text = "repeatable output for identical input ".repeat(20);
        assert_eq!(wrap(&text), wrap(&text));
    }
}
