use once_cell::sync::Lazy;
use regex::Regex;

use crate::text_metrics;

use super::surface::FontSpec;

/// Explicit line break token inside node text.
const LINE_BREAK: &str = "[br]";

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Splits `bold ` / `italic ` tokens off a font description such as
/// `"Bold Italic Verdana"`.
pub fn font_spec(font: &str, size: f32) -> FontSpec {
    let mut family = font.to_lowercase();
    let mut bold = false;
    let mut italic = false;
    if let Some(at) = family.find("bold ") {
        family.replace_range(at..at + "bold ".len(), "");
        bold = true;
    }
    if let Some(at) = family.find("italic ") {
        family.replace_range(at..at + "italic ".len(), "");
        italic = true;
    }
    FontSpec {
        family: family.trim().to_string(),
        size,
        bold,
        italic,
    }
}

/// Trims blanks and tabs at both ends and collapses inner runs to a single
/// space. Newlines become explicit break tokens.
pub(crate) fn clean_text(input: &str) -> String {
    let normalized = input.replace("\r\n", LINE_BREAK).replace('\n', LINE_BREAK);
    let trimmed = normalized.trim_matches(|ch| ch == ' ' || ch == '\t');
    BLANK_RUNS.replace_all(trimmed, " ").into_owned()
}

/// Breaks node text into at most `max_lines` lines no wider than
/// `max_width`, splitting at break tokens first and then at the last space
/// that makes the line fit. A single word wider than the limit stays whole.
pub(crate) fn wrap_text(
    text: &str,
    max_width: f32,
    max_lines: usize,
    measure: impl Fn(&str) -> f32,
) -> Vec<String> {
    let mut rest = clean_text(text);
    let mut lines = Vec::new();
    while !rest.is_empty() && lines.len() < max_lines {
        let (head, after_break) = match rest.find(LINE_BREAK) {
            Some(at) => (&rest[..at], Some(at + LINE_BREAK.len())),
            None => (rest.as_str(), None),
        };
        let mut line = head;
        while measure(line) > max_width {
            match line.rfind(' ') {
                Some(at) if at > 0 => line = &line[..at],
                _ => break,
            }
        }
        let next = if line.len() < head.len() {
            rest[line.len()..].trim_start().to_string()
        } else if let Some(start) = after_break {
            rest[start..].to_string()
        } else {
            String::new()
        };
        lines.push(line.trim().to_string());
        rest = next;
    }
    lines
}

/// Drops trailing characters until `line` is no wider than `max_width`.
pub(crate) fn fit_line(line: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> String {
    let mut fitted = line.to_string();
    while !fitted.is_empty() && measure(&fitted) > max_width {
        fitted.pop();
    }
    fitted
}

pub(crate) fn text_width(text: &str, font: &FontSpec, fast_metrics: bool) -> f32 {
    if fast_metrics && text.is_ascii() {
        return fallback_text_width(text, font);
    }
    text_metrics::measure_text_width(text, font.size, &font.family, font.bold, font.italic)
        .unwrap_or_else(|| fallback_text_width(text, font))
}

fn fallback_text_width(text: &str, font: &FontSpec) -> f32 {
    let weight = if font.bold { 1.06 } else { 1.0 };
    text.chars().map(char_width_factor).sum::<f32>() * font.size * weight
}

/// Approximate advance widths of a Helvetica-like face, relative to the
/// font size.
fn char_width_factor(ch: char) -> f32 {
    match ch {
        'i' | 'j' | 'l' | '\'' | '|' => 0.222,
        ' ' | 'f' | 't' | 'I' | '.' | ',' | ':' | ';' | '!' | '/' | '\\' | '[' | ']' => 0.278,
        'r' | '(' | ')' | '-' | '{' | '}' => 0.333,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' | 'J' => 0.5,
        'm' | 'M' => 0.833,
        'w' | 'C' | 'D' | 'G' | 'H' | 'N' | 'R' | 'U' => 0.722,
        'W' => 0.944,
        'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 0.667,
        'F' | 'T' | 'Z' => 0.611,
        'L' => 0.556,
        'O' | 'Q' => 0.778,
        '@' => 1.015,
        '%' => 0.889,
        '&' => 0.667,
        ch if ch.is_ascii() => 0.556,
        _ => 0.62,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontSpec {
        font_spec("arial", 10.0)
    }

    fn measure(text: &str) -> f32 {
        fallback_text_width(text, &font())
    }

    #[test]
    fn clean_text_trims_and_collapses() {
        assert_eq!(clean_text(" \t Head   of\t\tSales  "), "Head of Sales");
        assert_eq!(clean_text("a\nb"), "a[br]b");
    }

    #[test]
    fn font_tokens_are_lifted() {
        let spec = font_spec("Bold Italic Verdana", 14.0);
        assert_eq!(spec.family, "verdana");
        assert!(spec.bold);
        assert!(spec.italic);
        let plain = font_spec("arial", 12.0);
        assert!(!plain.bold && !plain.italic);
    }

    #[test]
    fn break_token_forces_new_line() {
        let lines = wrap_text("CEO[br]Jane Doe", 1000.0, 9, measure);
        assert_eq!(lines, vec!["CEO", "Jane Doe"]);
    }

    #[test]
    fn long_text_wraps_at_spaces() {
        let lines = wrap_text("alpha beta gamma delta", 60.0, 9, measure);
        assert!(lines.len() > 1, "{lines:?}");
        for line in &lines {
            assert!(measure(line) <= 60.0 || !line.contains(' '), "{line}");
        }
        assert_eq!(lines.join(" "), "alpha beta gamma delta");
    }

    #[test]
    fn line_count_is_bounded() {
        let lines = wrap_text("a[br]b[br]c[br]d", 1000.0, 2, measure);
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn wide_word_is_truncated_by_fit_line() {
        let fitted = fit_line("Supercalifragilistic", 40.0, measure);
        assert!(measure(&fitted) <= 40.0);
        assert!("Supercalifragilistic".starts_with(&fitted));
    }

    #[test]
    fn bold_fallback_is_wider() {
        let regular = fallback_text_width("Team", &font());
        let bold = fallback_text_width("Team", &font_spec("bold arial", 10.0));
        assert!(bold > regular);
    }
}
