//! Line classification for the response area.
//!
//! The response string is split into lines and every line gets exactly one
//! [`LineClass`] from syntactic rules on that line alone. The only state
//! carried between lines is whether a code fence is open. The view applies
//! a style per class and does nothing else with the content.

/// Syntactic class of a response line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// `**1. Title**`
    SectionHeader,
    /// `**Bold line**` or `**Label:** ...`
    SubHeader,
    /// A line opening or closing a ``` block.
    CodeFence,
    /// A line between fences; indentation is kept.
    Code,
    /// A line with at least two `|` separators.
    TableRow,
    /// `- item`, `* item` or `1. item`.
    ListItem,
    /// Contains a check, cross or warning marker.
    StatusMarker,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub class: LineClass,
    pub text: String,
}

const STATUS_MARKERS: [&str; 3] = ["\u{2705}", "\u{274C}", "\u{26A0}"];

/// `<digits>.<whitespace>` at the start of `s`.
fn starts_with_ordinal(s: &str) -> bool {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let rest = &s[digits..];
    let mut chars = rest.chars();
    chars.next() == Some('.') && chars.next().is_some_and(char::is_whitespace)
}

fn classify_outside_code(trimmed: &str) -> LineClass {
    if let Some(rest) = trimmed.strip_prefix("**") {
        if starts_with_ordinal(rest) {
            return LineClass::SectionHeader;
        }
        if (trimmed.len() >= 4 && trimmed.ends_with("**")) || trimmed.contains(":**") {
            return LineClass::SubHeader;
        }
    }
    if trimmed.matches('|').count() >= 2 {
        return LineClass::TableRow;
    }
    if trimmed.starts_with("- ") || trimmed.starts_with("* ") || starts_with_ordinal(trimmed) {
        return LineClass::ListItem;
    }
    if STATUS_MARKERS.iter().any(|m| trimmed.contains(m)) {
        return LineClass::StatusMarker;
    }
    LineClass::Plain
}

/// Classifies every line of `response`.
pub fn classify_lines(response: &str) -> Vec<StyledLine> {
    let mut in_code = false;
    response
        .split('\n')
        .map(|raw| {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            let trimmed = line.trim();
            if trimmed.starts_with("```") {
                in_code = !in_code;
                return StyledLine {
                    class: LineClass::CodeFence,
                    text: trimmed.to_string(),
                };
            }
            if in_code {
                return StyledLine {
                    class: LineClass::Code,
                    text: line.to_string(),
                };
            }
            let class = classify_outside_code(trimmed);
            let text = if class == LineClass::Plain {
                line.to_string()
            } else {
                trimmed.to_string()
            };
            StyledLine { class, text }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classes(text: &str) -> Vec<LineClass> {
        classify_lines(text).into_iter().map(|l| l.class).collect()
    }

    #[test]
    fn headers() {
        assert_eq!(
            classes("**1. MY WALKTHROUGH:**\n**Analysis:**\n**Bold**\n**12. Deep**"),
            vec![
                LineClass::SectionHeader,
                LineClass::SubHeader,
                LineClass::SubHeader,
                LineClass::SectionHeader,
            ]
        );
    }

    #[test]
    fn code_block_keeps_indentation() {
        let lines = classify_lines("```cpp\n    int x = 0; // | a | b |\n- not a list\n```\n- a list");
        assert_eq!(
            lines.iter().map(|l| l.class).collect::<Vec<_>>(),
            vec![
                LineClass::CodeFence,
                LineClass::Code,
                LineClass::Code,
                LineClass::CodeFence,
                LineClass::ListItem,
            ]
        );
        assert_eq!(lines[1].text, "    int x = 0; // | a | b |");
        assert_eq!(lines[0].text, "```cpp");
    }

    #[test]
    fn tables_lists_and_markers() {
        assert_eq!(
            classes("| a | b |\n- item\n* item\n3. third\n\u{2705} done\nplain text\n3.5 is a number"),
            vec![
                LineClass::TableRow,
                LineClass::ListItem,
                LineClass::ListItem,
                LineClass::ListItem,
                LineClass::StatusMarker,
                LineClass::Plain,
                LineClass::Plain,
            ]
        );
    }

    #[test]
    fn plain_lines_keep_their_spacing() {
        let lines = classify_lines("   indented plain\r\n");
        assert_eq!(lines[0].text, "   indented plain");
        assert_eq!(lines[1].class, LineClass::Plain);
        assert_eq!(lines[1].text, "");
    }

    #[test]
    fn unclosed_fence_runs_to_the_end() {
        assert_eq!(
            classes("```\nx\ny"),
            vec![LineClass::CodeFence, LineClass::Code, LineClass::Code]
        );
    }
}
