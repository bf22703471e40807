//! Layout of `<text>` values so the file reads like the text shows in game.

use crate::{
    types::{ID_ATTRIBUTE, StringTable, TEXT_TAG},
    writer::INDENT,
};

/// Lines are wrapped at this many characters, indentation not included.
pub const WRAP_WIDTH: usize = 85;

const NEWLINE_MARKER: &str = "\\n";

/// Folds `text` to single spaces, breaks the line before every `\n` marker,
/// wraps at [`WRAP_WIDTH`] and indents for a `<text>` nested two levels deep.
///
/// Lines starting with the marker are outdented by two columns. The value
/// ends with a newline and two indentation steps so `</text>` lines up.
pub fn format_text_entry(text: &str) -> String {
    let folded = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let marked = folded.replace(NEWLINE_MARKER, &format!("\n{NEWLINE_MARKER}"));
    let indent = INDENT.repeat(3);

    let mut lines = Vec::new();
    for segment in marked.split('\n').filter(|s| !s.is_empty()) {
        for line in wrap(segment, WRAP_WIDTH) {
            if line.starts_with(NEWLINE_MARKER) {
                lines.push(format!("{}{line}", &indent[2..]));
            } else {
                lines.push(format!("{indent}{line}"));
            }
        }
    }
    format!("\n{}\n{}", lines.join("\n"), INDENT.repeat(2))
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in line.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        let word_len = chars.len();
        if current_len > 0 && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += word_len;
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Formats every non-blank `<text>` of every entry. Returns the ids of
/// entries whose text changed.
pub fn format_entries(table: &mut StringTable) -> Vec<String> {
    let mut changed = Vec::new();
    for string in table.string_elements_mut() {
        let id = string.attribute(ID_ATTRIBUTE).unwrap_or_default().to_string();
        let Some(text) = string.child_mut(TEXT_TAG) else {
            continue;
        };
        let Some(value) = text.text.as_mut() else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        let formatted = format_text_entry(value);
        if *value != formatted {
            log::info!("Text of '{id}' was formatted");
            *value = formatted;
            changed.push(id);
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_format_short_entry() {
        assert_eq!(
            format_text_entry("  Hello   world "),
            "\n            Hello world\n        "
        );
    }

    #[test]
    fn test_format_outdents_newline_markers() {
        assert_eq!(
            format_text_entry("Title:\\n- first\\n- second"),
            "\n            Title:\n          \\n- first\n          \\n- second\n        "
        );
    }

    #[test]
    fn test_format_wraps_long_lines() {
        let text = "word ".repeat(30);
        let formatted = format_text_entry(&text);
        let lines: Vec<&str> = formatted.lines().filter(|l| !l.trim().is_empty()).collect();
        // 17 four-letter words and their separators fit in 85 columns.
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].trim_start().len(), 84);
        assert!(lines.iter().all(|l| l.trim_start().len() <= WRAP_WIDTH));
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let word = "x".repeat(90);
        assert_eq!(wrap(&format!("a {word}"), 85), vec![
            "a".to_string(),
            "x".repeat(85),
            "x".repeat(5)
        ]);
    }

    #[test]
    fn test_format_is_idempotent() {
        let once = format_text_entry("Line one\\n line two with %c[d_red] color");
        assert_eq!(format_text_entry(&once), once);
    }

    #[test]
    fn test_format_entries_reports_changed_ids() {
        let mut table = parse(
            "<string_table><string id=\"a\"><text>Hi</text></string><string id=\"b\"><text> </text></string></string_table>",
        )
        .unwrap();
        assert_eq!(format_entries(&mut table), vec!["a".to_string()]);
        assert_eq!(format_entries(&mut table), Vec::<String>::new());
        assert_eq!(table.entries()[1].text, Some(" "));
    }
}
