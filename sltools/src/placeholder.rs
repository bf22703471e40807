//! Guarding of in-game markup around machine translation.
//!
//! Goals:
//! - Replace every placeholder span (`%c[name]`, `%c[r,g,b,a]`, `$$ACTION$$`, `$var`, `%s`, `%c`)
//!   with an angle-bracket token a translation service leaves alone, and restore it afterwards.
//! - Detect malformed color spans that would otherwise be mangled or silently skipped.
//! - Summarize which spans a corpus actually uses.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;

/// Kinds of placeholder spans found in `<text>` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    NamedColor,
    NumericColor,
    Action,
    Variable,
    StringPlaceholder,
    CharPlaceholder,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::NamedColor => "named color",
            PatternKind::NumericColor => "numeric color",
            PatternKind::Action => "action",
            PatternKind::Variable => "variable",
            PatternKind::StringPlaceholder => "%s placeholder",
            PatternKind::CharPlaceholder => "%c placeholder",
        }
    }
}

struct Rule {
    pattern: Regex,
    /// `None` for rules that rewrite an already guarded token.
    kind: Option<PatternKind>,
    render: fn(&Captures) -> String,
}

impl Rule {
    fn new(pattern: &str, kind: Option<PatternKind>, render: fn(&Captures) -> String) -> Self {
        Rule {
            pattern: Regex::new(pattern).unwrap(),
            kind,
            render,
        }
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures| (self.render)(caps))
            .into_owned()
    }
}

fn keep(caps: &Captures) -> String {
    caps[0].to_string()
}

lazy_static! {
    /// Applied in order; colors before bare `%c`, actions before variables.
    static ref GUARD_RULES: Vec<Rule> = vec![
        Rule::new(r"%c\[([A-Za-z0-9_]+)\]", Some(PatternKind::NamedColor), |c| {
            format!("<{}_color>", &c[1])
        }),
        Rule::new(
            r"%c\[(\d+),(\d+),(\d+),(\d+)\]",
            Some(PatternKind::NumericColor),
            |c| format!("<{}_{}_{}_{}_color_num>", &c[1], &c[2], &c[3], &c[4]),
        ),
        Rule::new(r"(<[^<>]+_color(?:_num)?)> •", None, |c| format!("{}_dot>", &c[1])),
        Rule::new(r"\$\$([A-Z_]+)\$\$", Some(PatternKind::Action), |c| {
            format!("<{}_action>", &c[1])
        }),
        Rule::new(r"\$([a-z_]+)", Some(PatternKind::Variable), |c| {
            format!("<{}_var>", &c[1])
        }),
        Rule::new("%s", Some(PatternKind::StringPlaceholder), |_| {
            "<s_placeholder>".to_string()
        }),
        // A `%c` directly followed by `[` or ` [` is a (possibly malformed) color span.
        Rule::new(r"%c( ?\[)?", Some(PatternKind::CharPlaceholder), |c| {
            if c.get(1).is_some() {
                keep(c)
            } else {
                "<c_placeholder>".to_string()
            }
        }),
    ];

    static ref UNGUARD_RULES: Vec<Rule> = vec![
        Rule::new(r"(<[^<>]+_color(?:_num)?)_dot>", None, |c| format!("{}> •", &c[1])),
        Rule::new(r"<([A-Za-z0-9_]+)_color>", None, |c| format!("%c[{}]", &c[1])),
        Rule::new(r"<(\d+)_(\d+)_(\d+)_(\d+)_color_num>", None, |c| {
            format!("%c[{},{},{},{}]", &c[1], &c[2], &c[3], &c[4])
        }),
        Rule::new(r"<([A-Z0-9_]+)_action>", None, |c| format!("$${}$$", &c[1])),
        Rule::new(r"<([a-z0-9_]+)_var>", None, |c| format!("${}", &c[1])),
        Rule::new("<s_placeholder>", None, |_| "%s".to_string()),
        Rule::new("<c_placeholder>", None, |_| "%c".to_string()),
    ];

    static ref LEFTOVER_TOKEN: Regex = Regex::new(r"<[^<>\s]+>").unwrap();
    static ref COLOR_SPAN: Regex = Regex::new(r"%c(\s*)\[([^\[\]\n]*)\]").unwrap();
}

/// Replaces every placeholder span with a reversible angle-bracket token.
///
/// Guarding is total: text without spans is returned unchanged.
pub fn guard(text: &str) -> String {
    GUARD_RULES
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc))
}

/// Exact inverse of [`guard`]. Unknown tokens are passed through and logged.
pub fn unguard(text: &str) -> String {
    let restored = UNGUARD_RULES
        .iter()
        .fold(text.to_string(), |acc, rule| rule.apply(&acc));
    for token in LEFTOVER_TOKEN.find_iter(&restored) {
        log::warn!(
            "Unrecognized token {} left in translated text, check it by hand",
            token.as_str()
        );
    }
    restored
}

/// Folds redundant whitespace, then turns literal `\n` markers into real newlines.
pub fn newlines_to_real(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("\\n", "\n")
}

/// Turns real newlines back into literal `\n` markers.
pub fn real_to_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}

/// Counts every distinct span per kind.
pub fn analyze_patterns(text: &str) -> BTreeMap<PatternKind, BTreeMap<String, usize>> {
    let mut found: BTreeMap<PatternKind, BTreeMap<String, usize>> = BTreeMap::new();
    let mut current = text.to_string();
    for rule in GUARD_RULES.iter() {
        if let Some(kind) = rule.kind {
            for caps in rule.pattern.captures_iter(&current) {
                // Color spans are counted by the color rules, not as `%c`.
                if kind == PatternKind::CharPlaceholder && caps.get(1).is_some() {
                    continue;
                }
                *found
                    .entry(kind)
                    .or_default()
                    .entry(caps[0].to_string())
                    .or_default() += 1;
            }
        }
        current = rule.apply(&current);
    }
    found
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderIssueKind {
    WhitespaceBeforeBracket,
    WhitespaceInsideBrackets,
    HyphenInName,
    NameStartsWithDigit,
}

impl PlaceholderIssueKind {
    pub fn description(self) -> &'static str {
        match self {
            PlaceholderIssueKind::WhitespaceBeforeBracket => "extra whitespace before '['",
            PlaceholderIssueKind::WhitespaceInsideBrackets => "extra whitespace inside brackets",
            PlaceholderIssueKind::HyphenInName => "hyphen in color name",
            PlaceholderIssueKind::NameStartsWithDigit => "color name starts with a digit",
        }
    }
}

/// A malformed color span. `row` and `column` are 1-based and point at the
/// offending character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderIssue {
    pub kind: PlaceholderIssueKind,
    pub row: usize,
    pub column: usize,
    pub content: String,
    pub snippet: String,
}

impl std::fmt::Display for PlaceholderIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} in `{}` at row {}, column {}:\n{}",
            self.kind.description(),
            self.content,
            self.row,
            self.column,
            self.snippet
        )
    }
}

/// Finds malformed color spans.
///
/// Rules: whitespace between `%c` and `[`, whitespace right after `[` or
/// right before `]`, a `-` in the name, a name starting with a digit (numeric
/// `r,g,b,a` colors excepted).
pub fn check_placeholders(text: &str) -> Vec<PlaceholderIssue> {
    let mut issues = Vec::new();
    for caps in COLOR_SPAN.captures_iter(text) {
        let (Some(span), Some(gap), Some(inner)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let mut report = |kind, offset| {
            issues.push(make_issue(text, kind, offset, span.as_str()));
        };

        if !gap.as_str().is_empty() {
            report(PlaceholderIssueKind::WhitespaceBeforeBracket, gap.start());
        }

        let body = inner.as_str();
        let name = body.trim();
        let leading = body.len() - body.trim_start().len();
        if leading > 0 {
            report(PlaceholderIssueKind::WhitespaceInsideBrackets, inner.start());
        }
        if !name.is_empty() && body.len() != body.trim_end().len() {
            report(
                PlaceholderIssueKind::WhitespaceInsideBrackets,
                inner.start() + body.trim_end().len(),
            );
        }

        let name_start = inner.start() + leading;
        if let Some(pos) = name.find('-') {
            report(PlaceholderIssueKind::HyphenInName, name_start + pos);
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) && !name.contains(',') {
            report(PlaceholderIssueKind::NameStartsWithDigit, name_start);
        }
    }
    issues
}

fn make_issue(text: &str, kind: PlaceholderIssueKind, offset: usize, content: &str) -> PlaceholderIssue {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
    let row = text[..offset].matches('\n').count() + 1;
    let column = text[line_start..offset].chars().count() + 1;

    let line = &text[line_start..line_end];
    let snippet = format!("{line}\n{}^", " ".repeat(column - 1));

    PlaceholderIssue {
        kind,
        row,
        column,
        content: content.to_string(),
        snippet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_named_and_numeric_colors() {
        assert_eq!(
            guard("%c[d_red]Warning:%c[0,255,0,255] ok"),
            "<d_red_color>Warning:<0_255_0_255_color_num> ok"
        );
    }

    #[test]
    fn test_guard_dot_variant() {
        assert_eq!(guard("%c[ui_gray_2] • Item"), "<ui_gray_2_color_dot> Item");
        assert_eq!(unguard("<ui_gray_2_color_dot> Item"), "%c[ui_gray_2] • Item");
    }

    #[test]
    fn test_guard_actions_before_variables() {
        assert_eq!(
            guard("Press $$ACTION_USE$$ to use $item"),
            "Press <ACTION_USE_action> to use <item_var>"
        );
    }

    #[test]
    fn test_guard_bare_placeholders() {
        assert_eq!(guard("%s: %c"), "<s_placeholder>: <c_placeholder>");
    }

    #[test]
    fn test_malformed_color_is_not_guarded() {
        assert_eq!(guard("%c[ d_red]Warning"), "%c[ d_red]Warning");
        assert_eq!(guard("%c [d_red]Warning"), "%c [d_red]Warning");
    }

    #[test]
    fn test_unguard_restores_everything() {
        let original = "%c[d_red]$$ACTION_USE$$%c[255,0,0,255] • $name %s%c";
        assert_eq!(unguard(&guard(original)), original);
    }

    #[test]
    fn test_unguard_keeps_unknown_tokens() {
        assert_eq!(unguard("<mystery> %s"), "<mystery> %s");
    }

    #[test]
    fn test_newline_transforms() {
        assert_eq!(newlines_to_real("Line one\\n   line  two"), "Line one\n line two");
        assert_eq!(real_to_newlines("Line one\n line two"), "Line one\\n line two");
    }

    #[test]
    fn test_check_whitespace_inside_brackets() {
        let issues = check_placeholders("Warning %c[ d_red]text");
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.kind, PlaceholderIssueKind::WhitespaceInsideBrackets);
        assert_eq!((issue.row, issue.column), (1, 12));
        assert_eq!(issue.content, "%c[ d_red]");
        assert_eq!(issue.snippet, "Warning %c[ d_red]text\n           ^");
    }

    #[test]
    fn test_check_trailing_whitespace_and_hyphen() {
        let issues = check_placeholders("first\n%c[d-red ]");
        let kinds: Vec<_> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PlaceholderIssueKind::WhitespaceInsideBrackets,
                PlaceholderIssueKind::HyphenInName
            ]
        );
        assert_eq!((issues[0].row, issues[0].column), (2, 9));
        assert_eq!((issues[1].row, issues[1].column), (2, 5));
    }

    #[test]
    fn test_check_whitespace_before_bracket_and_digit_name() {
        let issues = check_placeholders("%c  [2_red]");
        let kinds: Vec<_> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PlaceholderIssueKind::WhitespaceBeforeBracket,
                PlaceholderIssueKind::NameStartsWithDigit
            ]
        );
        assert_eq!(issues[0].column, 3);
    }

    #[test]
    fn test_check_accepts_well_formed_spans() {
        assert!(check_placeholders("%c[d_red]a %c[255,0,0,255]b %c %s").is_empty());
    }

    #[test]
    fn test_analyze_patterns_counts_distinct_spans() {
        let report = analyze_patterns("%c[d_red]a %c[d_red]b $$USE$$ $who %c %c[ bad]");
        assert_eq!(report[&PatternKind::NamedColor]["%c[d_red]"], 2);
        assert_eq!(report[&PatternKind::Action]["$$USE$$"], 1);
        assert_eq!(report[&PatternKind::Variable]["$who"], 1);
        assert_eq!(report[&PatternKind::CharPlaceholder]["%c"], 1);
        assert!(!report.contains_key(&PatternKind::NumericColor));
    }
}
