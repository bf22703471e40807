//! Textual fixes applied before parsing: hyphens in comments, misused
//! ampersands, `#include` directives and the XML declaration.

use std::fmt;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;

use crate::{
    codepage::FileSource,
    error::{DeclarationIssue, Error, line_column},
    include::IncludeResolver,
};

/// The only declaration a string table may carry.
pub const CANONICAL_DECLARATION: &str = "<?xml version='1.0' encoding='WINDOWS-1251'?>";

const REQUIRED_VERSION: &str = "1.0";
const REQUIRED_ENCODING: &str = "windows-1251";
const PREDEFINED_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

lazy_static! {
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--(.*?)-->").unwrap();
    static ref HYPHEN_RUN: Regex = Regex::new(r"-{2,}").unwrap();
    static ref DECLARATION: Regex = Regex::new(r"(?is)<\?xml(?:\s.*?)?\?>").unwrap();
    static ref VERSION: Regex = Regex::new(r#"version\s*=\s*["']([^"']*)["']"#).unwrap();
    static ref ENCODING: Regex = Regex::new(r#"encoding\s*=\s*["']([^"']*)["']"#).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    CommentHyphens,
    Ampersand,
    Include,
    Declaration,
}

/// A human-readable notice about one applied fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Correction {
    pub kind: CorrectionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub message: String,
}

impl Correction {
    fn at(kind: CorrectionKind, text: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(text, offset);
        Correction {
            kind,
            line: Some(line),
            column: Some(column),
            message: message.into(),
        }
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{} (line {line}, column {column})", self.message)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Text after [`repair`], with what was changed.
#[derive(Debug, Default)]
pub struct Repaired {
    pub text: String,
    pub corrections: Vec<Correction>,
    /// Include failures tolerated by an advisory resolver.
    pub include_failures: Vec<Error>,
}

/// Applies every fix in order: comment hyphens, ampersands, includes, declaration.
pub fn repair<S: FileSource>(text: &str, resolver: &IncludeResolver<S>) -> Result<Repaired, Error> {
    let (text, mut corrections) = guard_comment_hyphens(text);

    let (text, ampersands) = escape_ampersands(&text);
    corrections.extend(ampersands);

    let resolved = resolver.resolve(&text)?;
    corrections.extend(resolved.included.iter().map(|path| Correction {
        kind: CorrectionKind::Include,
        line: None,
        column: None,
        message: format!("Resolved #include of {}", path.display()),
    }));

    let (text, issue) = fix_declaration(&resolved.text);
    if let Some(issue) = issue {
        corrections.push(Correction {
            kind: CorrectionKind::Declaration,
            line: None,
            column: None,
            message: format!("Replaced XML declaration, {issue}"),
        });
    }

    log::debug!("Applied {} correction(s)", corrections.len());
    Ok(Repaired {
        text,
        corrections,
        include_failures: resolved.failures,
    })
}

/// Replaces every run of two or more `-` inside a comment body with as many `=`.
pub fn guard_comment_hyphens(text: &str) -> (String, Vec<Correction>) {
    let mut corrections = Vec::new();
    let fixed = COMMENT.replace_all(text, |caps: &Captures| {
        let body = &caps[1];
        if !HYPHEN_RUN.is_match(body) {
            return caps[0].to_string();
        }
        if let Some(comment) = caps.get(0) {
            corrections.push(Correction::at(
                CorrectionKind::CommentHyphens,
                text,
                comment.start(),
                "Found '--' within a comment, replaced with '=='",
            ));
        }
        let body = HYPHEN_RUN.replace_all(body, |run: &Captures| "=".repeat(run[0].len()));
        format!("<!--{body}-->")
    });
    (fixed.into_owned(), corrections)
}

enum ScanState {
    Normal,
    /// Collecting a possible entity name after the `&` at the given offset.
    Entity(usize),
}

/// Escapes every `&` that does not start a predefined or numeric entity.
pub fn escape_ampersands(text: &str) -> (String, Vec<Correction>) {
    let mut out = String::with_capacity(text.len());
    let mut corrections = Vec::new();
    let mut state = ScanState::Normal;

    let mut misused = |out: &mut String, start: usize, name: &str| {
        out.push_str("&amp;");
        out.push_str(name);
        corrections.push(Correction::at(
            CorrectionKind::Ampersand,
            text,
            start,
            "Misused '&', replaced with '&amp;'",
        ));
    };

    for (i, ch) in text.char_indices() {
        if let ScanState::Entity(start) = state {
            let name = &text[start + 1..i];
            if ch == ';' {
                if is_known_entity(name) {
                    out.push('&');
                    out.push_str(name);
                } else {
                    misused(&mut out, start, name);
                }
                out.push(';');
                state = ScanState::Normal;
                continue;
            }
            if ch.is_ascii_alphanumeric() || ch == '#' {
                continue;
            }
            misused(&mut out, start, name);
            state = ScanState::Normal;
        }
        if ch == '&' {
            state = ScanState::Entity(i);
        } else {
            out.push(ch);
        }
    }
    if let ScanState::Entity(start) = state {
        misused(&mut out, start, &text[start + 1..]);
    }

    (out, corrections)
}

fn is_known_entity(name: &str) -> bool {
    if PREDEFINED_ENTITIES.contains(&name) {
        return true;
    }
    match name.strip_prefix('#') {
        Some(hex) if hex.starts_with('x') => {
            hex.len() > 1 && hex[1..].chars().all(|c| c.is_ascii_hexdigit())
        }
        Some(dec) => !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Checks that `text` starts with exactly one declaration of version `1.0`
/// and encoding `windows-1251`.
pub fn check_declaration(text: &str) -> Option<DeclarationIssue> {
    let found: Vec<_> = DECLARATION.find_iter(text).collect();
    let decl = match found.as_slice() {
        [] => return Some(DeclarationIssue::Missing),
        [decl] => decl,
        many => return Some(DeclarationIssue::Duplicated(many.len())),
    };
    if decl.start() != 0 {
        return Some(DeclarationIssue::Misplaced);
    }

    let version = declaration_attribute(&VERSION, decl.as_str());
    if version != REQUIRED_VERSION {
        return Some(DeclarationIssue::WrongVersion(version));
    }
    let encoding = declaration_attribute(&ENCODING, decl.as_str());
    if !encoding.eq_ignore_ascii_case(REQUIRED_ENCODING) {
        return Some(DeclarationIssue::WrongEncoding(encoding));
    }
    None
}

fn declaration_attribute(pattern: &Regex, decl: &str) -> String {
    pattern
        .captures(decl)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// Strips every declaration and prepends the canonical one.
pub fn fix_declaration(text: &str) -> (String, Option<DeclarationIssue>) {
    let issue = check_declaration(text);
    let stripped = DECLARATION.replace_all(text, "");
    let fixed = format!("{CANONICAL_DECLARATION}\n{}", stripped.trim_start());
    (fixed, issue)
}
