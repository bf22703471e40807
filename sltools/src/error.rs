//! All error types for the sltools crate.
//!
//! File-level failures (decoding, include resolution, XML syntax) are caught at
//! the file boundary by the batch operations and recorded in a
//! [`Report`](crate::report::Report); only setup errors abort a whole run.

use std::{fmt, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("can't decode `{}` as windows-1251", path.display())]
    Encoding { path: PathBuf },

    #[error(transparent)]
    XmlSyntax(#[from] XmlSyntaxError),

    #[error("invalid XML declaration: {0}")]
    Declaration(DeclarationIssue),

    #[error("can't resolve include, no such file: {}", path.display())]
    IncludeResolution { path: PathBuf },

    #[error("include cycle detected: {chain}")]
    IncludeCycle { chain: String },

    #[error(transparent)]
    Translation(#[from] TranslateError),

    #[error("no XML files found in {0}")]
    NoFilesFound(String),

    #[error("invalid string table: {0}")]
    InvalidStringTable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates an include resolution error for the unresolved target.
    pub fn include_resolution(path: impl Into<PathBuf>) -> Self {
        Error::IncludeResolution { path: path.into() }
    }

    /// Creates an include cycle error from the chain of files that closed the loop.
    pub fn include_cycle<I, P>(chain: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let chain = chain
            .into_iter()
            .map(|p| p.into().display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        Error::IncludeCycle { chain }
    }

    /// Creates an invalid string table error.
    pub fn invalid_string_table(message: impl Into<String>) -> Self {
        Error::InvalidStringTable(message.into())
    }

    /// True for errors that must stop a whole batch, not just the current file.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(
            self,
            Error::Translation(TranslateError::AccessDenied(_)) | Error::NoFilesFound(_)
        )
    }
}

/// A structural XML failure with 1-based position.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{cause} (line {line}, column {column})")]
pub struct XmlSyntaxError {
    pub line: usize,
    pub column: usize,
    pub cause: SyntaxCause,
}

impl XmlSyntaxError {
    pub fn new(line: usize, column: usize, cause: SyntaxCause) -> Self {
        Self {
            line,
            column,
            cause,
        }
    }

    /// Creates an error positioned at byte `offset` of `text`.
    pub fn at(text: &str, offset: usize, cause: SyntaxCause) -> Self {
        let (line, column) = line_column(text, offset);
        Self::new(line, column, cause)
    }
}

/// 1-based line and column (in characters) of byte `offset` in `text`.
pub fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &text[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (
        before.matches('\n').count() + 1,
        before[line_start..].chars().count() + 1,
    )
}

/// Known parser failures, classified into user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCause {
    DoubleHyphenInComment,
    EmptyDocument,
    MisplacedDeclaration,
    UnclosedElement(String),
    MismatchedEndTag { expected: String, found: String },
    UnmatchedEndTag(String),
    ContentAfterRoot,
    ContentBeforeRoot,
    UnknownEntity(String),
    /// Raw diagnostic from the XML reader.
    Other(String),
}

impl fmt::Display for SyntaxCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxCause::DoubleHyphenInComment => {
                write!(f, "XML file has '--' within a comment")
            }
            SyntaxCause::EmptyDocument => write!(f, "XML file is empty which is not allowed"),
            SyntaxCause::MisplacedDeclaration => write!(
                f,
                "XML declaration is allowed only at the start of the document"
            ),
            SyntaxCause::UnclosedElement(name) => {
                write!(f, "element <{name}> is not closed at end of input")
            }
            SyntaxCause::MismatchedEndTag { expected, found } => {
                write!(f, "expected </{expected}>, found </{found}>")
            }
            SyntaxCause::UnmatchedEndTag(name) => {
                write!(f, "end tag </{name}> does not match any open element")
            }
            SyntaxCause::ContentAfterRoot => {
                write!(f, "extra content at the end of the document")
            }
            SyntaxCause::ContentBeforeRoot => write!(f, "start tag expected, '<' not found"),
            SyntaxCause::UnknownEntity(entity) => write!(f, "unknown entity `&{entity};`"),
            SyntaxCause::Other(message) => write!(f, "can't parse root tag: {message}"),
        }
    }
}

/// What is wrong with a document's `<?xml ...?>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationIssue {
    Missing,
    Misplaced,
    Duplicated(usize),
    WrongVersion(String),
    WrongEncoding(String),
}

impl fmt::Display for DeclarationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationIssue::Missing => write!(f, "declaration is missing"),
            DeclarationIssue::Misplaced => write!(f, "declaration is not at the start of the file"),
            DeclarationIssue::Duplicated(count) => {
                write!(f, "found {count} declarations, expected exactly one")
            }
            DeclarationIssue::WrongVersion(version) => {
                write!(f, "version is `{version}`, expected `1.0`")
            }
            DeclarationIssue::WrongEncoding(encoding) => {
                write!(f, "encoding is `{encoding}`, expected `windows-1251`")
            }
        }
    }
}

/// Failure reported by a [`Translator`](crate::translate::Translator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// The service rejected the credentials (HTTP 401/403). Stops the batch.
    #[error("translation service denied access: {0}")]
    AccessDenied(String),

    #[error("translation failed: {0}")]
    Failed(String),
}
