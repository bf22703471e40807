//! Per-file issue reports returned by every batch operation.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Issue {
            severity,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self::new(Severity::Notice, message)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub issues: Vec<Issue>,
}

/// Issues grouped by file, in the order files were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub files: Vec<FileReport>,
    /// Set when the batch stopped before every file was processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: &Path, issue: Issue) {
        match self.files.iter_mut().find(|file| file.path == path) {
            Some(file) => file.issues.push(issue),
            None => self.files.push(FileReport {
                path: path.to_path_buf(),
                issues: vec![issue],
            }),
        }
    }

    pub fn record_all(&mut self, path: &Path, issues: impl IntoIterator<Item = Issue>) {
        for issue in issues {
            self.record(path, issue);
        }
    }

    /// Records a failure that stopped processing of `path`.
    pub fn record_error(&mut self, path: &Path, error: &Error) {
        log::error!("{}: {error}", path.display());
        self.record(path, Issue::error(error.to_string()));
    }

    /// Marks the batch as stopped early.
    pub fn abort(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::error!("Stopping: {reason}");
        self.aborted = Some(reason);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.aborted.is_none()
    }

    pub fn has_errors(&self) -> bool {
        self.aborted.is_some() || self.issues().any(|issue| issue.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.issues()
            .filter(|issue| issue.severity == Severity::Error)
            .count()
    }

    /// Paths with at least one error.
    pub fn failed_files(&self) -> Vec<&Path> {
        self.files
            .iter()
            .filter(|file| file.issues.iter().any(|i| i.severity == Severity::Error))
            .map(|file| file.path.as_path())
            .collect()
    }

    fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.files.iter().flat_map(|file| file.issues.iter())
    }

    /// Plain-text rendering; `nothing_to_do` is returned for an empty report.
    pub fn render(&self, nothing_to_do: &str) -> String {
        if self.is_empty() {
            return nothing_to_do.to_string();
        }
        let mut out = String::new();
        if !self.files.is_empty() {
            out.push_str(&format!("Issues in {} file(s):\n", self.files.len()));
        }
        for file in &self.files {
            out.push_str(&format!("\n{}\n", file.path.display()));
            for issue in &file.issues {
                let rendered = issue.to_string().replace('\n', "\n      ");
                out.push_str(&format!("  {rendered}\n"));
            }
        }
        if let Some(reason) = &self.aborted {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("Aborted: {reason}\n"));
        }
        out
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
