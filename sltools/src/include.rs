//! Textual expansion of `#include "path"` directives.
//!
//! The game engine splices included files before parsing, so string tables
//! using the macro are not well-formed XML until it is resolved. Targets are
//! resolved against one base directory, never against the including file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    codepage::{CodepageSource, FileSource},
    error::Error,
};

/// Base directory used when none is configured. Like any relative base it is
/// joined onto the current working directory, so it fits runs started from a
/// `configs/text/<lang>/` folder.
pub const DEFAULT_INCLUDE_BASE: &str = "../../gamedata/configs";

const DIRECTIVE: &str = "#include";

/// What to do when a directive can't be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludePolicy {
    /// The first failure aborts the file.
    #[default]
    Fatal,
    /// The directive line is kept, the failure is recorded, expansion goes on.
    Advisory,
}

/// Outcome of a successful expansion.
#[derive(Debug, Default)]
pub struct Resolved {
    pub text: String,
    /// Every file spliced in, in the order they were read.
    pub included: Vec<PathBuf>,
    /// Failures tolerated under [`IncludePolicy::Advisory`].
    pub failures: Vec<Error>,
}

#[derive(Debug, Clone)]
pub struct IncludeResolver<S = CodepageSource> {
    base_dir: PathBuf,
    policy: IncludePolicy,
    source: S,
}

impl Default for IncludeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_INCLUDE_BASE)
    }
}

impl IncludeResolver {
    /// Creates a resolver reading targets from disk.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_source(base_dir, CodepageSource)
    }
}

impl<S: FileSource> IncludeResolver<S> {
    pub fn with_source(base_dir: impl Into<PathBuf>, source: S) -> Self {
        IncludeResolver {
            base_dir: base_dir.into(),
            policy: IncludePolicy::default(),
            source,
        }
    }

    pub fn policy(mut self, policy: IncludePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Expands every directive in `text`, recursively.
    ///
    /// Non-directive lines are kept unchanged and in place, and a trailing
    /// newline in `text` is preserved.
    pub fn resolve(&self, text: &str) -> Result<Resolved, Error> {
        let mut resolved = Resolved::default();
        let mut chain = Vec::new();
        resolved.text = self.expand(text, &mut chain, &mut resolved)?;
        Ok(resolved)
    }

    fn expand(
        &self,
        text: &str,
        chain: &mut Vec<PathBuf>,
        resolved: &mut Resolved,
    ) -> Result<String, Error> {
        let mut lines = Vec::new();
        for line in text.split('\n') {
            if !is_directive(line) {
                lines.push(line.to_string());
                continue;
            }
            match self.splice(line, chain, resolved) {
                Ok(content) => lines.push(content),
                Err(err) if self.policy == IncludePolicy::Advisory => {
                    log::warn!("{err}, keeping the directive as is");
                    resolved.failures.push(err);
                    lines.push(line.to_string());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(lines.join("\n"))
    }

    fn splice(
        &self,
        line: &str,
        chain: &mut Vec<PathBuf>,
        resolved: &mut Resolved,
    ) -> Result<String, Error> {
        let target = line.split('"').nth(1).ok_or_else(|| {
            Error::invalid_string_table(format!("malformed include directive `{}`", line.trim()))
        })?;
        let path = self.base_dir.join(target.replace('\\', "/"));

        if chain.contains(&path) {
            let mut cycle = chain.clone();
            cycle.push(path);
            return Err(Error::include_cycle(cycle));
        }

        let content = self.source.read_text(&path).map_err(|err| match err {
            Error::Io(_) => Error::include_resolution(&path),
            other => other,
        })?;
        log::debug!("Including {}", path.display());

        chain.push(path.clone());
        let expanded = self.expand(&content, chain, resolved);
        chain.pop();
        let expanded = expanded?;

        resolved.included.push(path);
        let expanded = expanded
            .strip_suffix("\r\n")
            .or_else(|| expanded.strip_suffix('\n'))
            .unwrap_or(&expanded)
            .to_string();
        Ok(expanded)
    }
}

fn is_directive(line: &str) -> bool {
    line.trim_start().starts_with(DIRECTIVE)
}

/// True if any line of `text` is an include directive.
pub fn has_includes(text: &str) -> bool {
    text.lines().any(is_directive)
}
