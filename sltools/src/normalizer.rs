//! Repair, parse and canonical rendering of one document.

use crate::{
    codepage::{CodepageSource, FileSource},
    error::Error,
    include::IncludeResolver,
    parser::parse,
    repair::{Correction, check_declaration, repair},
    report::Issue,
    text::format_entries,
    types::StringTable,
    writer::serialize,
};

/// Switches for [`Normalizer::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Apply textual fixes before parsing.
    pub repair: bool,
    /// Re-layout every `<text>` value.
    pub format_text_entries: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            repair: true,
            format_text_entries: false,
        }
    }
}

/// Canonical text of a document and what it took to get there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    pub corrections: Vec<Correction>,
    /// Advisory problems that did not stop normalization.
    pub issues: Vec<Issue>,
    /// Ids of entries whose text was re-laid out.
    pub formatted_entries: Vec<String>,
}

/// A parsed document before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub table: StringTable,
    pub corrections: Vec<Correction>,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone)]
pub struct Normalizer<S = CodepageSource> {
    resolver: IncludeResolver<S>,
    options: NormalizeOptions,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(IncludeResolver::default(), NormalizeOptions::default())
    }
}

impl<S: FileSource> Normalizer<S> {
    pub fn new(resolver: IncludeResolver<S>, options: NormalizeOptions) -> Self {
        Normalizer { resolver, options }
    }

    pub fn options(&self) -> NormalizeOptions {
        self.options
    }

    pub fn resolver(&self) -> &IncludeResolver<S> {
        &self.resolver
    }

    /// Repairs (if enabled) and parses `text` without rendering it.
    pub fn prepare(&self, text: &str) -> Result<Prepared, Error> {
        let mut corrections = Vec::new();
        let mut issues = Vec::new();

        let source = if self.options.repair {
            let repaired = repair(text, &self.resolver)?;
            corrections = repaired.corrections;
            issues.extend(
                repaired
                    .include_failures
                    .iter()
                    .map(|err| Issue::warning(err.to_string())),
            );
            repaired.text
        } else {
            if let Some(issue) = check_declaration(text) {
                issues.push(Issue::warning(Error::Declaration(issue).to_string()));
            }
            text.to_string()
        };

        Ok(Prepared {
            table: parse(&source)?,
            corrections,
            issues,
        })
    }

    /// Repairs (if enabled), parses and re-renders `text`.
    ///
    /// Applying this to its own output changes nothing.
    pub fn normalize(&self, text: &str) -> Result<Normalized, Error> {
        let Prepared {
            mut table,
            corrections,
            issues,
        } = self.prepare(text)?;
        let formatted_entries = if self.options.format_text_entries {
            format_entries(&mut table)
        } else {
            Vec::new()
        };
        Ok(Normalized {
            text: serialize(&table),
            corrections,
            issues,
            formatted_entries,
        })
    }
}
