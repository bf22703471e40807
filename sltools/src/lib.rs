#![forbid(unsafe_code)]
//! Maintenance toolkit for game localization string tables.
//!
//! String tables are `windows-1251` XML files with a `<string_table>` root and
//! `<string id="...">` entries, each holding one `<text>`. Files written by hand
//! are often not well-formed: stray `&`, `--` inside comments, a wrong or
//! missing declaration, `#include` macros spliced in by the engine. This crate
//! repairs and normalizes them, guards inline game markup through machine
//! translation, and finds ids that several files define.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sltools::{IncludeResolver, NormalizeOptions, Normalizer, codepage::read_document};
//!
//! let normalizer = Normalizer::new(
//!     IncludeResolver::new("gamedata/configs"),
//!     NormalizeOptions::default(),
//! );
//! let text = read_document("gamedata/configs/text/eng/st_items.xml".as_ref())?;
//! let normalized = normalizer.normalize(&text)?;
//! for correction in &normalized.corrections {
//!     println!("{correction}");
//! }
//! # Ok::<(), sltools::Error>(())
//! ```
//!
//! Batch operations in [`pipeline`] isolate failures per file and return a
//! [`Report`].

pub mod codepage;
pub mod duplicates;
pub mod error;
pub mod include;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod placeholder;
pub mod repair;
pub mod report;
pub mod text;
pub mod translate;
pub mod types;
pub mod writer;

// Re-export most used types for easy consumption
pub use crate::{
    codepage::{CodepageSource, FileSource},
    duplicates::{DuplicateIndex, DuplicateKind, DuplicateRecord, OverlapReport, overlaps},
    error::{Error, TranslateError, XmlSyntaxError},
    include::{IncludePolicy, IncludeResolver},
    normalizer::{NormalizeOptions, Normalized, Normalizer},
    placeholder::{PlaceholderIssue, check_placeholders, guard, unguard},
    report::{Issue, Report, Severity},
    translate::{TranslateOptions, Translator},
    types::StringTable,
};
