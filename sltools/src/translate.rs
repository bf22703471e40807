//! Machine translation of `<text>` values with placeholder guarding.
//!
//! Every value goes through: `\n` markers to newlines, [`guard`], the
//! [`Translator`], [`unguard`], newlines back to markers, then
//! [`format_text_entry`].

use serde::Serialize;

use crate::{
    error::TranslateError,
    placeholder::{PlaceholderIssue, check_placeholders, guard, newlines_to_real, real_to_newlines, unguard},
    text::format_text_entry,
    types::{ID_ATTRIBUTE, StringTable, TEXT_TAG},
};

/// An external translation service.
pub trait Translator {
    /// Translates `text` into `target_lang`. `source_lang` of `None` lets the
    /// service detect it.
    fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<String, TranslateError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    pub target_lang: String,
    pub source_lang: Option<String>,
}

impl TranslateOptions {
    pub fn new(target_lang: impl Into<String>) -> Self {
        TranslateOptions {
            target_lang: target_lang.into(),
            source_lang: None,
        }
    }

    pub fn from_lang(mut self, source_lang: impl Into<String>) -> Self {
        self.source_lang = Some(source_lang.into());
        self
    }
}

/// What happened to one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranslationSummary {
    /// Ids whose text was replaced.
    pub translated: Vec<String>,
    /// Malformed spans found in source texts, by id. They are sent unguarded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub placeholder_issues: Vec<(String, PlaceholderIssue)>,
}

/// Translates one value, returning the formatted result.
pub fn translate_text(
    text: &str,
    translator: &dyn Translator,
    options: &TranslateOptions,
) -> Result<String, TranslateError> {
    let prepared = guard(&newlines_to_real(text));
    log::debug!("Sending for translation: {prepared}");
    let translated =
        translator.translate(&prepared, &options.target_lang, options.source_lang.as_deref())?;
    let restored = real_to_newlines(&unguard(&translated));
    Ok(format_text_entry(&restored))
}

/// Translates every non-blank `<text>` of entries with an id.
///
/// Stops at the first error; the table may then be partially translated.
pub fn translate_table(
    table: &mut StringTable,
    translator: &dyn Translator,
    options: &TranslateOptions,
) -> Result<TranslationSummary, TranslateError> {
    let mut summary = TranslationSummary::default();
    for string in table.string_elements_mut() {
        let Some(id) = string.attribute(ID_ATTRIBUTE).map(str::to_string) else {
            log::warn!("Skipping entry without an id");
            continue;
        };
        let Some(value) = string
            .child_mut(TEXT_TAG)
            .and_then(|text| text.text.as_mut())
        else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }

        for issue in check_placeholders(value) {
            log::warn!("'{id}': {issue}");
            summary.placeholder_issues.push((id.clone(), issue));
        }
        *value = translate_text(value, translator, options)?;
        log::info!("Translated '{id}'");
        summary.translated.push(id);
    }
    Ok(summary)
}
