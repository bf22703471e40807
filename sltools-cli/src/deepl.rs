//! Blocking client for the DeepL translation API.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use sltools::{TranslateError, Translator};

pub const DEFAULT_ENDPOINT: &str = "https://api-free.deepl.com/v2/translate";

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
    #[serde(default)]
    detected_source_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

pub struct DeeplTranslator {
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
}

impl DeeplTranslator {
    pub fn new(api_key: String, endpoint: Option<String>) -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| format!("Cannot create HTTP client: {}", e))?;
        Ok(DeeplTranslator {
            client,
            api_key,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Form fields of one request. Language codes are sent upper-cased.
fn form_fields(text: &str, target_lang: &str, source_lang: Option<&str>) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("text", text.to_string()),
        ("target_lang", target_lang.to_uppercase()),
    ];
    if let Some(source) = source_lang {
        form.push(("source_lang", source.to_uppercase()));
    }
    form
}

/// Maps a response to the translated text or a [`TranslateError`].
fn interpret_response(status: StatusCode, body: &str) -> Result<String, TranslateError> {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(TranslateError::AccessDenied(format!("HTTP {status}")));
    }
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| "API request failed".to_string());
        return Err(TranslateError::Failed(format!("HTTP {status}: {message}")));
    }

    let response: TranslateResponse = serde_json::from_str(body)
        .map_err(|e| TranslateError::Failed(format!("unexpected response: {e}")))?;
    let translation = response
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| TranslateError::Failed("response holds no translation".to_string()))?;
    if let Some(lang) = &translation.detected_source_language {
        log::debug!("DeepL detected source language: {lang}");
    }
    Ok(translation.text)
}

impl Translator for DeeplTranslator {
    fn translate(
        &self,
        text: &str,
        target_lang: &str,
        source_lang: Option<&str>,
    ) -> Result<String, TranslateError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .form(&form_fields(text, target_lang, source_lang))
            .send()
            .map_err(|e| TranslateError::Failed(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| TranslateError::Failed(e.to_string()))?;
        interpret_response(status, &body)
    }
}
