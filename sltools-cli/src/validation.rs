use std::path::Path;
use unic_langid::LanguageIdentifier;

/// Up-front checks for a command, run before any file is touched.
#[derive(Debug, Default)]
pub struct ValidationContext {
    pub output_file: Option<String>,
    pub language_codes: Vec<String>,
    pub endpoint: Option<String>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_file(mut self, file: Option<String>) -> Self {
        self.output_file = file;
        self
    }

    pub fn with_language_code(mut self, lang: String) -> Self {
        self.language_codes.push(lang);
        self
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint;
        self
    }
}

/// Validate output directory exists or can be created
pub fn validate_output_path(path: &str) -> Result<(), String> {
    let path_obj = Path::new(path);

    if path_obj.is_dir() {
        return Err(format!("Output path is a directory: {}", path));
    }

    if let Some(parent) = path_obj.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Cannot create output directory: {}", e))?;
        }
    }

    Ok(())
}

/// Validate a translation service language code such as `RU`, `en` or `PT-BR`.
pub fn validate_language_code(lang: &str) -> Result<(), String> {
    if lang.is_empty() {
        return Err("Language code cannot be empty".to_string());
    }

    let invalid = || {
        format!(
            "Invalid language code format: {}. Expected a language like EN, RU or PT-BR",
            lang
        )
    };
    let lang_id = lang.parse::<LanguageIdentifier>().map_err(|_| invalid())?;
    // Service codes use two or three letter languages; "und" names none.
    if lang_id.language.is_empty() || !(2..=3).contains(&lang_id.language.as_str().len()) {
        return Err(invalid());
    }
    Ok(())
}

/// Validate a translation endpoint URL
pub fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        Ok(())
    } else {
        Err(format!(
            "Invalid endpoint: {}. Expected an http:// or https:// URL",
            endpoint
        ))
    }
}

/// Validate a complete validation context
pub fn validate_context(context: &ValidationContext) -> Result<(), String> {
    if let Some(ref output) = context.output_file {
        validate_output_path(output).map_err(|e| format!("Output validation failed: {}", e))?;
    }

    for lang in &context.language_codes {
        validate_language_code(lang)
            .map_err(|e| format!("Language code validation failed: {}", e))?;
    }

    if let Some(ref endpoint) = context.endpoint {
        validate_endpoint(endpoint)?;
    }

    Ok(())
}
