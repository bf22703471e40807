use sltools::pipeline::translate_files;
use sltools::{IncludeResolver, NormalizeOptions, Normalizer, TranslateOptions};
use sltools_cli::config::{API_KEY_ENV, Config};
use sltools_cli::deepl::DeeplTranslator;
use sltools_cli::expand_inputs;
use sltools_cli::validation::{ValidationContext, validate_context};

use crate::output::{ReportArgs, emit_report, progress_bar, tick};

pub struct TranslateCommand {
    pub paths: Vec<String>,
    pub to: String,
    pub from: Option<String>,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub dry_run: bool,
    pub report: ReportArgs,
}

/// Run the translate command. An access denial stops the batch.
pub fn run_translate_command(
    cmd: TranslateCommand,
    resolver: IncludeResolver,
    config: &Config,
) -> Result<bool, String> {
    let endpoint = cmd.endpoint.or_else(|| config.deepl_endpoint.clone());
    let mut context = ValidationContext::new()
        .with_output_file(cmd.report.output.clone())
        .with_language_code(cmd.to.clone())
        .with_endpoint(endpoint.clone());
    if let Some(from) = &cmd.from {
        context = context.with_language_code(from.clone());
    }
    validate_context(&context)?;

    let api_key = config
        .api_key(cmd.api_key, std::env::var(API_KEY_ENV).ok())
        .ok_or_else(|| {
            format!(
                "No API key for the translation service. Pass --api-key, set {} or add deepl_api_key to the config file",
                API_KEY_ENV
            )
        })?;
    let files = expand_inputs(&cmd.paths)?;
    let translator = DeeplTranslator::new(api_key, endpoint)?;
    log::info!(
        "Translating {} file(s) to {} via {}",
        files.len(),
        cmd.to,
        translator.endpoint()
    );

    let mut options = TranslateOptions::new(cmd.to);
    if let Some(from) = cmd.from {
        options = options.from_lang(from);
    }
    let normalizer = Normalizer::new(resolver, NormalizeOptions::default());

    let bar = progress_bar(files.len());
    let report = translate_files(
        &files,
        &normalizer,
        &translator,
        &options,
        cmd.dry_run,
        &mut |path| tick(&bar, path),
    );
    bar.finish_and_clear();

    emit_report(&report, "Nothing was translated.", &cmd.report)?;
    Ok(!report.has_errors())
}
