use sltools::pipeline::format_files;
use sltools::{IncludeResolver, NormalizeOptions, Normalizer};
use sltools_cli::expand_inputs;
use sltools_cli::validation::{ValidationContext, validate_context};

use crate::output::{ReportArgs, emit_report, progress_bar, tick};

pub struct FormatOptions {
    pub paths: Vec<String>,
    pub fix: bool,
    pub format_text_entries: bool,
    pub dry_run: bool,
    pub report: ReportArgs,
}

/// Run the format command. Returns whether every file was processed.
pub fn run_format_command(opts: FormatOptions, resolver: IncludeResolver) -> Result<bool, String> {
    validate_context(&ValidationContext::new().with_output_file(opts.report.output.clone()))?;
    let files = expand_inputs(&opts.paths)?;
    log::info!("Formatting {} file(s)", files.len());

    let normalizer = Normalizer::new(
        resolver,
        NormalizeOptions {
            repair: opts.fix,
            format_text_entries: opts.format_text_entries,
        },
    );
    let bar = progress_bar(files.len());
    let report = format_files(&files, &normalizer, opts.dry_run, &mut |path| tick(&bar, path));
    bar.finish_and_clear();

    emit_report(&report, "No files required formatting.", &opts.report)?;
    Ok(!report.has_errors())
}
