use sltools::IncludeResolver;
use sltools::pipeline::validate_files;
use sltools_cli::expand_inputs;
use sltools_cli::validation::{ValidationContext, validate_context};

use crate::output::{ReportArgs, emit_report, progress_bar, tick};

/// Run the validate command. Files are never modified.
pub fn run_validate_command(
    paths: Vec<String>,
    resolver: IncludeResolver,
    report_args: ReportArgs,
) -> Result<bool, String> {
    validate_context(&ValidationContext::new().with_output_file(report_args.output.clone()))?;
    let files = expand_inputs(&paths)?;
    log::info!("Validating {} file(s)", files.len());

    let bar = progress_bar(files.len());
    let report = validate_files(&files, &resolver, &mut |path| tick(&bar, path));
    bar.finish_and_clear();

    emit_report(&report, "All files are valid.", &report_args)?;
    Ok(!report.has_errors())
}
