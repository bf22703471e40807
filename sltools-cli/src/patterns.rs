use sltools::pipeline::analyze_files;
use sltools_cli::expand_inputs;
use sltools_cli::validation::{ValidationContext, validate_context};

use crate::output::{ReportArgs, emit, progress_bar, tick};

/// Run the analyze-patterns command: span statistics plus malformed spans.
pub fn run_patterns_command(paths: Vec<String>, report_args: ReportArgs) -> Result<bool, String> {
    validate_context(&ValidationContext::new().with_output_file(report_args.output.clone()))?;
    let files = expand_inputs(&paths)?;
    log::info!("Analyzing patterns in {} file(s)", files.len());

    let bar = progress_bar(files.len());
    let analysis = analyze_files(&files, &mut |path| tick(&bar, path));
    bar.finish_and_clear();

    let text = if report_args.json {
        serde_json::to_string_pretty(&analysis).map_err(|e| e.to_string())?
    } else {
        let mut text = analysis.render();
        if !analysis.report.is_empty() {
            text.push('\n');
            text.push_str(&analysis.report.render(""));
        }
        text
    };
    emit(&text, &report_args)?;
    Ok(!analysis.report.has_errors())
}
