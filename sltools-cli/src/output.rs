use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use sltools::Report;
use sltools_cli::validation::validate_output_path;

/// Where and how a command prints its result.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

/// A per-file progress bar on stderr, hidden when stderr is not a terminal.
pub fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    bar.set_style(style);
    bar
}

/// Advances `bar` for the file about to be processed.
pub fn tick(bar: &ProgressBar, path: &Path) {
    bar.set_message(path.display().to_string());
    bar.inc(1);
}

/// Writes `text` to the output file or stdout, ending it with a newline.
pub fn emit(text: &str, args: &ReportArgs) -> Result<(), String> {
    let mut text = text.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    match &args.output {
        Some(path) => {
            validate_output_path(path)?;
            std::fs::write(path, text)
                .map_err(|e| format!("Error writing to {}: {}", path, e))?;
            log::info!("Report written to {}", path);
        }
        None => print!("{text}"),
    }
    Ok(())
}

/// Emits a report, rendered or as JSON.
pub fn emit_report(report: &Report, nothing_to_do: &str, args: &ReportArgs) -> Result<(), String> {
    let text = if args.json {
        report.to_json().map_err(|e| e.to_string())?
    } else {
        report.render(nothing_to_do)
    };
    emit(&text, args)
}
