use sltools::duplicates::{self, DuplicateRecord, OverlapReport};
use sltools_cli::expand_inputs;
use sltools_cli::validation::{ValidationContext, validate_context};

use crate::output::{ReportArgs, emit};

/// Run the find-duplicates command.
///
/// The default view is per file: which other files override its ids. With
/// `per_string` every duplicated id is listed with each definition.
pub fn run_duplicates_command(
    paths: Vec<String>,
    per_string: bool,
    report_args: ReportArgs,
) -> Result<bool, String> {
    validate_context(&ValidationContext::new().with_output_file(report_args.output.clone()))?;
    let files = expand_inputs(&paths)?;
    log::info!("Looking for duplicate ids in {} file(s)", files.len());

    let index = duplicates::index(&files);
    log::info!(
        "Indexed {} distinct id(s) from {} file(s)",
        index.id_count(),
        index.files().len()
    );

    let text = if per_string {
        let records = index.duplicates();
        if report_args.json {
            serde_json::to_string_pretty(&records).map_err(|e| e.to_string())?
        } else {
            render_per_string(&records)
        }
    } else {
        let overlaps = duplicates::overlaps(&index);
        if report_args.json {
            serde_json::to_string_pretty(&overlaps).map_err(|e| e.to_string())?
        } else {
            render_per_file(&overlaps)
        }
    };
    emit(&text, &report_args)?;

    if !index.report.is_empty() {
        eprint!("{}", index.report.render(""));
    }
    Ok(!index.report.has_errors())
}

fn render_per_string(records: &[DuplicateRecord]) -> String {
    if records.is_empty() {
        return "No duplicates found.".to_string();
    }
    let mut out = String::new();
    for record in records {
        out.push_str(&format!(
            "'{}' is defined in {} files ({}):\n",
            record.id,
            record.occurrences.len(),
            record.kind.as_str()
        ));
        for (i, occurrence) in record.occurrences.iter().enumerate() {
            out.push_str(&format!(
                "  #{} {}, line {}: {}\n",
                i + 1,
                occurrence.file.display(),
                occurrence.line,
                occurrence.text
            ));
        }
    }
    out
}

fn render_per_file(report: &OverlapReport) -> String {
    if report.is_empty() {
        return "No duplicates found.".to_string();
    }
    let mut out = String::new();
    for (i, file) in report.files.iter().enumerate() {
        out.push_str(&format!(
            "file #{}: {} (total ids: {})\n",
            i + 1,
            file.file.display(),
            file.total_ids
        ));
        for overlap in &file.overlaps {
            out.push_str(&format!(
                "  {}: {}/{} overlapping ids ({:.2}%)\n",
                overlap.file.display(),
                overlap.match_count,
                overlap.other_total,
                overlap.percentage()
            ));
            for id in &overlap.ids {
                out.push_str(&format!("      {id}\n"));
            }
        }
    }
    out
}
