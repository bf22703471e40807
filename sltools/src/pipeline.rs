//! Batch operations over many string table files.
//!
//! Every operation processes files sequentially, isolates failures per file
//! and returns a [`Report`]. `progress` is called once per file before it is
//! processed.

use std::{collections::BTreeMap, path::Path};

use serde::Serialize;

use crate::{
    codepage::{FileSource, read_document, write_document},
    error::Error,
    include::{IncludeResolver, has_includes},
    normalizer::Normalizer,
    parser::parse,
    placeholder::{PatternKind, analyze_patterns, check_placeholders},
    repair::check_declaration,
    report::{Issue, Report},
    translate::{TranslateOptions, Translator, translate_table},
    types::StringTable,
    writer::serialize,
};

/// Normalizes every file, rewriting those whose canonical form differs.
pub fn format_files<P, S>(
    files: &[P],
    normalizer: &Normalizer<S>,
    dry_run: bool,
    progress: &mut dyn FnMut(&Path),
) -> Report
where
    P: AsRef<Path>,
    S: FileSource,
{
    let mut report = Report::new();
    for path in files {
        let path = path.as_ref();
        progress(path);
        if let Err(err) = format_file(path, normalizer, dry_run, &mut report) {
            report.record_error(path, &err);
        }
    }
    report
}

fn format_file<S: FileSource>(
    path: &Path,
    normalizer: &Normalizer<S>,
    dry_run: bool,
    report: &mut Report,
) -> Result<(), Error> {
    let original = read_document(path)?;
    let normalized = normalizer.normalize(&original)?;

    report.record_all(
        path,
        normalized
            .corrections
            .iter()
            .map(|correction| Issue::notice(correction.to_string())),
    );
    report.record_all(path, normalized.issues);
    report.record_all(
        path,
        normalized
            .formatted_entries
            .iter()
            .map(|id| Issue::notice(format!("text of '{id}' was formatted"))),
    );

    if normalized.text == original {
        log::debug!("{} is already canonical", path.display());
        return Ok(());
    }
    if dry_run {
        report.record(path, Issue::notice("would be reformatted"));
    } else {
        write_document(path, &normalized.text)?;
        log::info!("Reformatted {}", path.display());
        report.record(path, Issue::notice("reformatted"));
    }
    Ok(())
}

/// Checks every file without modifying it.
///
/// Reports the declaration, use of `#include`, structural errors after
/// include expansion, ids repeated within the file and malformed placeholder
/// spans.
pub fn validate_files<P, S>(
    files: &[P],
    resolver: &IncludeResolver<S>,
    progress: &mut dyn FnMut(&Path),
) -> Report
where
    P: AsRef<Path>,
    S: FileSource,
{
    let mut report = Report::new();
    for path in files {
        let path = path.as_ref();
        progress(path);
        if let Err(err) = validate_file(path, resolver, &mut report) {
            report.record_error(path, &err);
        }
    }
    report
}

fn validate_file<S: FileSource>(
    path: &Path,
    resolver: &IncludeResolver<S>,
    report: &mut Report,
) -> Result<(), Error> {
    let text = read_document(path)?;

    if let Some(issue) = check_declaration(&text) {
        report.record(path, Issue::warning(Error::Declaration(issue).to_string()));
    }
    if has_includes(&text) {
        report.record(
            path,
            Issue::warning("uses the #include macro, the file is not valid XML until it is resolved"),
        );
    }

    let resolved = resolver.resolve(&text)?;
    report.record_all(
        path,
        resolved
            .failures
            .iter()
            .map(|err| Issue::warning(err.to_string())),
    );

    let table = parse(&resolved.text)?;
    report.record_all(path, repeated_ids(&table));
    report.record_all(path, placeholder_warnings(&table));
    Ok(())
}

fn repeated_ids(table: &StringTable) -> Vec<Issue> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in table.entries() {
        *counts.entry(entry.id).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, count)| Issue::warning(format!("id '{id}' is defined {count} times")))
        .collect()
}

fn placeholder_warnings(table: &StringTable) -> Vec<Issue> {
    let mut issues = Vec::new();
    for entry in table.entries() {
        let Some(text) = entry.text else { continue };
        for issue in check_placeholders(text) {
            issues.push(Issue::warning(format!("'{}': {issue}", entry.id)));
        }
    }
    issues
}

/// Translates every file in place.
///
/// Files are repaired and parsed through `normalizer` first. An access
/// denial from the service stops the batch: files already written stay
/// written and the remaining files are left untouched.
pub fn translate_files<P, S>(
    files: &[P],
    normalizer: &Normalizer<S>,
    translator: &dyn Translator,
    options: &TranslateOptions,
    dry_run: bool,
    progress: &mut dyn FnMut(&Path),
) -> Report
where
    P: AsRef<Path>,
    S: FileSource,
{
    let mut report = Report::new();
    for path in files {
        let path = path.as_ref();
        progress(path);
        match translate_file(path, normalizer, translator, options, dry_run, &mut report) {
            Ok(()) => {}
            Err(err) if err.is_fatal_for_batch() => {
                report.record_error(path, &err);
                report.abort(err.to_string());
                break;
            }
            Err(err) => report.record_error(path, &err),
        }
    }
    report
}

fn translate_file<S: FileSource>(
    path: &Path,
    normalizer: &Normalizer<S>,
    translator: &dyn Translator,
    options: &TranslateOptions,
    dry_run: bool,
    report: &mut Report,
) -> Result<(), Error> {
    let text = read_document(path)?;
    let mut prepared = normalizer.prepare(&text)?;
    report.record_all(
        path,
        prepared
            .corrections
            .iter()
            .map(|correction| Issue::notice(correction.to_string())),
    );
    report.record_all(path, prepared.issues);

    let summary = translate_table(&mut prepared.table, translator, options)
        .map_err(Error::Translation)?;
    report.record_all(
        path,
        summary
            .placeholder_issues
            .iter()
            .map(|(id, issue)| Issue::warning(format!("'{id}': {issue}"))),
    );
    if summary.translated.is_empty() {
        return Ok(());
    }

    let count = summary.translated.len();
    if dry_run {
        report.record(path, Issue::notice(format!("would translate {count} entries")));
    } else {
        write_document(path, &serialize(&prepared.table))?;
        log::info!("Translated {count} entries in {}", path.display());
        report.record(path, Issue::notice(format!("translated {count} entries")));
    }
    Ok(())
}

/// Counts of every distinct placeholder span, per kind, over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatternAnalysis {
    pub counts: BTreeMap<PatternKind, BTreeMap<String, usize>>,
    /// Malformed spans and files that could not be read.
    pub report: Report,
}

impl PatternAnalysis {
    fn merge(&mut self, counts: BTreeMap<PatternKind, BTreeMap<String, usize>>) {
        for (kind, matches) in counts {
            let merged = self.counts.entry(kind).or_default();
            for (span, count) in matches {
                *merged.entry(span).or_default() += count;
            }
        }
    }

    /// Plain-text listing, most frequent spans first within each kind.
    pub fn render(&self) -> String {
        if self.counts.is_empty() {
            return "No placeholder spans found.\n".to_string();
        }
        let mut out = String::new();
        for (kind, matches) in &self.counts {
            let total: usize = matches.values().sum();
            out.push_str(&format!("{} ({total}):\n", kind.as_str()));
            let mut sorted: Vec<_> = matches.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (span, count) in sorted {
                out.push_str(&format!("  {count:>6}  {span}\n"));
            }
        }
        out
    }
}

/// Collects placeholder statistics and malformed spans from every `<text>`.
pub fn analyze_files<P: AsRef<Path>>(files: &[P], progress: &mut dyn FnMut(&Path)) -> PatternAnalysis {
    let mut analysis = PatternAnalysis::default();
    for path in files {
        let path = path.as_ref();
        progress(path);
        let table = match read_document(path).and_then(|text| parse(&text).map_err(Error::from)) {
            Ok(table) => table,
            Err(err) => {
                analysis.report.record_error(path, &err);
                continue;
            }
        };
        for entry in table.entries() {
            let Some(text) = entry.text else { continue };
            analysis.merge(analyze_patterns(text));
        }
        analysis.report.record_all(path, placeholder_warnings(&table));
    }
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        include::IncludePolicy, normalizer::NormalizeOptions, report::Severity,
        translate::tests::ShoutingTranslator,
    };
    use indoc::indoc;
    use std::{fs, path::PathBuf};
    use tempfile::TempDir;

    const CLEAN: &str = indoc! {r#"
        <?xml version='1.0' encoding='WINDOWS-1251'?>
        <string_table>
            <string id="st_hello">
                <text>Hello</text>
            </string>
        </string_table>
    "#};

    fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn normalizer(dir: &TempDir) -> Normalizer {
        Normalizer::new(IncludeResolver::new(dir.path()), NormalizeOptions::default())
    }

    #[test]
    fn test_format_skips_canonical_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "clean.xml", CLEAN);
        let mut seen = Vec::new();
        let report = format_files(&[&path], &normalizer(&dir), false, &mut |p| {
            seen.push(p.to_path_buf())
        });
        assert!(report.is_empty());
        assert_eq!(seen, vec![path]);
    }

    #[test]
    fn test_format_rewrites_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "messy.xml",
            "<string_table><string id=\"a\"><text>A & B</text></string></string_table>",
        );
        let report = format_files(&[&path], &normalizer(&dir), false, &mut |_| {});

        assert!(!report.has_errors());
        let messages: Vec<_> = report.files[0].issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages.last(), Some(&"reformatted"));
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("<text>A &amp; B</text>"));
        assert!(written.starts_with("<?xml version='1.0' encoding='WINDOWS-1251'?>\n"));
    }

    #[test]
    fn test_format_dry_run_leaves_file() {
        let dir = tempfile::tempdir().unwrap();
        let original = "<string_table/>";
        let path = write(&dir, "a.xml", original);
        let report = format_files(&[&path], &normalizer(&dir), true, &mut |_| {});
        assert_eq!(report.files[0].issues.last().unwrap().message, "would be reformatted");
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_format_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write(&dir, "broken.xml", "<string_table><string id=\"a\">");
        let clean = write(&dir, "clean.xml", CLEAN);
        let report = format_files(&[&broken, &clean], &normalizer(&dir), false, &mut |_| {});
        assert_eq!(report.failed_files(), vec![broken.as_path()]);
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn test_validate_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let text = indoc! {r#"
            <string_table>
                <string id="a"><text>%c[ d_red]hot</text></string>
                <string id="a"><text>again</text></string>
            </string_table>
        "#};
        let path = write(&dir, "a.xml", text);
        let report = validate_files(&[&path], &IncludeResolver::new(dir.path()), &mut |_| {});

        let issues = &report.files[0].issues;
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
        assert!(issues[0].message.contains("declaration"));
        assert!(issues.iter().any(|i| i.message == "id 'a' is defined 2 times"));
        assert!(issues.iter().any(|i| i.message.starts_with("'a': ")));
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn test_validate_warns_about_includes_and_resolves_them() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "shared.xml", "<string id=\"s\"><text>x</text></string>\n");
        let path = write(
            &dir,
            "a.xml",
            "<?xml version='1.0' encoding='WINDOWS-1251'?>\n<string_table>\n#include \"shared.xml\"\n</string_table>\n",
        );
        let report = validate_files(&[&path], &IncludeResolver::new(dir.path()), &mut |_| {});
        assert_eq!(report.files[0].issues.len(), 1);
        assert!(report.files[0].issues[0].message.contains("#include"));
    }

    #[test]
    fn test_validate_advisory_include_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "a.xml",
            "<?xml version='1.0' encoding='WINDOWS-1251'?>\n<string_table>\n#include \"gone.xml\"\n</string_table>\n",
        );
        let fatal = validate_files(&[&path], &IncludeResolver::new(dir.path()), &mut |_| {});
        assert!(fatal.has_errors());

        let resolver = IncludeResolver::new(dir.path()).policy(IncludePolicy::Advisory);
        let advisory = validate_files(&[&path], &resolver, &mut |_| {});
        // the kept directive line is text content of the root, which parses
        assert!(!advisory.has_errors());
        assert!(advisory.files[0].issues.iter().any(|i| i.message.contains("gone.xml")));
    }

    #[test]
    fn test_translate_rewrites_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.xml", CLEAN);
        let report = translate_files(
            &[&path],
            &normalizer(&dir),
            &ShoutingTranslator::default(),
            &TranslateOptions::new("EN"),
            false,
            &mut |_| {},
        );
        assert!(!report.has_errors());
        assert_eq!(report.files[0].issues[0].message, "translated 1 entries");
        assert!(fs::read_to_string(&path).unwrap().contains("HELLO"));
    }

    #[test]
    fn test_translate_reports_repairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "a.xml",
            "<string_table><string id=\"a\"><text>Tom & Jerry</text></string></string_table>",
        );
        let report = translate_files(
            &[&path],
            &normalizer(&dir),
            &ShoutingTranslator::default(),
            &TranslateOptions::new("EN"),
            false,
            &mut |_| {},
        );
        assert!(!report.has_errors());
        let messages: Vec<_> = report.files[0].issues.iter().map(|i| i.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.starts_with("Misused '&', replaced with '&amp;'")));
        assert!(messages.iter().any(|m| m.starts_with("Replaced XML declaration")));
        assert_eq!(messages.last(), Some(&"translated 1 entries"));
        assert!(fs::read_to_string(&path).unwrap().contains("TOM &amp; JERRY"));
    }

    #[test]
    fn test_access_denied_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let first = write(&dir, "a.xml", CLEAN);
        let second = write(&dir, "b.xml", CLEAN);
        let third = write(&dir, "c.xml", CLEAN);
        let translator = ShoutingTranslator {
            deny_after: Some(1),
            ..Default::default()
        };
        let mut seen = Vec::new();
        let report = translate_files(
            &[&first, &second, &third],
            &normalizer(&dir),
            &translator,
            &TranslateOptions::new("EN"),
            false,
            &mut |p| seen.push(p.to_path_buf()),
        );

        assert!(report.aborted.is_some());
        assert_eq!(seen.len(), 2);
        assert!(fs::read_to_string(&first).unwrap().contains("HELLO"));
        assert_eq!(fs::read_to_string(&second).unwrap(), CLEAN);
        assert_eq!(fs::read_to_string(&third).unwrap(), CLEAN);
        assert_eq!(report.failed_files(), vec![second.as_path()]);
    }

    #[test]
    fn test_analyze_counts_spans_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(
            &dir,
            "a.xml",
            "<string_table><string id=\"a\"><text>%c[d_red]x %c[d_red]y $$ACTION_USE$$</text></string></string_table>",
        );
        let b = write(
            &dir,
            "b.xml",
            "<string_table><string id=\"b\"><text>%c[d_red] %s %c[-bad]</text></string></string_table>",
        );
        let analysis = analyze_files(&[&a, &b], &mut |_| {});

        assert_eq!(analysis.counts[&PatternKind::NamedColor]["%c[d_red]"], 3);
        assert_eq!(analysis.counts[&PatternKind::Action]["$$ACTION_USE$$"], 1);
        assert_eq!(analysis.counts[&PatternKind::StringPlaceholder]["%s"], 1);
        assert_eq!(analysis.report.files.len(), 1);
        assert_eq!(analysis.report.files[0].path, b);
        assert!(analysis.render().starts_with("named color (3):\n"));
    }
}
