use indoc::indoc;
use sltools::codepage::{encode, read_document};
use sltools::duplicates::{self, DuplicateKind};
use sltools::pipeline::{format_files, validate_files};
use sltools::{IncludeResolver, NormalizeOptions, Normalizer, Severity};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_cp1251(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, encode(text)).unwrap();
    path
}

fn entries(pairs: &[(&str, &str)]) -> String {
    let mut xml = String::from("<?xml version='1.0' encoding='WINDOWS-1251'?>\n<string_table>\n");
    for (id, text) in pairs {
        xml.push_str(&format!(
            "    <string id=\"{id}\">\n        <text>{text}</text>\n    </string>\n"
        ));
    }
    xml.push_str("</string_table>\n");
    xml
}

#[test]
fn format_resolves_includes_from_base_dir_and_keeps_cyrillic() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("gamedata").join("configs");
    write_cp1251(
        &base,
        "text/shared.xml",
        "<string id=\"st_medkit\">\n<text>Аптечка</text>\n</string>\n",
    );
    let table = write_cp1251(
        tmp.path(),
        "st_items.xml",
        indoc! {r#"
            <string_table>
                #include "text\shared.xml"
                <string id="st_bandage"><text>Бинт & вата</text></string>
            </string_table>
        "#},
    );

    let normalizer = Normalizer::new(IncludeResolver::new(&base), NormalizeOptions::default());
    let report = format_files(&[&table], &normalizer, false, &mut |_| {});
    assert!(!report.has_errors(), "{}", report.render(""));

    let written = read_document(&table).unwrap();
    let expected = indoc! {r#"
        <?xml version='1.0' encoding='WINDOWS-1251'?>
        <string_table>
            <string id="st_medkit">
                <text>Аптечка</text>
            </string>
            <string id="st_bandage">
                <text>Бинт &amp; вата</text>
            </string>
        </string_table>
    "#};
    assert_eq!(written, expected);
    assert!(!written.contains("#include"));

    // A second pass finds nothing to do.
    let report = format_files(&[&table], &normalizer, false, &mut |_| {});
    assert!(report.is_empty(), "{}", report.render(""));
}

#[test]
fn validate_never_writes() {
    let tmp = TempDir::new().unwrap();
    let path = write_cp1251(tmp.path(), "broken.xml", "<string_table><!-- a -- b --></string_table>");
    let before = fs::read(&path).unwrap();

    let report = validate_files(&[&path], &IncludeResolver::new(tmp.path()), &mut |_| {});
    let issues = &report.files[0].issues;
    assert_eq!(issues.last().unwrap().severity, Severity::Error);
    assert!(issues.last().unwrap().message.contains("'--' within a comment"));
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn duplicates_across_mod_files() {
    let tmp = TempDir::new().unwrap();
    let a = write_cp1251(tmp.path(), "a.xml", &entries(&[("x", "hello"), ("y", "world")]));
    let b = write_cp1251(tmp.path(), "b.xml", &entries(&[("x", "hello"), ("z", "bye")]));
    let c = write_cp1251(tmp.path(), "c.xml", &entries(&[("z", "ciao")]));

    let index = duplicates::index(&[&a, &b, &c]);
    assert!(index.report.is_empty());

    let records = index.duplicates();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "x");
    assert_eq!(records[0].kind, DuplicateKind::Identical);
    assert_eq!(records[0].occurrences[0].line, 3);
    assert_eq!(records[1].id, "z");
    assert_eq!(records[1].kind, DuplicateKind::Conflicting);

    let report = duplicates::overlaps(&index);
    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["files"][0]["file"], b.to_str().unwrap());
    assert_eq!(json["files"][0]["total_matches"], 2);
    assert_eq!(json["files"][0]["overlaps"][0]["ids"][0], "x");
}
