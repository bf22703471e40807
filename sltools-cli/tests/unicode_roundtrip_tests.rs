use sltools::codepage::{encode, read_document};
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn slt_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("slt"));
    cmd.env_remove("DEEPL_API_KEY");
    cmd
}

#[test]
fn test_format_keeps_windows_1251_text() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let path = temp_dir.path().join("st_items_rus.xml");
    let source = "<string_table><string id=\"st_medkit\"><text>Аптечка & бинт</text></string></string_table>";
    fs::write(&path, encode(source)).unwrap();

    let output = slt_cmd()
        .args(["--config", config.to_str().unwrap(), "format", "--fix"])
        .arg(&path)
        .output()
        .expect("Failed to execute command");
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // Still windows-1251 on disk, not UTF-8.
    let bytes = fs::read(&path).unwrap();
    assert!(String::from_utf8(bytes).is_err());
    let text = read_document(&path).unwrap();
    assert!(text.contains("<text>Аптечка &amp; бинт</text>"));
}

#[test]
fn test_characters_outside_the_codepage_become_references() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let path = temp_dir.path().join("st_ui.xml");
    fs::write(
        &path,
        encode("<string_table><string id=\"st_star\"><text>Звезда ★</text></string></string_table>"),
    )
    .unwrap();

    let output = slt_cmd()
        .args(["--config", config.to_str().unwrap(), "format", "--fix"])
        .arg(&path)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let text = read_document(&path).unwrap();
    assert!(text.contains("Звезда &#9733;"));
}
