// ABOUTME: Integration tests for the larkcopy CLI binary.
// ABOUTME: Tests HTML file input, stdin text, output formats and settings handling.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn larkcopy_cmd() -> Command {
    Command::cargo_bin("larkcopy").unwrap()
}

#[test]
fn editor_markup_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = temp_dir.path().join("selection.html");
    fs::write(
        &html_path,
        r#"<p class="doc-line">Hello <span class="lark-text-bold" data-lark-id="1">world</span></p>"#,
    )
    .unwrap();

    larkcopy_cmd()
        .arg("--html")
        .arg(&html_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("<p>Hello <strong>world</strong></p>"))
        .stdout(predicate::str::contains("lark").not());
}

#[test]
fn stdin_list_lines_become_list() {
    assert_cmd::Command::cargo_bin("larkcopy")
        .unwrap()
        .write_stdin("- apples\n- pears\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("<ul><li>apples</li><li>pears</li></ul>"));
}

#[test]
fn text_and_rtf_formats() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = temp_dir.path().join("s.html");
    fs::write(&html_path, "<p><em>one</em></p><p>two</p>").unwrap();

    larkcopy_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("-f")
        .arg("text")
        .assert()
        .success()
        .stdout("one\ntwo\n");

    larkcopy_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("--format")
        .arg("rtf")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(r"{\rtf1"))
        .stdout(predicate::str::contains(r"{\i "));
}

#[test]
fn json_output_lists_formats() {
    let output = larkcopy_cmd()
        .arg("--text")
        .arg("plain words")
        .arg("-f")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["kind"], "text");
    assert_eq!(value["chars"], 11);
    assert_eq!(value["html"], "<p>plain words</p>");
    assert_eq!(value["rtf"], serde_json::Value::Null);
    assert_eq!(
        value["formats"],
        serde_json::json!(["text/html", "text/plain"])
    );
}

#[test]
fn no_preserve_format_and_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = temp_dir.path().join("s.html");
    let out_path = temp_dir.path().join("out.html");
    fs::write(&html_path, "<b>bold</b> text").unwrap();

    larkcopy_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("--no-preserve-format")
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&out_path).unwrap(), "<p>bold text</p>");
}

#[test]
fn disabled_settings_skip_output() {
    let temp_dir = TempDir::new().unwrap();
    let settings = temp_dir.path().join("settings.json");
    fs::write(&settings, r#"{"enabled": false}"#).unwrap();

    larkcopy_cmd()
        .arg("--text")
        .arg("x")
        .arg("--settings")
        .arg(&settings)
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("disabled"));
}

#[test]
fn missing_html_file_fails() {
    larkcopy_cmd()
        .arg("--html")
        .arg("/nonexistent/selection.html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading file"));
}
