#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const REFERENCE: &str = "../../fixtures/documenter/constrained-lasso.search_index.js";
const CANONICAL_JS: &str = "../../fixtures/documenter/canonical.search_index.js";
const CANONICAL_JSON: &str = "../../fixtures/json/canonical.search_index.json";
const INVALID: &str = "../../fixtures/json/invalid.search_index.json";

/// Run the binary with an isolated home directory and config file.
fn docindex(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docindex"))
        .env("HOME", home)
        .env_remove("DOCINDEX_CONFIG")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn check_accepts_reference_index() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["check", REFERENCE]);
    assert_success(&output);
    assert!(stdout(&output).contains("17 entries, 0 error(s)"));
}

#[test]
fn check_rejects_invalid_index() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["check", INVALID]);
    assert!(!output.status.success());

    let out = stdout(&output);
    assert!(out.contains("duplicate location (first seen at entry 1)"));
    assert!(out.contains("unknown category 'chapter'"));
    assert!(out.contains("page entry title 'Welcome' differs from page 'Home'"));
}

#[test]
fn check_json_report_lists_issue_kinds() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["check", "--json", INVALID]);
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["entries"], 4);
    let kinds: Vec<&str> = report["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"duplicate_location"));
    assert!(kinds.contains(&"unknown_category"));
    assert!(kinds.contains(&"page_title_mismatch"));
}

#[test]
fn fmt_check_passes_on_canonical_file() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["fmt", "--check", CANONICAL_JS]);
    assert_success(&output);
}

#[test]
fn fmt_converts_script_to_json() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["fmt", "--format", "json", CANONICAL_JS]);
    assert_success(&output);

    let produced: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let expected: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(CANONICAL_JSON).unwrap()).unwrap();
    assert_eq!(produced, expected);
}

#[test]
fn fmt_writes_script_that_reformats_identically() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("search_index.js");
    let out_str = out.to_str().unwrap();

    let output = docindex(home.path(), &["fmt", "--format", "js", "--out", out_str, CANONICAL_JSON]);
    assert_success(&output);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        std::fs::read_to_string(CANONICAL_JS).unwrap()
    );
}

#[test]
fn fmt_uses_configured_output_format() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    std::fs::write(&config, "[defaults]\noutput_format = \"json\"\n").unwrap();
    let config = config.to_str().unwrap();

    let output = docindex(home.path(), &["--config", config, "fmt", CANONICAL_JS]);
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.starts_with('{'), "expected JSON, got: {}", out.lines().next().unwrap_or(""));
    let produced: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(produced["docs"].as_array().unwrap().len(), 8);

    // --format still wins over the config
    let output = docindex(
        home.path(),
        &["--config", config, "fmt", "--format", "js", CANONICAL_JS],
    );
    assert_success(&output);
    assert!(stdout(&output).starts_with("var documenterSearchIndex = {\"docs\": ["));

    // --check compares against the file's own layout
    let output = docindex(home.path(), &["--config", config, "fmt", "--check", CANONICAL_JS]);
    assert_success(&output);
}

#[test]
fn fmt_out_creates_parent_directories() {
    let home = TempDir::new().unwrap();
    let out = home.path().join("build/html/search_index.js");

    let output = docindex(
        home.path(),
        &["fmt", "--out", out.to_str().unwrap(), CANONICAL_JS],
    );
    assert_success(&output);
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        std::fs::read_to_string(CANONICAL_JS).unwrap()
    );
}

#[test]
fn search_ranks_title_match_first() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["search", REFERENCE, "install"]);
    assert_success(&output);

    let out = stdout(&output);
    let first = out.lines().next().unwrap();
    assert!(first.contains("Installation"), "unexpected first hit: {first}");
    assert!(first.contains("index.html#Installation-1"));
}

#[test]
fn search_json_with_base_url() {
    let home = TempDir::new().unwrap();
    let output = docindex(
        home.path(),
        &[
            "search",
            REFERENCE,
            "lasso",
            "--limit",
            "2",
            "--json",
        ],
    );
    assert_success(&output);
    let hits: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(hits.as_array().unwrap().len(), 2);

    let output = docindex(
        home.path(),
        &[
            "search",
            REFERENCE,
            "install",
            "--base-url",
            "https://example.org/docs",
        ],
    );
    assert_success(&output);
    assert!(stdout(&output).contains("https://example.org/docs/index.html#Installation-1"));
}

#[test]
fn outline_lists_pages_and_sections() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["outline", CANONICAL_JS]);
    assert_success(&output);

    let out = stdout(&output);
    assert!(out.starts_with("Home (index.html)\n"));
    assert!(out.contains("  - Installation  #Installation-1\n"));
    assert!(out.contains("Example (demo/prostate.html)\n"));
}

#[test]
fn stats_json_counts_entries() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["stats", "--json", CANONICAL_JS]);
    assert_success(&output);

    let stats: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(stats["entries"], 8);
    assert_eq!(stats["pages"], 2);
    assert_eq!(stats["sections"], 6);
    assert!(stats["total_text_chars"].as_u64().unwrap() > 0);
    assert_eq!(stats["fingerprint"].as_str().unwrap().len(), 64);

    // Same entries in another layout share the fingerprint.
    let json_output = docindex(home.path(), &["stats", "--json", CANONICAL_JSON]);
    let json_stats: serde_json::Value = serde_json::from_str(&stdout(&json_output)).unwrap();
    assert_eq!(stats["fingerprint"], json_stats["fingerprint"]);
}

#[test]
fn diff_reports_added_entries() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["diff", CANONICAL_JS, REFERENCE]);
    assert_success(&output);

    let out = stdout(&output);
    assert!(out.contains("+ demo/tumor.html#"));
    assert!(out.lines().last().unwrap().contains("0 removed"));
}

#[test]
fn db_import_search_export_remove() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("test.db");
    let db = db.to_str().unwrap();

    let output = docindex(home.path(), &["db", "--db", db, "import", REFERENCE]);
    assert_success(&output);
    assert!(stdout(&output).contains("Imported 'constrained-lasso' (17 entries)"));

    let output = docindex(home.path(), &["db", "--db", db, "import", REFERENCE]);
    assert_success(&output);
    assert!(stdout(&output).contains("is up to date"));

    let output = docindex(home.path(), &["db", "--db", db, "list"]);
    assert_success(&output);
    assert!(stdout(&output).contains("constrained-lasso  17 entries"));

    let output = docindex(
        home.path(),
        &["db", "--db", db, "search", "constrained-lasso", "installation"],
    );
    assert_success(&output);
    assert!(stdout(&output).contains("index.html#Installation-1"));

    let exported = home.path().join("export.search_index.js");
    let output = docindex(
        home.path(),
        &[
            "db",
            "--db",
            db,
            "export",
            "constrained-lasso",
            "--out",
            exported.to_str().unwrap(),
        ],
    );
    assert_success(&output);
    let output = docindex(home.path(), &["check", exported.to_str().unwrap()]);
    assert_success(&output);

    let output = docindex(home.path(), &["db", "--db", db, "remove", "constrained-lasso"]);
    assert_success(&output);
    let output = docindex(home.path(), &["db", "--db", db, "remove", "constrained-lasso"]);
    assert!(!output.status.success());
}

#[test]
fn db_import_refuses_invalid_index_without_force() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("test.db");
    let db = db.to_str().unwrap();

    let output = docindex(home.path(), &["db", "--db", db, "import", INVALID]);
    assert!(!output.status.success());

    let output = docindex(
        home.path(),
        &["db", "--db", db, "import", "--force", "--name", "broken", INVALID],
    );
    assert_success(&output);
}

#[test]
fn config_init_then_show() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["config", "init"]);
    assert_success(&output);
    assert!(home.path().join(".docindex/docindex.toml").exists());

    let output = docindex(home.path(), &["config", "show"]);
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("[defaults]"));
    assert!(out.contains("title_boost = 3.0"));
}

#[test]
fn explicit_config_sets_search_limit() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    std::fs::write(&config, "[search]\nlimit = 1\n").unwrap();

    let output = docindex(
        home.path(),
        &["--config", config.to_str().unwrap(), "search", REFERENCE, "lasso", "--json"],
    );
    assert_success(&output);
    let hits: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(hits.as_array().unwrap().len(), 1);
}

#[test]
fn missing_file_fails() {
    let home = TempDir::new().unwrap();
    let output = docindex(home.path(), &["stats", "no/such/search_index.js"]);
    assert!(!output.status.success());
}
