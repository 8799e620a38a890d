//! Integration tests for template configuration loading
//!
//! Tests verify that:
//! - A config file on disk loads with defaults for missing keys
//! - A missing file is an I/O error, not a panic
//! - Taxonomy categories from the file drive MemeStack decisions

use segcraft_common::meme::MemeStack;
use segcraft_common::{Error, TemplateConfig};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_from_file_fills_defaults() {
    let file = write_config("tempo_min = 90.0\ntempo_max = 150.0\n");

    let config = TemplateConfig::load(file.path()).unwrap();
    assert_eq!(config.tempo_min, 90.0);
    assert_eq!(config.tempo_max, 150.0);
    assert_eq!(config.main_program_length_max_delta, 280);
    assert!(config.sticky_bun_enabled);
    assert_eq!(config.buffer_ahead_seconds, 180);
    assert_eq!(config.buffer_before_seconds, 5);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TemplateConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_load_invalid_file_is_rejected() {
    let file = write_config("tempo_min = -5.0\n");
    let err = TemplateConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_taxonomy_from_file_gates_memes() {
    let file = write_config(
        r#"
sticky_bun_enabled = false

[[meme_taxonomy]]
name = "SEASON"
memes = ["Winter", "Summer"]
"#,
    );

    let config = TemplateConfig::load(file.path()).unwrap();
    assert!(!config.sticky_bun_enabled);

    let stack = MemeStack::from(&config.meme_taxonomy, ["WINTER"]);
    assert!(!stack.is_allowed(["summer"]));
    assert!(stack.is_allowed(["cozy"]));
}
