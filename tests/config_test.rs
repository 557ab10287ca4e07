//! Integration tests for Settings loading with layered merge semantics.
//!
//! Merge Semantics:
//! - Defaults → Global → Local: scalars REPLACE when set
//! - Ring lists: REPLACE as a whole, never merged element-wise
//!
//! Note: These tests run with temp directories only and never set
//! ORBITMAP__* variables, so env overrides stay out of the picture.

use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;

use orbitmap::application::ApplicationError;
use orbitmap::config::{document_dir, RawSettings, Settings, LOCAL_CONFIG_FILE};
use orbitmap::domain::RingTier;

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================
// Layered loading
// ============================================================

#[test]
fn given_ring_list_in_file_when_load_file_then_replaces_default_rings() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "orbitmap.toml",
        r#"
[layout.primary]
rings = [{ radius = 150.0, slots = 4 }]

[limits]
root = 3
"#,
    );

    // Act
    let settings = Settings::load_file(&path).expect("load");

    // Assert
    assert_eq!(settings.layout.primary.rings, vec![RingTier::new(150.0, 4)]);
    assert_eq!(settings.layout.primary.increment, 100.0);
    assert_eq!(settings.layout.secondary, Settings::default().layout.secondary);
    assert_eq!(settings.limits.root, 3);
    assert_eq!(settings.limits.primary, 5);
}

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        LOCAL_CONFIG_FILE,
        r#"
nodes_file = "~/maps/org.json"

[viewport]
width = 1000.0

[layout]
max_rings = 4
"#,
    );

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load");

    // Assert
    assert_eq!(settings.layout.max_rings, Some(4));
    assert_eq!(settings.viewport.width, 1000.0);
    assert_eq!(settings.viewport.height, 800.0);
    assert_eq!(settings.layout_config().center.x, 500.0);
    let nodes_file = settings.nodes_file.to_string_lossy();
    assert!(!nodes_file.contains('~'), "tilde should be expanded: {nodes_file}");
    assert!(nodes_file.ends_with("maps/org.json"));
}

#[test]
fn given_document_path_when_for_document_then_local_config_from_its_directory() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let maps = dir.path().join("maps");
    fs::create_dir_all(&maps).unwrap();
    fs::write(
        maps.join(LOCAL_CONFIG_FILE),
        "nodes_file = \"elsewhere.json\"\n\n[layout]\nmax_rings = 3\n",
    )
    .unwrap();
    let document = maps.join("org.json");

    // Act
    let (settings, path) = Settings::for_document(Some(&document)).expect("load");

    // Assert
    assert_eq!(path, document);
    assert_eq!(settings.layout.max_rings, Some(3));
}

#[rstest]
#[case("maps/org.json", "maps")]
#[case("org.json", ".")]
#[case("/srv/org.json", "/srv")]
fn given_document_when_document_dir_then_parent_or_cwd(#[case] document: &str, #[case] expected: &str) {
    assert_eq!(document_dir(&PathBuf::from(document)), PathBuf::from(expected));
}

#[test]
fn given_no_local_config_when_load_then_defaults() {
    let dir = TempDir::new().unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load");

    assert_eq!(settings.layout.tolerance, 0.5);
    assert_eq!(settings.layout.max_rings, None);
}

#[test]
fn given_invalid_toml_when_load_file_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "orbitmap.toml", "[layout\nmax_rings = ");

    let result = Settings::load_file(&path);

    assert!(matches!(result, Err(ApplicationError::Config { message }) if message.contains("parse")));
}

// ============================================================
// Validation
// ============================================================

#[rstest]
#[case("[layout]\ntolerance = 0.0\n", "tolerance")]
#[case("[layout]\nmax_rings = 0\n", "max_rings")]
#[case("[viewport]\nwidth = 0.0\n", "viewport")]
#[case("[layout.tertiary]\nrings = []\n", "tertiary")]
#[case("[layout]\ntolerance = 20.0\n", "increment")]
#[case("[layout.secondary]\nincrement = -5.0\n", "secondary")]
fn given_unusable_value_when_load_file_then_rejected(#[case] content: &str, #[case] needle: &str) {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "orbitmap.toml", content);

    // Act
    let result = Settings::load_file(&path);

    // Assert
    match result {
        Err(ApplicationError::Config { message }) => {
            assert!(message.contains(needle), "{message} should mention {needle}")
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

// ============================================================
// Serialization
// ============================================================

#[test]
fn given_effective_settings_when_to_toml_then_reloads_to_same_settings() {
    let mut settings = Settings::default();
    settings.layout.max_rings = Some(6);
    settings.limits.root = 10;

    let text = settings.to_toml().expect("toml");
    let raw: RawSettings = toml::from_str(&text).expect("parse");

    assert_eq!(Settings::default().merge_with(&raw), settings);
}

#[test]
fn given_template_when_written_then_loads_as_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "orbitmap.toml", &Settings::template());

    let settings = Settings::load_file(&path).expect("load");

    assert_eq!(settings.layout, Settings::default().layout);
    assert_eq!(settings.limits, Settings::default().limits);
}
