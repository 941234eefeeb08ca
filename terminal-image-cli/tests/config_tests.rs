// ABOUTME: Tests for configuration file loading, validation, and merging
// ABOUTME: Tests TOML parsing, XDG path resolution, and hierarchical config merging

use serial_test::serial;
use tempfile::TempDir;
use terminal_image::Dimension;
use terminal_image_cli::config::{Config, DEFAULT_MAX_DOWNLOAD_SIZE};

#[test]
fn test_config_deserialize_complete() {
    let toml_content = r#"
        width = "50%"
        height = 20
        preserve_aspect_ratio = false
        prefer_native = false
        max_frame_rate = 24
        max_download_size = "5MB"
    "#;

    let config: Config = toml::from_str(toml_content).expect("Should parse valid TOML");

    assert_eq!(config.width, Some(Dimension::Percent(50.0)));
    assert_eq!(config.height, Some(Dimension::Cells(20)));
    assert_eq!(config.preserve_aspect_ratio, Some(false));
    assert_eq!(config.prefer_native, Some(false));
    assert_eq!(config.max_frame_rate, Some(24));
    assert_eq!(config.max_download_size, Some(5 * 1024 * 1024));
}

#[test]
fn test_config_deserialize_string_cells() {
    let config: Config = toml::from_str(r#"width = "40""#).expect("Should parse width string");
    assert_eq!(config.width, Some(Dimension::Cells(40)));
}

#[test]
fn test_config_deserialize_empty() {
    let config: Config = toml::from_str("").expect("Should parse empty TOML");

    assert_eq!(config, Config::default());
    assert_eq!(config.max_download_size(), DEFAULT_MAX_DOWNLOAD_SIZE);
}

#[test]
fn test_config_validation_errors() {
    let cases = [
        ("width = 0", "zero width"),
        (r#"width = "150%""#, "percentage above 100"),
        (r#"height = "tall""#, "non-numeric height"),
        ("max_frame_rate = 0", "zero frame rate"),
        ("max_frame_rate = 500", "frame rate above limit"),
        (r#"max_download_size = "lots""#, "unparseable size"),
    ];

    for (toml_content, description) in cases {
        let result: Result<Config, _> = toml::from_str(toml_content);
        assert!(result.is_err(), "Should reject {}", description);
    }
}

#[test]
fn test_config_merge_precedence() {
    let base_config = Config {
        width: Some(Dimension::Cells(30)),
        preserve_aspect_ratio: Some(false),
        max_frame_rate: Some(10),
        ..Default::default()
    };

    let override_config = Config {
        width: Some(Dimension::Percent(75.0)),
        prefer_native: Some(false),
        ..Default::default()
    };

    let merged = base_config.merge(override_config);

    // Override values should take precedence
    assert_eq!(merged.width, Some(Dimension::Percent(75.0)));
    assert_eq!(merged.prefer_native, Some(false));

    // Base values should be preserved when not overridden
    assert_eq!(merged.preserve_aspect_ratio, Some(false));
    assert_eq!(merged.max_frame_rate, Some(10));
}

#[test]
fn test_config_load_hierarchy() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let config_dir = temp_dir.path().join(".config").join("terminal-image");
    std::fs::create_dir_all(&config_dir).expect("Should create config dir");

    let user_config_path = config_dir.join("config.toml");
    std::fs::write(
        &user_config_path,
        r#"
        width = 40
        max_frame_rate = 12
    "#,
    )
    .expect("Should write user config");

    let project_config_path = temp_dir.path().join("terminal-image.toml");
    std::fs::write(
        &project_config_path,
        r#"
        width = "25%"
        prefer_native = false
    "#,
    )
    .expect("Should write project config");

    // Highest precedence first, matching get_config_paths
    let config = Config::load_from_paths(&[
        project_config_path.clone(),
        temp_dir.path().join("missing.toml"),
        user_config_path,
    ])
    .expect("Should load config hierarchy");

    // Project config should override user config
    assert_eq!(config.width, Some(Dimension::Percent(25.0)));
    assert_eq!(config.prefer_native, Some(false));

    // User config values should be preserved when not overridden
    assert_eq!(config.max_frame_rate, Some(12));
}

#[test]
fn test_broken_config_file_is_reported() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let path = temp_dir.path().join("terminal-image.toml");
    std::fs::write(&path, "max_frame_rate = 0").expect("Should write config");

    let err = Config::load_from_paths(&[path]).unwrap_err();
    assert!(format!("{:#}", err).contains("max_frame_rate"));
}

#[test]
#[serial]
fn test_config_xdg_paths() {
    let original = std::env::var_os("XDG_CONFIG_HOME");
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/xdg-test-home");
    }

    let paths = Config::get_config_paths();

    // Project config comes first
    assert!(paths[0].ends_with("terminal-image.toml"));
    assert!(
        paths
            .iter()
            .any(|p| p.starts_with("/tmp/xdg-test-home") && p.ends_with("terminal-image/config.toml"))
    );

    unsafe {
        match original {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }
}

#[test]
fn test_config_error_messages() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "width = 40\n[invalid").expect("Should write config");

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(
        err.to_string().contains("Failed to parse TOML"),
        "Error should mention TOML format issue"
    );
}
