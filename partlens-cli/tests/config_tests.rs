// ABOUTME: Tests for configuration file loading, validation, and merging
// ABOUTME: Tests TOML parsing, XDG path resolution, and hierarchical config precedence

use partlens_cli::config::{Config, ConfigImages};
use serial_test::serial;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_deserialize_complete() {
    let toml_content = r#"
        model = "gpt-4o"
        temperature = 0.4
        max_tokens = 1024
        api_url = "http://localhost:8080/v1/chat/completions"
        persona = "You are a pressroom mechanic."
        analysis = "Name the part."
        debug = true

        [images]
        max_dimension = 1024
        quality = 0.7
        byte_budget = 800000
        worker_timeout_ms = 5000
    "#;

    let config: Config = toml::from_str(toml_content).expect("Should parse valid TOML");

    assert_eq!(config.model(), "gpt-4o");
    assert_eq!(config.temperature(), 0.4);
    assert_eq!(config.max_tokens(), 1024);
    assert_eq!(config.persona(), "You are a pressroom mechanic.");
    assert_eq!(config.analysis(), "Name the part.");
    assert!(config.debug());
    assert_eq!(
        config.images,
        Some(ConfigImages {
            max_dimension: Some(1024),
            quality: Some(0.7),
            byte_budget: Some(800_000),
            worker_timeout_ms: Some(5_000),
        })
    );
}

#[test]
fn test_config_deserialize_empty() {
    let config: Config = toml::from_str("").expect("Should parse empty TOML");
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_validation_errors() {
    let cases = [
        "temperature = 2.5",
        "temperature = -0.1",
        "max_tokens = 0",
        "[images]\nquality = 0.0",
        "[images]\nquality = 1.5",
        "temperature = \"hot\"",
    ];

    for toml_content in cases {
        let result: Result<Config, _> = toml::from_str(toml_content);
        assert!(result.is_err(), "Should reject: {toml_content}");
    }
}

#[test]
fn test_load_from_paths_precedence() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let user_path = temp_dir.path().join("user.toml");
    let project_path = temp_dir.path().join("project.toml");

    std::fs::write(
        &user_path,
        "model = \"gpt-4o\"\ntemperature = 0.3\n[images]\nmax_dimension = 900\n",
    )
    .unwrap();
    std::fs::write(&project_path, "model = \"o3-mini\"\n[images]\nquality = 0.6\n").unwrap();

    let missing = temp_dir.path().join("missing.toml");
    let config = Config::load_from_paths(&[
        missing.to_str().unwrap(),
        user_path.to_str().unwrap(),
        project_path.to_str().unwrap(),
    ])
    .expect("Should load configs");

    assert_eq!(config.model(), "o3-mini");
    assert_eq!(config.temperature(), 0.3);

    let compression = config.ingest_config().compression.unwrap();
    assert_eq!(compression.max_dimension, 900);
    assert_eq!(compression.initial_quality, 0.6);
}

#[test]
fn test_invalid_file_is_an_error() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "temperature = [").unwrap();

    let err = Config::load_from_paths(&[path.to_str().unwrap()]).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse TOML config file"));
}

#[test]
fn test_ingest_defaults_without_images_section() {
    let ingest = Config::default().ingest_config();
    let compression = ingest.compression.unwrap();

    assert_eq!(ingest.worker_timeout, Duration::from_secs(10));
    assert_eq!(compression.max_dimension, 1280);
    assert_eq!(compression.byte_budget, 1_500_000);
}

#[test]
#[serial]
fn test_xdg_config_home_is_searched() {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    let config_dir = temp_dir.path().join("partlens");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "max_tokens = 77\n").unwrap();

    let paths = Config::get_config_paths();
    let expected = config_dir.join("config.toml").to_string_lossy().to_string();
    assert!(paths.contains(&expected));
    assert!(paths.last().unwrap().ends_with("partlens.toml"));

    let config = Config::load_from_paths(&[expected.as_str()]).unwrap();
    assert_eq!(config.max_tokens(), 77);

    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
}
