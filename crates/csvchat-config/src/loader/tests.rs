//! Tests for layered configuration loading.

use super::*;
use crate::{ReplyMode, ThemeMode};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Build a project layout (`root/project/.git`, cwd `root/project/subdir`).
fn project_layout(root: &Path) -> (PathBuf, PathBuf) {
    let project_root = root.join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    (project_root, cwd)
}

fn isolated_options(cwd: &Path) -> LayeredConfigOptions {
    let mut options = LayeredConfigOptions::new(cwd);
    options.user_config_path = None;
    options.requirements_path = None;
    options
}

#[test]
fn parse_minimal_config() {
    let config = CsvChatConfig::load_from_str("{}").expect("config");
    assert_eq!(config.api.endpoint, crate::DEFAULT_ENDPOINT);
    assert!(config.api.send_session_id);
    assert_eq!(config.reply.mode, ReplyMode::Api);
    assert_eq!(config.reply.simulated_delay_ms, 1500);
    assert_eq!(config.reply.simulated_text, "on it");
    assert_eq!(config.ui.mobile_breakpoint, 100);
    assert_eq!(config.ui.theme, ThemeMode::Dark);
    assert!(!config.files.is_complete());
}

#[test]
fn parses_json5_with_comments_and_files() {
    let json5 = r#"{
        // local sample data
        files: { payers: "data/payers.csv", transactions: "data/tx.csv" },
        reply: { mode: "simulated", simulated_delay_ms: 10 },
        ui: { theme: "light", seed_demo: true },
    }"#;
    let config = CsvChatConfig::load_from_str(json5).expect("config");
    assert!(config.files.is_complete());
    assert_eq!(
        config.files.payers.as_deref(),
        Some(Path::new("data/payers.csv"))
    );
    assert_eq!(config.reply.mode, ReplyMode::Simulated);
    assert_eq!(config.reply.simulated_delay_ms, 10);
    assert_eq!(config.ui.theme, ThemeMode::Light);
    assert!(config.ui.seed_demo);
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = CsvChatConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_invalid_reply_mode() {
    let err = CsvChatConfig::load_from_str(r#"{ reply: { mode: "psychic" } }"#).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("reply.mode"));
    assert!(msg.contains("api, simulated"));
}

#[test]
fn rejects_wrong_field_type() {
    let err = CsvChatConfig::load_from_str(r#"{ ui: { mobile_breakpoint: "wide" } }"#).unwrap_err();
    assert!(format!("{err}").contains("ui.mobile_breakpoint"));
}

#[test]
fn rejects_non_http_endpoint() {
    let err = CsvChatConfig::load_from_str(r#"{ api: { endpoint: "ftp://example" } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("api.endpoint"));
}

#[test]
fn layered_config_prefers_cwd_over_project_and_user() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (project_root, cwd) = project_layout(root);

    let user_config = root.join("user.json5");
    write_json5(&user_config, r#"{ ui: { user_name: "user", theme: "light" } }"#);
    write_json5(
        &project_root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        r#"{ ui: { user_name: "project" } }"#,
    );
    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ ui: { user_name: "cwd" } }"#,
    );

    let mut options = isolated_options(&cwd);
    options.user_config_path = Some(user_config);

    let layered = CsvChatConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.ui.user_name.as_deref(), Some("cwd"));
    assert_eq!(layered.config.ui.theme, ThemeMode::Light);
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd
        ]
    );
}

#[test]
fn requirements_lock_overrides() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (_, cwd) = project_layout(root);

    let requirements = root.join("requirements.json5");
    write_json5(
        &requirements,
        r#"{ api: { endpoint: "https://internal.example/query" } }"#,
    );
    let runtime_config = root.join("runtime.json5");
    write_json5(
        &runtime_config,
        r#"{ api: { endpoint: "https://elsewhere.example/query", send_session_id: false } }"#,
    );

    let mut options = isolated_options(&cwd).with_runtime_path(&runtime_config);
    options.requirements_path = Some(requirements);

    let layered = CsvChatConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.api.endpoint, "https://internal.example/query");
    assert!(!layered.config.api.send_session_id);
}

#[test]
fn pinned_endpoint_survives_flag_overrides() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (_, cwd) = project_layout(root);

    let requirements = root.join("requirements.json5");
    write_json5(&requirements, r#"{ api: { endpoint: "https://corp.example/q" } }"#);

    let mut options = isolated_options(&cwd)
        .with_overrides(serde_json::json!({ "api": { "endpoint": "http://elsewhere.example/q" } }))
        .with_overrides(serde_json::json!({ "ui": { "user_name": "dana" } }));
    options.requirements_path = Some(requirements);

    let layered = CsvChatConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.api.endpoint, "https://corp.example/q");
    assert_eq!(layered.config.ui.user_name.as_deref(), Some("dana"));
}

#[test]
fn overrides_beat_files_without_requirements() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path();
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), r#"{ reply: { mode: "api" } }"#);

    let options = isolated_options(cwd)
        .with_overrides(serde_json::json!({ "reply": { "mode": "simulated" } }));
    let layered = CsvChatConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.reply.mode, ReplyMode::Simulated);
}

#[test]
fn invalid_override_is_rejected() {
    let temp = TempDir::new().expect("tmp");
    let options =
        isolated_options(temp.path()).with_overrides(serde_json::json!({ "ui": { "theme": "neon" } }));
    let err = CsvChatConfig::load_layered_with_options(options).unwrap_err();
    assert!(format!("{err}").contains("overrides:ui.theme"));
}

#[test]
fn explicit_nulls_fall_back_to_defaults() {
    let config =
        CsvChatConfig::load_from_str("{ api: { endpoint: null }, ui: { mobile_breakpoint: null } }")
            .expect("config");
    let defaults = CsvChatConfig::default();
    assert_eq!(config.api.endpoint, defaults.api.endpoint);
    assert_eq!(config.ui.mobile_breakpoint, defaults.ui.mobile_breakpoint);
}

#[test]
fn null_in_higher_layer_resets_lower_value() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (project_root, cwd) = project_layout(root);

    write_json5(
        &project_root.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILE),
        r#"{ ui: { theme: "light", mobile_breakpoint: 60 } }"#,
    );
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), r#"{ ui: { theme: null } }"#);

    let layered = CsvChatConfig::load_layered_with_options(isolated_options(&cwd)).expect("layered");
    assert_eq!(layered.config.ui.theme, ThemeMode::default());
    assert_eq!(layered.config.ui.mobile_breakpoint, 60);
}

#[test]
fn runtime_override_wins_without_constraints() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (_, cwd) = project_layout(root);

    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        r#"{ reply: { mode: "api" } }"#,
    );
    let runtime_config = root.join("runtime.json5");
    write_json5(&runtime_config, r#"{ reply: { mode: "simulated" } }"#);

    let options = isolated_options(&cwd).with_runtime_path(&runtime_config);
    let layered = CsvChatConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.reply.mode, ReplyMode::Simulated);
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options = isolated_options(temp.path()).with_runtime_path(temp.path().join("nope.json5"));
    let err = CsvChatConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn invalid_layer_names_its_source() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path();
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), r#"{ ui: { seed_demo: "yes" } }"#);

    let err = CsvChatConfig::load_layered_with_options(isolated_options(cwd)).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("ui.seed_demo"));
}
