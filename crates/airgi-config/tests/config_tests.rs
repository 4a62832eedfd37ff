// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the AIRGI configuration system.

use airgi_config::diagnostic::ConfigError;
use std::path::Path;

use airgi_config::loader::search_paths;
use airgi_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use airgi_core::types::Role;

#[test]
fn valid_toml_deserializes_into_airgi_config() {
    let toml = r#"
[app]
name = "airgi-test"
log_level = "debug"

[assistant]
api_key = "key-123"
model = "gemini-test"
base_url = "http://localhost:9999"
open_timeout_secs = 5
turn_timeout_secs = 10

[intake]
max_attachment_bytes = 1048576
allowed_mime_types = ["image/png", "text/plain"]
title_fallback_chars = 30
save_timeout_secs = 3

[storage]
database_path = "/tmp/airgi-test.db"
wal_mode = false

[identity]
user_id = "u-1"
name = "Ana"
email = "ana@example.com"
role = "admin"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.app.name, "airgi-test");
    assert_eq!(config.assistant.api_key.as_deref(), Some("key-123"));
    assert_eq!(config.assistant.model, "gemini-test");
    assert_eq!(config.assistant.turn_timeout_secs, 10);
    assert_eq!(config.intake.max_attachment_bytes, 1_048_576);
    assert_eq!(config.intake.allowed_mime_types, vec!["image/png", "text/plain"]);
    assert_eq!(config.intake.title_fallback_chars, 30);
    assert_eq!(config.storage.database_path, "/tmp/airgi-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.identity.user_id.as_deref(), Some("u-1"));
    assert_eq!(config.identity.role, Role::Admin);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.app.name, "airgi");
    assert_eq!(config.intake.max_attachment_bytes, 5 * 1024 * 1024);
    assert!(config.assistant.api_key.is_none());
    assert!(config.identity.user_id.is_none());
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let toml = r#"
[assistant]
modle = "gemini"
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown key should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } if key == "modle" => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("model"));
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telemetry]
enabled = true
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[intake]
max_attachment_bytes = "five megabytes"
"#;

    let errors = load_and_validate_str(toml).expect_err("string for u64 should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("max_attachment_bytes"))),
        "got: {errors:?}"
    );
}

#[test]
fn unknown_role_is_rejected() {
    let toml = r#"
[identity]
role = "superuser"
"#;
    assert!(load_and_validate_str(toml).is_err());
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[assistant]
base_url = "ftp://example.com"
turn_timeout_secs = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2, "got: {errors:?}");
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}

#[test]
fn explicit_file_is_loaded_with_env_overrides() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[assistant]
model = "gemini-file"

[storage]
database_path = "/tmp/airgi-custom.db"
"#,
        )?;
        jail.set_env("AIRGI_ASSISTANT_MODEL", "gemini-env");

        let config = load_and_validate_path(Path::new("custom.toml")).expect("valid file");
        assert_eq!(config.assistant.model, "gemini-env");
        assert_eq!(config.storage.database_path, "/tmp/airgi-custom.db");
        Ok(())
    });
}

#[test]
fn explicit_file_errors_point_at_that_file() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("broken.toml", "[intake]\nmax_attachment_bytes = \"big\"\n")?;

        let errors = load_and_validate_path(Path::new("broken.toml")).expect_err("bad type");
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("max_attachment_bytes"))),
            "got: {errors:?}"
        );
        Ok(())
    });
}

#[test]
fn local_file_takes_precedence_over_system_file() {
    let paths = search_paths();
    assert_eq!(paths.first().map(|p| p.as_path()), Some(Path::new("/etc/airgi/airgi.toml")));
    assert_eq!(paths.last().map(|p| p.as_path()), Some(Path::new("airgi.toml")));
}
