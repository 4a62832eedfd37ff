// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers constraints serde cannot express: non-empty paths, non-zero
//! limits and deadlines, well-formed mime types, log levels.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::AirgiConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &AirgiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        fail(format!(
            "app.log_level `{}` must be one of {}",
            config.app.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.assistant.model.trim().is_empty() {
        fail("assistant.model must not be empty".to_string());
    }

    let base_url = config.assistant.base_url.trim();
    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        fail(format!(
            "assistant.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    for (key, value) in [
        ("assistant.open_timeout_secs", config.assistant.open_timeout_secs),
        ("assistant.turn_timeout_secs", config.assistant.turn_timeout_secs),
        ("intake.save_timeout_secs", config.intake.save_timeout_secs),
        ("intake.max_attachment_bytes", config.intake.max_attachment_bytes),
    ] {
        if value == 0 {
            fail(format!("{key} must be greater than zero"));
        }
    }

    if config.intake.title_fallback_chars == 0 {
        fail("intake.title_fallback_chars must be greater than zero".to_string());
    }

    if config.intake.allowed_mime_types.is_empty() {
        fail("intake.allowed_mime_types must list at least one type".to_string());
    }

    let mut seen = HashSet::new();
    for mime in &config.intake.allowed_mime_types {
        if !is_mime_type(mime) {
            fail(format!(
                "intake.allowed_mime_types entry `{mime}` is not of the form type/subtype"
            ));
        } else if !seen.insert(mime.to_ascii_lowercase()) {
            fail(format!("intake.allowed_mime_types lists `{mime}` twice"));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if let Some(id) = &config.identity.user_id
        && id.trim().is_empty()
    {
        fail("identity.user_id must not be empty when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_mime_type(value: &str) -> bool {
    let mut parts = value.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(kind), Some(sub), None) => {
            let token = |s: &str| {
                !s.is_empty()
                    && s.chars()
                        .all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c))
            };
            token(kind) && token(sub)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&AirgiConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = AirgiConfig::default();
        config.app.log_level = "loud".into();
        config.intake.max_attachment_bytes = 0;
        config.intake.allowed_mime_types = vec!["image".into(), "text/plain".into()];
        config.storage.database_path = "  ".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4, "got: {errors:?}");
    }

    #[test]
    fn duplicate_mime_type_rejected() {
        let mut config = AirgiConfig::default();
        config.intake.allowed_mime_types = vec!["image/png".into(), "IMAGE/PNG".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("twice"));
    }

    #[test]
    fn mime_shape() {
        assert!(is_mime_type("application/vnd.ms-excel"));
        assert!(is_mime_type("image/svg+xml"));
        assert!(!is_mime_type("image/"));
        assert!(!is_mime_type("a/b/c"));
    }
}
