// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the AIRGI incident intake.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use airgi_core::types::Role;
use serde::{Deserialize, Serialize};

/// Top-level AIRGI configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AirgiConfig {
    /// Application identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Assistant service settings.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Intake session limits and timeouts.
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Signed-in identity used by the command-line front end.
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Application identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "airgi".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Assistant service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    /// API key. `None` falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Deadline for opening a dialogue session.
    #[serde(default = "default_open_timeout_secs")]
    pub open_timeout_secs: u64,

    /// Deadline for sending one turn and draining all of its fragments.
    #[serde(default = "default_turn_timeout_secs")]
    pub turn_timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            open_timeout_secs: default_open_timeout_secs(),
            turn_timeout_secs: default_turn_timeout_secs(),
        }
    }
}

impl AssistantConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_open_timeout_secs() -> u64 {
    30
}

fn default_turn_timeout_secs() -> u64 {
    120
}

/// Intake session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntakeConfig {
    /// Largest accepted attachment, in bytes.
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,

    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,

    /// How many characters of the original description a fallback title keeps.
    #[serde(default = "default_title_fallback_chars")]
    pub title_fallback_chars: usize,

    /// Deadline for each persistence step (write, re-read).
    #[serde(default = "default_save_timeout_secs")]
    pub save_timeout_secs: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_attachment_bytes: default_max_attachment_bytes(),
            allowed_mime_types: default_allowed_mime_types(),
            title_fallback_chars: default_title_fallback_chars(),
            save_timeout_secs: default_save_timeout_secs(),
        }
    }
}

impl IntakeConfig {
    pub fn save_timeout(&self) -> Duration {
        Duration::from_secs(self.save_timeout_secs)
    }
}

fn default_max_attachment_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_allowed_mime_types() -> Vec<String> {
    [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "video/mp4",
        "application/pdf",
        "text/plain",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_title_fallback_chars() -> usize {
    40
}

fn default_save_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("airgi").join("airgi.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("airgi.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Local identity configuration.
///
/// Stands in for an external sign-in: when `user_id` is unset, commands
/// that need an identity fail as unauthorized.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default = "default_role")]
    pub role: Role,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id: None,
            name: None,
            email: None,
            role: default_role(),
        }
    }
}

fn default_role() -> Role {
    Role::User
}
