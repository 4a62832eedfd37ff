// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./airgi.toml` > `~/.config/airgi/airgi.toml` > `/etc/airgi/airgi.toml`
//! with environment variable overrides via `AIRGI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AirgiConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/airgi/airgi.toml`
/// 3. `~/.config/airgi/airgi.toml`
/// 4. `./airgi.toml`
/// 5. `AIRGI_*` environment variables
pub fn load_config() -> Result<AirgiConfig, figment::Error> {
    search_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(AirgiConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
        .extract()
}

/// Config file locations, lowest precedence first. Missing files are skipped.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/airgi/airgi.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("airgi/airgi.toml"));
    }
    paths.push(PathBuf::from("airgi.toml"));
    paths
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AirgiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AirgiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AirgiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AirgiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider mapping `AIRGI_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `split("_")` because keys themselves contain
/// underscores: `AIRGI_INTAKE_MAX_ATTACHMENT_BYTES` is `intake.max_attachment_bytes`.
fn env_provider() -> Env {
    Env::prefixed("AIRGI_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("app_", "app.", 1)
            .replacen("assistant_", "assistant.", 1)
            .replacen("intake_", "intake.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("identity_", "identity.", 1);
        mapped.into()
    })
}
