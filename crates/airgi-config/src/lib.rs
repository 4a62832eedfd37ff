// SPDX-FileCopyrightText: 2026 AIRGI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the AIRGI incident intake.
//!
//! One TOML document with five sections: `[app]` (name, log level),
//! `[assistant]` (Gemini key, model, open and turn timeouts), `[intake]`
//! (attachment limits and allow-list, save timeout, title fallback length),
//! `[storage]` (SQLite path, WAL) and `[identity]` (who is reporting).
//! Unknown keys are rejected, `AIRGI_<SECTION>_<KEY>` variables override
//! files, and every problem is reported at once as a miette diagnostic.
//!
//! ```no_run
//! let config = airgi_config::load_and_validate().expect("config errors");
//! println!("model: {}", config.assistant.model);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::AirgiConfig;

/// Loads from `/etc/airgi`, the user config dir and `./airgi.toml`, then env.
///
/// A config that parses still has to pass the cross-field checks (positive
/// timeouts, a non-empty attachment allow-list, a known log level) before it
/// is returned.
pub fn load_and_validate() -> Result<AirgiConfig, Vec<ConfigError>> {
    let sources = || {
        loader::search_paths()
            .iter()
            .rev()
            .filter_map(|path| read_source(path))
            .collect()
    };
    checked(loader::load_config(), sources)
}

/// Loads one explicit file (the `--config` flag) plus env overrides.
pub fn load_and_validate_path(path: &Path) -> Result<AirgiConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Loads an inline TOML document with no file lookup and no env.
pub fn load_and_validate_str(toml_content: &str) -> Result<AirgiConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validates a parsed config, or turns a parse failure into diagnostics
/// with spans resolved against `sources`.
fn checked(
    loaded: Result<AirgiConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<AirgiConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    let shown = if path.is_relative() {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    } else {
        path.to_path_buf()
    };
    Some((shown.display().to_string(), content))
}
