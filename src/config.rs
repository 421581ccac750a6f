/*
 * Copyright (C) 2026 Mark Wells Dev
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use anyhow::{Context, Result};
use lsp_types::ServerCapabilities;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::sync::{SessionOptions, save_include_text};

/// User configuration for document sync.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Send `didClose` when a session is torn down without the document
    /// being closed (default: false)
    #[serde(default)]
    pub close_on_dispose: bool,

    /// Language identifier overrides keyed by lower-cased grammar label
    /// (e.g. `"shell script" = "shellscript"`)
    #[serde(default)]
    pub languages: HashMap<String, String>,
}

impl Config {
    /// Load configuration from standard paths or a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the merged values do
    /// not deserialize.
    pub fn load(explicit_file: Option<PathBuf>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // 1. Start with defaults
        builder = builder.set_default("close_on_dispose", false)?;

        // 2. Load from user config directory (~/.config/docsync/config.toml)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("docsync").join("config.toml");
            if config_path.exists() {
                builder = builder.add_source(config::File::from(config_path));
            }
        }

        // 3. Load from explicit file if provided
        if let Some(path) = explicit_file {
            builder = builder.add_source(config::File::from(path));
        }

        // 4. Load from environment variables (DOCSYNC_CLOSE_ON_DISPOSE, etc.)
        builder = builder.add_source(config::Environment::with_prefix("DOCSYNC"));

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Session options for a server with the given capabilities.
    #[must_use]
    pub fn session_options(&self, capabilities: &ServerCapabilities) -> SessionOptions {
        SessionOptions {
            close_on_dispose: self.close_on_dispose,
            save_include_text: save_include_text(capabilities),
            language_overrides: self
                .languages
                .iter()
                .map(|(grammar, id)| (grammar.to_lowercase(), id.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "close_on_dispose = true\n\n[languages]\n\"shell script\" = \"shellscript\""
        )
        .unwrap();

        let config = Config::load(Some(file.path().to_path_buf())).unwrap();
        assert!(config.close_on_dispose);
        assert_eq!(
            config.languages.get("shell script").map(String::as_str),
            Some("shellscript")
        );
    }

    #[test]
    fn test_session_options_lowercase_keys() {
        let mut languages = HashMap::new();
        languages.insert("Shell Script".to_string(), "shellscript".to_string());
        let config = Config {
            close_on_dispose: true,
            languages,
        };

        let options = config.session_options(&ServerCapabilities::default());
        assert!(options.close_on_dispose);
        assert!(!options.save_include_text);
        assert_eq!(
            options.language_overrides.get("shell script").map(String::as_str),
            Some("shellscript")
        );
    }
}
