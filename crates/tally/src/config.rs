//! Settings file.
//!
//! Settings are read from `tally/config.json` under the user's config
//! directory, or from an explicitly given file. Command-line flags win.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ledger file used when none is given on the command line.
    pub ledger: Option<PathBuf>,
    /// Run dangerous queries without asking for `--allow-dangerous`.
    pub allow_dangerous: bool,
}

impl Settings {
    /// Location of the default settings file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tally").join("config.json"))
    }

    /// Load settings.
    ///
    /// An explicit file must exist; a missing default file means default settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "allow_dangerous": true }"#).unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert!(settings.allow_dangerous);
        assert!(settings.ledger.is_none());
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("missing.json"))).is_err());
    }
}
