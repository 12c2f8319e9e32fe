//! Settings file for the geofield CLI.
//!
//! The file lives at `<config_dir>/geofield/settings.json` unless
//! `GEOFIELD_SETTINGS_PATH` points elsewhere. Files ending in `.yaml`/`.yml`
//! are parsed as YAML, everything else as JSON. A missing file yields the
//! defaults.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use dirs_next::config_dir;
use geofield_types::{AutocompleteOptions, OptionsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{expand_tilde, resolve_relative_to};

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "GEOFIELD_SETTINGS_PATH";

/// Default filename for the settings payload.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("settings parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid autocomplete options: {0}")]
    Options(#[from] OptionsError),
}

/// Which place-search provider backs the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderSettings {
    /// Google Places web service, configured from the environment.
    #[default]
    Google,
    /// Static fixture file. Relative paths are resolved against the settings file.
    Fixture { path: PathBuf },
    /// Provider that never finds anything.
    Null,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub options: Option<AutocompleteOptions>,
    /// Initial value of the field's `required` attribute.
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub provider: ProviderSettings,
}

pub fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(SETTINGS_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("geofield")
        .join(SETTINGS_FILE_NAME)
}

/// Load settings from the default location.
pub fn load_settings() -> Result<Settings, SettingsError> {
    load_settings_from_path(&default_settings_path())
}

pub fn load_settings_from_path(path: &Path) -> Result<Settings, SettingsError> {
    let display_path = path.display().to_string();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %display_path, "settings file not found; using defaults");
            return Ok(Settings::default());
        }
        Err(source) => return Err(SettingsError::Io { path: display_path, source }),
    };

    let mut settings = parse_settings(path, &content).map_err(|message| SettingsError::Parse {
        path: display_path.clone(),
        message,
    })?;
    if let Some(options) = &settings.options {
        options.validate()?;
    }
    if let ProviderSettings::Fixture { path: fixture_path } = &mut settings.provider {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        *fixture_path = resolve_relative_to(base, fixture_path);
    }
    debug!(path = %display_path, provider = ?settings.provider, "settings loaded");
    Ok(settings)
}

fn parse_settings(path: &Path, content: &str) -> Result<Settings, String> {
    let is_yaml = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("yaml") || extension.eq_ignore_ascii_case("yml"));
    if is_yaml {
        serde_yaml::from_str(content).map_err(|error| error.to_string())
    } else {
        serde_json::from_str(content).map_err(|error| error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = tempdir().unwrap();
        let settings = load_settings_from_path(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.provider, ProviderSettings::Google);
    }

    #[test]
    fn loads_json_with_fixture_provider() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"options": {"country": "gb", "strict": true}, "required": true, "provider": {"kind": "fixture", "path": "places.yaml"}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert!(settings.required);
        let options = settings.options.expect("options");
        assert!(options.strict);
        assert_eq!(options.country.as_deref(), Some("gb"));
        assert_eq!(
            settings.provider,
            ProviderSettings::Fixture {
                path: temp_dir.path().join("places.yaml"),
            }
        );
    }

    #[test]
    fn loads_yaml_by_extension() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "options:\n  watchEnter: true\nprovider:\n  kind: \"null\"\n").unwrap();
        let settings = load_settings_from_path(&path).unwrap();
        assert!(settings.options.unwrap().watch_enter);
        assert_eq!(settings.provider, ProviderSettings::Null);
    }

    #[test]
    fn rejects_invalid_options() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{"options": {"country": "Canada"}}"#).unwrap();
        let error = load_settings_from_path(&path).unwrap_err();
        assert!(matches!(error, SettingsError::Options(OptionsError::InvalidCountry(_))));
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let error = load_settings_from_path(&path).unwrap_err();
        assert!(matches!(error, SettingsError::Parse { .. }));
        assert!(error.to_string().contains("settings.json"));
    }

    #[test]
    fn env_override_controls_default_path() {
        temp_env::with_var(SETTINGS_PATH_ENV, Some("/opt/geofield/custom.yaml"), || {
            assert_eq!(default_settings_path(), PathBuf::from("/opt/geofield/custom.yaml"));
        });
        temp_env::with_var(SETTINGS_PATH_ENV, Some("   "), || {
            assert!(default_settings_path().ends_with("geofield/settings.json"));
        });
    }
}
