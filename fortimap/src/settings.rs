use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::client::RequestParams;

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "fortimap.toml";

/// Contents of `fortimap.toml`.
///
/// ```toml
/// import_table = true
/// schemas_dir = "schemas"
/// patches_file = "patches.toml"
///
/// [params]
/// adom = "root"
/// device_name = "fgt1"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Always read repeated blocks back from the device.
    pub import_table: bool,
    /// Default correlation parameters; `--param` entries override them.
    pub params: BTreeMap<String, String>,
    /// Extra TOML schema files.
    pub schemas_dir: Option<PathBuf>,
    /// Patch rules added on top of the built-in ones.
    pub patches_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

impl Settings {
    /// Load an explicit settings file. Relative paths inside it are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut settings: Settings = toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        if let Some(base) = path.parent() {
            settings.schemas_dir = settings.schemas_dir.map(|p| base.join(p));
            settings.patches_file = settings.patches_file.map(|p| base.join(p));
        }
        Ok(settings)
    }

    /// Load `explicit` if given, else `fortimap.toml` when it exists, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn default_params(&self) -> RequestParams {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{Settings, SettingsError};

    #[test]
    fn loads_and_resolves_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fortimap.toml");
        fs::write(
            &path,
            "import_table = true\nschemas_dir = \"schemas\"\n\n[params]\nadom = \"root\"\n",
        )
        .expect("write");

        let settings = Settings::load(&path).expect("load");
        assert!(settings.import_table);
        assert_eq!(settings.schemas_dir, Some(dir.path().join("schemas")));
        assert_eq!(settings.patches_file, None);
        assert_eq!(settings.default_params().get("adom"), Some("root"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fortimap.toml");
        fs::write(&path, "import_tables = true\n").expect("write");
        assert!(matches!(Settings::load(&path), Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Settings::discover(Some(&dir.path().join("absent.toml"))).expect_err("missing");
        assert!(err.to_string().contains("absent.toml"));
    }
}
