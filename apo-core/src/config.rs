use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://dev.azure.com";
pub const DEFAULT_API_VERSION: &str = "7.1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable pointing at an alternative config file
pub const CONFIG_PATH_ENV: &str = "APO_CONFIG";

const ENV_ORG: &str = "AZURE_DEVOPS_ORG";
const ENV_PROJECT: &str = "AZURE_DEVOPS_PROJECT";
const ENV_PAT: &str = "AZURE_DEVOPS_PAT";
const ENV_URL: &str = "AZURE_DEVOPS_URL";
const ENV_API_VERSION: &str = "AZURE_DEVOPS_API_VERSION";

/// Connection settings for the Azure DevOps organization
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub organization: String,

    #[serde(default)]
    pub project: String,

    /// Personal access token
    #[serde(default)]
    pub pat: String,

    #[serde(default = "default_api_url", skip_serializing_if = "String::is_empty")]
    pub api_url: String,

    #[serde(
        default = "default_api_version",
        skip_serializing_if = "String::is_empty"
    )]
    pub api_version: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_api_version() -> String {
    DEFAULT_API_VERSION.into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization: String::new(),
            project: String::new(),
            pat: String::new(),
            api_url: default_api_url(),
            api_version: default_api_version(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} is required")]
    Missing(&'static str),
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    ///
    /// A missing file is not an error: the environment may carry everything.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path();
        let config = match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_json(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Parse a config document (useful for testing)
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_json::from_str(content)?;
        config.fill_defaults();
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    /// Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(org) = get(ENV_ORG) {
            self.organization = org;
        }
        if let Some(project) = get(ENV_PROJECT) {
            self.project = project;
        }
        if let Some(pat) = get(ENV_PAT) {
            self.pat = pat;
        }
        if let Some(url) = get(ENV_URL) {
            self.api_url = url;
        }
        if let Some(version) = get(ENV_API_VERSION) {
            self.api_version = version;
        }
        self.fill_defaults();
        self
    }

    fn fill_defaults(&mut self) {
        if self.api_url.is_empty() {
            self.api_url = default_api_url();
        }
        if self.api_version.is_empty() {
            self.api_version = default_api_version();
        }
    }

    /// Write to the default location, creating the directory if needed
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        restrict_permissions(path);
        Ok(())
    }

    /// Organization and PAT are required for any API call
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.organization.is_empty() {
            return Err(ConfigError::Missing("organization"));
        }
        if self.pat.is_empty() {
            return Err(ConfigError::Missing("personal access token (PAT)"));
        }
        Ok(())
    }

    /// Project-scoped calls additionally need a project
    pub fn validate_with_project(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.project.is_empty() {
            return Err(ConfigError::Missing("project"));
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path = %path.display(), error = %e, "could not restrict config permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

/// Directory holding the config file and the TUI log
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("apo")
}

/// `$APO_CONFIG` if set, otherwise `~/.config/apo/config.json`
pub fn config_path() -> PathBuf {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join("config.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_applies_defaults() {
        let config = Config::from_json(r#"{"organization":"contoso","project":"web"}"#).unwrap();
        assert_eq!(config.organization, "contoso");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);

        let blank = Config::from_json(r#"{"api_url":"","api_version":""}"#).unwrap();
        assert_eq!(blank.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("AZURE_DEVOPS_ORG", "fabrikam"),
            ("AZURE_DEVOPS_PAT", "secret"),
            ("AZURE_DEVOPS_PROJECT", ""),
        ]
        .into_iter()
        .collect();

        let config = Config::from_json(r#"{"organization":"contoso","project":"web"}"#)
            .unwrap()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.organization, "fabrikam");
        assert_eq!(config.pat, "secret");
        // empty override is ignored
        assert_eq!(config.project, "web");
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("organization"))
        ));

        config.organization = "contoso".into();
        config.pat = "x".into();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.validate_with_project(),
            Err(ConfigError::Missing("project"))
        ));

        config.project = "web".into();
        assert!(config.validate_with_project().is_ok());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            organization: "contoso".into(),
            project: "web".into(),
            pat: "secret".into(),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(Config::from_json(&content).unwrap(), config);
    }

    #[test]
    fn test_invalid_json() {
        let err = Config::from_json("{nope");
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }
}
