//! Exoscale provider configuration
//!
//! Values come from, lowest priority first: built-in defaults, a YAML file
//! located by [`find_config_file`], then `EXOSCALE_*` environment variables.

pub mod error;

pub use error::*;

use exoscale_provider_core::WaitConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "EXOSCALE_PROVIDER_CONFIG";
pub const API_KEY_ENV: &str = "EXOSCALE_API_KEY";
pub const API_SECRET_ENV: &str = "EXOSCALE_API_SECRET";
pub const API_ENVIRONMENT_ENV: &str = "EXOSCALE_API_ENVIRONMENT";
pub const API_ENDPOINT_ENV: &str = "EXOSCALE_API_ENDPOINT";
pub const API_TIMEOUT_ENV: &str = "EXOSCALE_API_TIMEOUT";
pub const ZONE_ENV: &str = "EXOSCALE_ZONE";

/// Provider-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub secret: Option<String>,

    /// API environment, the first label of the zone endpoint host
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Full endpoint override, e.g. `https://api-ch-gva-2.exoscale.com/v2`
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Default per-operation timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Zone used for global resources (SSH keys, DNS, IAM)
    #[serde(default = "default_zone")]
    pub default_zone: String,

    #[serde(default)]
    pub wait: WaitConfig,
}

fn default_environment() -> String {
    "api".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_zone() -> String {
    "ch-gva-2".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            key: None,
            secret: None,
            environment: default_environment(),
            endpoint: None,
            timeout: default_timeout(),
            default_zone: default_zone(),
            wait: WaitConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Defaults, then the config file if one is found, then the environment.
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Ok(path) => {
                tracing::debug!("Loading provider config from {}", path.display());
                Self::from_file(&path)?
            }
            Err(ConfigError::ConfigFileNotFound) => Self::default(),
            Err(e) => return Err(e),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // an empty document deserializes to unit, not to a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override fields from `EXOSCALE_*` variables. Empty values are ignored.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(key) = env_var(API_KEY_ENV) {
            self.key = Some(key);
        }
        if let Some(secret) = env_var(API_SECRET_ENV) {
            self.secret = Some(secret);
        }
        if let Some(environment) = env_var(API_ENVIRONMENT_ENV) {
            self.environment = environment;
        }
        if let Some(endpoint) = env_var(API_ENDPOINT_ENV) {
            self.endpoint = Some(endpoint);
        }
        if let Some(timeout) = env_var(API_TIMEOUT_ENV) {
            self.timeout = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                key: API_TIMEOUT_ENV.to_string(),
                message: format!("{:?} is not a number of seconds", timeout),
            })?;
        }
        if let Some(zone) = env_var(ZONE_ENV) {
            self.default_zone = zone;
        }
        Ok(())
    }

    /// Check the settings needed to build an API client.
    pub fn validate(&self) -> Result<()> {
        if self.key.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingCredential("key"));
        }
        if self.secret.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingCredential("secret"));
        }
        if self.timeout == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.wait.multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "wait.multiplier".to_string(),
                message: "must be at least 1.0".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Locate the provider config file.
///
/// Search order:
/// 1. `EXOSCALE_PROVIDER_CONFIG` (direct path)
/// 2. `./exoscale.yaml`
/// 3. `~/.config/exoscale/provider.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Some(config_path) = env_var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let local = std::env::current_dir()?.join("exoscale.yaml");
    if local.exists() {
        return Ok(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("exoscale").join("provider.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    const ALL_VARS: [&str; 7] = [
        CONFIG_PATH_ENV,
        API_KEY_ENV,
        API_SECRET_ENV,
        API_ENVIRONMENT_ENV,
        API_ENDPOINT_ENV,
        API_TIMEOUT_ENV,
        ZONE_ENV,
    ];

    fn cleared<'a>() -> Vec<(&'static str, Option<&'a str>)> {
        ALL_VARS.iter().map(|v| (*v, None)).collect()
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.environment, "api");
        assert_eq!(config.default_zone, "ch-gva-2");
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.wait, WaitConfig::default());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = ProviderConfig::from_yaml(
            "key: EXOabc\nsecret: s3cr3t\ntimeout: 60\nwait:\n  max_delay_ms: 5000\n",
        )
        .unwrap();
        assert_eq!(config.key.as_deref(), Some("EXOabc"));
        assert_eq!(config.timeout, 60);
        assert_eq!(config.wait.max_delay_ms, 5000);
        assert_eq!(config.wait.initial_delay_ms, 1000);
        assert_eq!(config.environment, "api");

        assert_eq!(ProviderConfig::from_yaml("").unwrap(), ProviderConfig::default());
        assert!(matches!(
            ProviderConfig::from_yaml("timeout: soon"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("provider.yaml");
        fs::write(&path, "key: EXOfile\nsecret: file-secret\ndefault_zone: de-fra-1\n").unwrap();

        let mut vars = cleared();
        vars.retain(|(k, _)| *k != CONFIG_PATH_ENV && *k != API_KEY_ENV && *k != ZONE_ENV);
        vars.push((CONFIG_PATH_ENV, path.to_str()));
        vars.push((API_KEY_ENV, Some("EXOenv")));
        vars.push((ZONE_ENV, Some("at-vie-1")));

        temp_env::with_vars(vars, || {
            let config = ProviderConfig::load().unwrap();
            assert_eq!(config.key.as_deref(), Some("EXOenv"));
            assert_eq!(config.secret.as_deref(), Some("file-secret"));
            assert_eq!(config.default_zone, "at-vie-1");
        });
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_env() {
        let mut vars = cleared();
        vars.retain(|(k, _)| *k != API_TIMEOUT_ENV);
        vars.push((API_TIMEOUT_ENV, Some("ten")));
        temp_env::with_vars(vars, || {
            let mut config = ProviderConfig::default();
            let err = config.apply_env().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
        });
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        fs::write(temp_dir.path().join("exoscale.yaml"), "environment: ppapi\n").unwrap();

        temp_env::with_vars(cleared(), || {
            std::env::set_current_dir(&temp_dir).unwrap();
            let found = find_config_file();
            let loaded = ProviderConfig::load();
            std::env::set_current_dir(&original_dir).unwrap();

            assert!(found.unwrap().ends_with("exoscale.yaml"));
            assert_eq!(loaded.unwrap().environment, "ppapi");
        });
    }

    #[test]
    #[serial]
    fn test_env_path_takes_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.yaml");
        fs::write(&custom, "timeout: 30\n").unwrap();

        let mut vars = cleared();
        vars.retain(|(k, _)| *k != CONFIG_PATH_ENV);
        vars.push((CONFIG_PATH_ENV, custom.to_str()));
        temp_env::with_vars(vars, || {
            assert_eq!(find_config_file().unwrap(), custom);
        });
    }

    #[test]
    fn test_validate() {
        let mut config = ProviderConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential("key"))
        ));

        config.key = Some("EXOabc".to_string());
        config.secret = Some(String::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential("secret"))
        ));

        config.secret = Some("s3cr3t".to_string());
        assert!(config.validate().is_ok());

        config.timeout = 0;
        assert!(config.validate().is_err());
    }
}
