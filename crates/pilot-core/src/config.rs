//! Configuration management for backlog-pilot.
//!
//! Configuration is loaded once at startup from a TOML file and the process
//! environment, then handed to the client and selector as an immutable value.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/backlog-pilot/config.toml`
//! - **Windows**: `%APPDATA%\backlog-pilot\config.toml`
//!
//! The personal access token is never written to the file. It comes from
//! `AZURE_DEVOPS_EXT_PAT` (or `AZURE_DEVOPS_TOKEN` / `AZURE_DEVOPS_PAT`).
//!
//! # Example
//!
//! ```ignore
//! use pilot_core::config::Config;
//!
//! let config = Config::load()?;
//! let limit = config.backlog.default_limit;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "backlog-pilot";

/// Organization URL variables, first match wins.
pub const ORG_URL_VARS: &[&str] = &["AZURE_DEVOPS_ORG_URL", "AZURE_DEVOPS_SCOPE"];

/// Project override variable.
pub const PROJECT_VAR: &str = "AZURE_DEVOPS_PROJECT";

/// Personal access token variables, first match wins.
pub const TOKEN_VARS: &[&str] = &[
    "AZURE_DEVOPS_EXT_PAT",
    "AZURE_DEVOPS_TOKEN",
    "AZURE_DEVOPS_PAT",
];

/// States that count as finished work.
pub const DEFAULT_CLOSED_STATES: &[&str] = &["Closed", "Removed", "Resolved", "Done", "Completed"];

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Azure DevOps connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_devops: Option<AzureDevOpsConfig>,

    /// Backlog selection defaults
    #[serde(default)]
    pub backlog: BacklogConfig,
}

/// Azure DevOps connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AzureDevOpsConfig {
    /// Organization URL, usually including the project
    /// (e.g. `https://dev.azure.com/contoso/Fabrikam`)
    pub org_url: String,
    /// Project name, overrides the one embedded in `org_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// REST API version
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Personal access token, environment only
    #[serde(skip)]
    pub token: Option<String>,
}

impl std::fmt::Debug for AzureDevOpsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDevOpsConfig")
            .field("org_url", &self.org_url)
            .field("project", &self.project)
            .field("api_version", &self.api_version)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Backlog selection defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogConfig {
    /// Number of items returned when the caller does not ask for a count
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Replace parents with their open children
    #[serde(default = "default_prioritize_parents")]
    pub prioritize_parents: bool,
    /// Restrict child items to these work item types (empty = any type)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_types: Vec<String>,
    /// States treated as closed
    #[serde(default = "default_closed_states")]
    pub closed_states: Vec<String>,
}

impl Default for BacklogConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            prioritize_parents: default_prioritize_parents(),
            child_types: Vec::new(),
            closed_states: default_closed_states(),
        }
    }
}

fn default_api_version() -> String {
    "6.0".to_string()
}

fn default_limit() -> u32 {
    5
}

fn default_prioritize_parents() -> bool {
    true
}

fn default_closed_states() -> Vec<String> {
    DEFAULT_CLOSED_STATES.iter().map(|s| s.to_string()).collect()
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location and apply the process
    /// environment on top.
    pub fn load() -> Result<Self> {
        Self::load_with_path(&Self::config_path()?)
    }

    /// Load configuration from `path` and apply the process environment on top.
    pub fn load_with_path(path: &Path) -> Result<Self> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to a specific path. The token is never written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = self.to_toml()?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Render the configuration as it is written to disk (never includes the token).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Overlay environment values using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| -> Option<String> {
            names
                .iter()
                .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
        };

        if let Some(org_url) = first(ORG_URL_VARS) {
            debug!("Organization URL taken from environment");
            self.azure_devops_mut().org_url = org_url;
        }
        if let Some(project) = first(&[PROJECT_VAR]) {
            self.azure_devops_mut().project = Some(project);
        }
        if let Some(token) = first(TOKEN_VARS) {
            self.azure_devops_mut().token = Some(token);
        }
    }

    fn azure_devops_mut(&mut self) -> &mut AzureDevOpsConfig {
        self.azure_devops.get_or_insert_with(|| AzureDevOpsConfig {
            org_url: String::new(),
            project: None,
            api_version: default_api_version(),
            token: None,
        })
    }

    /// Get the Azure DevOps section, failing if it is missing or incomplete.
    pub fn azure_devops(&self) -> Result<&AzureDevOpsConfig> {
        let ado = self.azure_devops.as_ref().ok_or_else(|| {
            Error::Config(format!(
                "Azure DevOps is not configured. Set {} or run `backlog-pilot config set azure_devops.org_url <url>`",
                ORG_URL_VARS[0]
            ))
        })?;
        if ado.org_url.trim().is_empty() {
            return Err(Error::Config(format!(
                "Azure DevOps organization URL is empty. Set {}",
                ORG_URL_VARS[0]
            )));
        }
        if ado.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(Error::Config(format!(
                "Azure DevOps personal access token is missing. Set {}",
                TOKEN_VARS[0]
            )));
        }
        Ok(ado)
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `azure_devops.org_url`, `backlog.default_limit`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match section {
            "azure_devops" => {
                let config = self.azure_devops_mut();
                match field {
                    "org_url" | "url" => config.org_url = value.to_string(),
                    "project" => config.project = Some(value.to_string()),
                    "api_version" => config.api_version = value.to_string(),
                    "token" | "pat" => {
                        return Err(Error::Config(format!(
                            "The access token is not stored in the config file. Set {} instead",
                            TOKEN_VARS[0]
                        )))
                    }
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown Azure DevOps config field: {}",
                            field
                        )))
                    }
                }
            }
            "backlog" => match field {
                "default_limit" | "limit" => {
                    let limit: u32 = value.parse().map_err(|_| {
                        Error::Config(format!("Invalid limit '{}': expected a number", value))
                    })?;
                    if limit == 0 {
                        return Err(Error::Config("Limit must be at least 1".to_string()));
                    }
                    self.backlog.default_limit = limit;
                }
                "prioritize_parents" => {
                    self.backlog.prioritize_parents = value.parse().map_err(|_| {
                        Error::Config(format!("Invalid boolean '{}': expected true or false", value))
                    })?;
                }
                "child_types" => self.backlog.child_types = parse_list(value),
                "closed_states" => self.backlog.closed_states = parse_list(value),
                _ => {
                    return Err(Error::Config(format!(
                        "Unknown backlog config field: {}",
                        field
                    )))
                }
            },
            _ => {
                return Err(Error::Config(format!("Unknown config section: {}", section)));
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match section {
            "azure_devops" => {
                let Some(config) = &self.azure_devops else {
                    return Ok(None);
                };
                match field {
                    "org_url" | "url" => Ok(Some(config.org_url.clone())),
                    "project" => Ok(config.project.clone()),
                    "api_version" => Ok(Some(config.api_version.clone())),
                    "token" | "pat" => Ok(config.token.as_ref().map(|_| "<set>".to_string())),
                    _ => Err(Error::Config(format!(
                        "Unknown Azure DevOps config field: {}",
                        field
                    ))),
                }
            }
            "backlog" => match field {
                "default_limit" | "limit" => Ok(Some(self.backlog.default_limit.to_string())),
                "prioritize_parents" => Ok(Some(self.backlog.prioritize_parents.to_string())),
                "child_types" => Ok(Some(self.backlog.child_types.join(","))),
                "closed_states" => Ok(Some(self.backlog.closed_states.join(","))),
                _ => Err(Error::Config(format!(
                    "Unknown backlog config field: {}",
                    field
                ))),
            },
            _ => Err(Error::Config(format!("Unknown config section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.azure_devops.is_none());
        assert_eq!(config.backlog.default_limit, 5);
        assert!(config.backlog.prioritize_parents);
        assert!(config.backlog.child_types.is_empty());
        assert_eq!(config.backlog.closed_states.len(), 5);
        assert!(config.azure_devops().is_err());
    }

    #[test]
    fn test_apply_env_primary_vars() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("AZURE_DEVOPS_ORG_URL", "https://dev.azure.com/contoso/Fabrikam"),
            ("AZURE_DEVOPS_EXT_PAT", "pat-123"),
        ]));

        let ado = config.azure_devops().unwrap();
        assert_eq!(ado.org_url, "https://dev.azure.com/contoso/Fabrikam");
        assert_eq!(ado.token.as_deref(), Some("pat-123"));
        assert_eq!(ado.api_version, "6.0");
    }

    #[test]
    fn test_apply_env_fallback_vars() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("AZURE_DEVOPS_SCOPE", "https://dev.azure.com/contoso/Fabrikam"),
            ("AZURE_DEVOPS_TOKEN", "fallback"),
            ("AZURE_DEVOPS_PROJECT", "Other"),
        ]));

        let ado = config.azure_devops().unwrap();
        assert_eq!(ado.token.as_deref(), Some("fallback"));
        assert_eq!(ado.project.as_deref(), Some("Other"));
    }

    #[test]
    fn test_apply_env_ignores_blank_values() {
        let mut config = Config::default();
        config.apply_env(env(&[("AZURE_DEVOPS_EXT_PAT", "  "), ("AZURE_DEVOPS_TOKEN", "real")]));
        assert_eq!(
            config.azure_devops.unwrap().token.as_deref(),
            Some("real")
        );
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let mut config = Config::default();
        config
            .set("azure_devops.org_url", "https://dev.azure.com/contoso/Fabrikam")
            .unwrap();

        let err = config.azure_devops().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("AZURE_DEVOPS_EXT_PAT"));
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();

        config
            .set("azure_devops.org_url", "https://dev.azure.com/contoso/Fabrikam")
            .unwrap();
        config.set("backlog.default_limit", "10").unwrap();
        config.set("backlog.prioritize_parents", "false").unwrap();
        config.set("backlog.child_types", "Task, Bug").unwrap();

        assert_eq!(
            config.get("azure_devops.org_url").unwrap(),
            Some("https://dev.azure.com/contoso/Fabrikam".to_string())
        );
        assert_eq!(config.get("backlog.limit").unwrap(), Some("10".to_string()));
        assert!(!config.backlog.prioritize_parents);
        assert_eq!(config.backlog.child_types, vec!["Task", "Bug"]);
        assert_eq!(
            config.get("backlog.child_types").unwrap(),
            Some("Task,Bug".to_string())
        );
    }

    #[test]
    fn test_invalid_keys_and_values() {
        let mut config = Config::default();

        assert!(config.set("invalid", "value").is_err());
        assert!(config.set("too.many.parts", "value").is_err());
        assert!(config.set("unknown.field", "value").is_err());
        assert!(config.set("backlog.default_limit", "zero").is_err());
        assert!(config.set("backlog.default_limit", "0").is_err());
        assert!(config.set("backlog.prioritize_parents", "maybe").is_err());
        assert!(config.set("azure_devops.token", "secret").is_err());

        // Section not configured yet
        assert_eq!(config.get("azure_devops.org_url").unwrap(), None);
    }

    #[test]
    fn test_save_and_load_never_writes_token() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("AZURE_DEVOPS_ORG_URL", "https://dev.azure.com/contoso/Fabrikam"),
            ("AZURE_DEVOPS_EXT_PAT", "super-secret"),
        ]));
        config.backlog.child_types = vec!["Task".to_string()];

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();
        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[azure_devops]"));
        assert!(contents.contains("org_url = \"https://dev.azure.com/contoso/Fabrikam\""));
        assert!(!contents.contains("super-secret"));

        let loaded = Config::load_from(&path).unwrap();
        let ado = loaded.azure_devops.unwrap();
        assert!(ado.token.is_none());
        assert_eq!(loaded.backlog.child_types, vec!["Task"]);
    }

    #[test]
    fn test_load_nonexistent() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(config.azure_devops.is_none());
    }

    #[test]
    fn test_load_with_path_reads_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[backlog]\ndefault_limit = 7\n").unwrap();

        let config = Config::load_with_path(temp_file.path()).unwrap();
        assert_eq!(config.backlog.default_limit, 7);

        let err = Config::load_with_path(Path::new("/")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_malformed_is_config_error() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "backlog = [not toml").unwrap();

        let err = Config::load_from(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_partial_backlog_section_uses_defaults() {
        let parsed: Config = toml::from_str("[backlog]\ndefault_limit = 3\n").unwrap();
        assert_eq!(parsed.backlog.default_limit, 3);
        assert!(parsed.backlog.prioritize_parents);
        assert_eq!(parsed.backlog.closed_states, default_closed_states());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = Config::default();
        config.apply_env(env(&[("AZURE_DEVOPS_EXT_PAT", "super-secret")]));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
