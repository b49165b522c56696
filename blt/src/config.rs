use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use blt_common::config::DEFAULT_API_PATH;

use crate::{ledger_client::LedgerClientConfig, logger::LogLevel};

/// Default values for configuration
pub mod defaults {
    use super::*;

    pub const LOG_LEVEL: LogLevel = LogLevel::Info;
    pub const FILENAME_LOG: &str = "blt.log";
    pub const LOGS_PATH: &str = "logs/";
    pub const PROTOCOL: &str = "https";
    pub const API_PATH: &str = DEFAULT_API_PATH;

    // Ledger client defaults
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const CONNECTION_TIMEOUT_SECS: u64 = 10;

    // Validation limits
    pub const MIN_TIMEOUT_SECS: u64 = 1;
    pub const MAX_TIMEOUT_SECS: u64 = 300;
}

/// Configuration errors, raised before any network activity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Connection protocol is undefined")]
    MissingProtocol,
    #[error("Node host is undefined")]
    MissingHost,
    #[error("Invalid connection protocol: '{0}' - must be one of: http, https")]
    InvalidProtocol(String),
    #[error("Invalid node url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid {field}: {value} seconds - must be between {min} and {max} seconds")]
    InvalidTimeout {
        field: String,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("Application credentials need both an app id and an app key")]
    IncompleteCredentials,
}

/// Where the node lives and how to authenticate against it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub protocol: String,
    pub host: String,
    #[serde(default)]
    pub port: String,
    #[serde(default = "default_api_path")]
    pub api_path: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_key: String,
}

impl ConnectionConfig {
    /// Connection using the default api path and no credentials
    pub fn new(protocol: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port: String::new(),
            api_path: default_api_path(),
            app_id: String::new(),
            app_key: String::new(),
        }
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    pub fn with_credentials(mut self, app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self.app_key = app_key.into();
        self
    }

    /// Check the required parameters are present and form a valid url
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol.trim().is_empty() {
            return Err(ConfigError::MissingProtocol);
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        match self.protocol.as_str() {
            "http" | "https" => {}
            other => return Err(ConfigError::InvalidProtocol(other.to_string())),
        }

        let api_url = self.api_url();
        Url::parse(&api_url).map_err(|e| ConfigError::InvalidUrl {
            url: api_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Root url of the node, e.g. `https://node.example.com:9984`
    pub fn root_url(&self) -> String {
        if self.port.is_empty() {
            format!("{}://{}", self.protocol, self.host)
        } else {
            format!("{}://{}:{}", self.protocol, self.host, self.port)
        }
    }

    /// Url of the API, e.g. `https://node.example.com:9984/api/v1/`
    pub fn api_url(&self) -> String {
        format!("{}{}", self.root_url(), self.api_path)
    }

    /// Application credentials, only when both halves are set
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.app_id.is_empty() || self.app_key.is_empty() {
            None
        } else {
            Some((&self.app_id, &self.app_key))
        }
    }
}

/// Full configuration of the command line tool
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidatedConfig {
    /// Log level configuration
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,

    /// File logging settings
    #[serde(default)]
    pub disable_file_logging: bool,

    #[serde(default)]
    pub disable_log_color: bool,

    #[serde(default = "default_filename_log")]
    pub filename_log: String,

    #[serde(default = "default_logs_path")]
    pub logs_path: String,

    /// Node connection settings
    #[serde(default = "default_protocol")]
    pub protocol: String,

    pub host: Option<String>,

    #[serde(default)]
    pub port: String,

    #[serde(default = "default_api_path")]
    pub api_path: String,

    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub app_key: String,

    /// Advanced ledger client configuration
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,

    /// Auto-fix configuration issues
    #[serde(default)]
    pub auto_fix_config: bool,

    /// Validation settings
    #[serde(default)]
    pub strict_validation: bool,
}

// Default functions for serde
fn default_log_level() -> LogLevel {
    defaults::LOG_LEVEL
}
fn default_filename_log() -> String {
    defaults::FILENAME_LOG.to_string()
}
fn default_logs_path() -> String {
    defaults::LOGS_PATH.to_string()
}
fn default_protocol() -> String {
    defaults::PROTOCOL.to_string()
}
fn default_api_path() -> String {
    defaults::API_PATH.to_string()
}
fn default_request_timeout_secs() -> u64 {
    defaults::REQUEST_TIMEOUT_SECS
}
fn default_connection_timeout_secs() -> u64 {
    defaults::CONNECTION_TIMEOUT_SECS
}

impl Default for ValidatedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            disable_file_logging: false,
            disable_log_color: false,
            filename_log: default_filename_log(),
            logs_path: default_logs_path(),
            protocol: default_protocol(),
            host: None,
            port: String::new(),
            api_path: default_api_path(),
            app_id: String::new(),
            app_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            connection_timeout_secs: default_connection_timeout_secs(),
            auto_fix_config: true,
            strict_validation: false,
        }
    }
}

/// Configuration validator
pub struct ConfigValidator {
    strict_mode: bool,
    auto_fix: bool,
}

impl ConfigValidator {
    pub fn new(strict_mode: bool, auto_fix: bool) -> Self {
        Self {
            strict_mode,
            auto_fix,
        }
    }

    fn can_fix(&self) -> bool {
        self.auto_fix && !self.strict_mode
    }

    /// Validate the entire configuration, returning the list of fixes and warnings
    pub fn validate(&self, config: &mut ValidatedConfig) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        let mut fixed_issues = Vec::new();

        info!("Validating configuration...");

        // The host has no sensible default
        match config.host.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(anyhow!(
                    "Configuration validation failed: {}",
                    ConfigError::MissingHost
                ))
            }
            Some(_) => {}
        }

        // Validate protocol
        let protocol = config.protocol.to_lowercase();
        if protocol != "http" && protocol != "https" {
            let e = ConfigError::InvalidProtocol(config.protocol.clone());
            if self.can_fix() {
                warn!("Auto-fixing protocol: {}", e);
                config.protocol = defaults::PROTOCOL.to_string();
                fixed_issues.push(format!("Fixed protocol to default: {}", config.protocol));
            } else {
                return Err(anyhow!("Configuration validation failed: {}", e));
            }
        } else if protocol != config.protocol {
            config.protocol = protocol;
        }

        // The api path is appended to the root url as is
        if !config.api_path.starts_with('/') || !config.api_path.ends_with('/') {
            if self.can_fix() {
                let trimmed = config.api_path.trim_matches('/');
                config.api_path = if trimmed.is_empty() {
                    "/".to_string()
                } else {
                    format!("/{trimmed}/")
                };
                fixed_issues.push(format!("Fixed api path to {}", config.api_path));
            } else {
                warnings.push(format!(
                    "Api path '{}' should start and end with '/'",
                    config.api_path
                ));
            }
        }

        // Credentials must come in pairs
        if config.app_id.is_empty() != config.app_key.is_empty() {
            if self.strict_mode {
                return Err(anyhow!(
                    "Configuration validation failed: {}",
                    ConfigError::IncompleteCredentials
                ));
            }
            warnings.push(format!(
                "{} - connecting without credentials",
                ConfigError::IncompleteCredentials
            ));
        }

        // Validate timeout settings
        if let Err(e) = validate_timeout("request_timeout", config.request_timeout_secs) {
            if self.can_fix() {
                warn!("Auto-fixing request timeout: {}", e);
                config.request_timeout_secs = defaults::REQUEST_TIMEOUT_SECS;
                fixed_issues.push(format!(
                    "Fixed request timeout to {} seconds",
                    config.request_timeout_secs
                ));
            } else {
                return Err(anyhow!("Configuration validation failed: {}", e));
            }
        }

        if let Err(e) = validate_timeout("connection_timeout", config.connection_timeout_secs) {
            if self.can_fix() {
                warn!("Auto-fixing connection timeout: {}", e);
                config.connection_timeout_secs = defaults::CONNECTION_TIMEOUT_SECS;
                fixed_issues.push(format!(
                    "Fixed connection timeout to {} seconds",
                    config.connection_timeout_secs
                ));
            } else {
                return Err(anyhow!("Configuration validation failed: {}", e));
            }
        }

        // The assembled urls must parse
        config
            .to_connection_config()
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        if !config.disable_file_logging {
            ensure_directory_exists(&config.logs_path, &mut fixed_issues)?;
        }

        if !fixed_issues.is_empty() {
            info!(
                "Auto-fixed {} configuration issue(s):",
                fixed_issues.len()
            );
            for fix in &fixed_issues {
                info!("  {}", fix);
            }
        }

        if !warnings.is_empty() {
            warn!("Configuration warnings:");
            for warning in &warnings {
                warn!("  {}", warning);
            }
        }

        let mut all_messages = fixed_issues;
        all_messages.extend(warnings);

        debug!("Configuration validation completed");
        Ok(all_messages)
    }
}

fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(defaults::MIN_TIMEOUT_SECS..=defaults::MAX_TIMEOUT_SECS).contains(&value) {
        return Err(ConfigError::InvalidTimeout {
            field: field.to_string(),
            value,
            min: defaults::MIN_TIMEOUT_SECS,
            max: defaults::MAX_TIMEOUT_SECS,
        });
    }
    Ok(())
}

fn ensure_directory_exists(path: &str, fixed_issues: &mut Vec<String>) -> Result<()> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        info!("Creating logs directory: {}", path);
        std::fs::create_dir_all(&path_buf)
            .map_err(|e| anyhow!("Failed to create logs directory '{}': {}", path, e))?;
        fixed_issues.push(format!("Created logs directory: {}", path));
    } else if !path_buf.is_dir() {
        return Err(anyhow!("Path '{}' exists but is not a directory", path));
    }

    Ok(())
}

impl ValidatedConfig {
    /// Connection settings for the ledger client
    pub fn to_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            protocol: self.protocol.clone(),
            host: self.host.clone().unwrap_or_default(),
            port: self.port.clone(),
            api_path: self.api_path.clone(),
            app_id: self.app_id.clone(),
            app_key: self.app_key.clone(),
        }
    }

    /// Create LedgerClientConfig from validated settings
    pub fn to_client_config(&self) -> LedgerClientConfig {
        LedgerClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connection_timeout: Duration::from_secs(self.connection_timeout_secs),
        }
    }

    /// Validate and load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P, strict_mode: bool, auto_fix: bool) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            anyhow!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            )
        })?;

        let mut config: ValidatedConfig = serde_json::from_str(&content).map_err(|e| {
            anyhow!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            )
        })?;

        let validator = ConfigValidator::new(strict_mode, auto_fix);
        let messages = validator.validate(&mut config)?;

        if !messages.is_empty() {
            info!(
                "Configuration loaded with {} adjustments/warnings",
                messages.len()
            );
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        std::fs::write(&path, content).map_err(|e| {
            anyhow!(
                "Failed to write config file '{}': {}",
                path.as_ref().display(),
                e
            )
        })?;

        info!("Configuration saved to: {}", path.as_ref().display());
        Ok(())
    }

    /// Write a template with every setting at its default value
    pub fn generate_template<P: AsRef<Path>>(path: P) -> Result<()> {
        let template = ValidatedConfig {
            host: Some("localhost".to_string()),
            port: "9984".to_string(),
            ..Default::default()
        };
        template.save_to_file(path)
    }
}
