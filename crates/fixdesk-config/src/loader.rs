// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for FixDesk.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and pick the format from its extension
//! 2. Resolve `${VAR}` and `${VAR:default}` placeholders in the raw text
//! 3. Deserialize into [`FixdeskConfig`]
//! 4. Apply `FIXDESK_*` environment overrides
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! FIXDESK_SERVER_HOST=127.0.0.1
//! FIXDESK_SERVER_PORT=9090
//! FIXDESK_AUTH_SIGNING_KEY=...
//! FIXDESK_RATE_LIMIT_ENABLED=false
//! FIXDESK_RATE_LIMIT_RATE=10
//! FIXDESK_RATE_LIMIT_BURST=20
//! ```

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{FixdeskConfig, SecretValue};

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "FIXDESK";

// =============================================================================
// EnvSource
// =============================================================================

/// Where placeholders and overrides are looked up.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The process environment.
    #[default]
    Process,
    /// A fixed set of variables.
    Map(HashMap<String, String>),
}

impl EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        match self {
            Self::Process => env::var(name).ok(),
            Self::Map(vars) => vars.get(name).cloned(),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use fixdesk_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("fixdesk.yaml").unwrap();
/// println!("listening on {}", config.server.bind_address());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: String,
    resolve_env_vars: bool,
    env: EnvSource,
}

impl ConfigLoader {
    /// Creates a loader reading the process environment with the `FIXDESK` prefix.
    pub fn new() -> Self {
        Self {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            resolve_env_vars: true,
            env: EnvSource::Process,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables placeholder resolution and overrides.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Sets where environment lookups go.
    pub fn with_env_source(mut self, source: EnvSource) -> Self {
        self.env = source;
        self
    }

    /// Loads and validates configuration from a file.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<FixdeskConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let format = ConfigFormat::from_path(path)?;

        let config = self.load_from_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })?;

        info!("Configuration loaded successfully");
        debug!(
            modules = config.modules.len(),
            roles = config.permissions.roles.len(),
            "Configuration summary"
        );
        Ok(config)
    }

    /// Loads and validates configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<FixdeskConfig> {
        let mut config = if self.resolve_env_vars {
            parse_str(&self.resolve_env_placeholders(content), format)?
        } else {
            parse_str(content, format)?
        };

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolves `${VAR}` and `${VAR:default}` placeholders.
    ///
    /// Unknown variables without a default are left in place.
    fn resolve_env_placeholders(&self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find('}') else {
                result.push_str(&rest[start..]);
                return result;
            };

            let body = &after[..end];
            let (name, default) = match body.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (body, None),
            };

            match (self.env.get(name), default) {
                (Some(value), _) => result.push_str(&value),
                (None, Some(default)) => result.push_str(default),
                (None, None) => {
                    warn!("Environment variable '{}' not found", name);
                    result.push_str(&rest[start..start + 3 + end]);
                }
            }
            rest = &after[end + 1..];
        }

        result.push_str(rest);
        result
    }

    fn apply_env_overrides(&self, config: &mut FixdeskConfig) -> ConfigResult<()> {
        if let Some(value) = self.var("SERVER_HOST") {
            config.server.host = value;
        }
        if let Some(port) = self.parsed::<u16>("SERVER_PORT", "expected valid port number")? {
            config.server.port = port;
        }
        if let Some(value) = self.var("AUTH_SIGNING_KEY") {
            config.auth.signing_key = SecretValue::new(value);
        }
        if let Some(value) = self.var("RATE_LIMIT_ENABLED") {
            config.rate_limit.enabled = parse_bool(&value);
        }
        if let Some(rate) = self.parsed::<f64>("RATE_LIMIT_RATE", "expected a number")? {
            config.rate_limit.rate = rate;
        }
        if let Some(burst) = self.parsed::<u32>("RATE_LIMIT_BURST", "expected a whole number")? {
            config.rate_limit.burst = burst;
        }
        Ok(())
    }

    fn var(&self, suffix: &str) -> Option<String> {
        self.env.get(&format!("{}_{}", self.env_prefix, suffix))
    }

    fn parsed<T: FromStr>(&self, suffix: &str, expected: &str) -> ConfigResult<Option<T>> {
        let name = format!("{}_{}", self.env_prefix, suffix);
        match self.env.get(&name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::invalid_env_var(name, expected)),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_str(content: &str, format: ConfigFormat) -> ConfigResult<FixdeskConfig> {
    match format {
        ConfigFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat { extension: ext }),
        }
    }
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with the default loader.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<FixdeskConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the default loader.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<FixdeskConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RateLimitKey;
    use std::io::Write;
    use std::time::Duration;

    fn loader(vars: &[(&str, &str)]) -> ConfigLoader {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigLoader::new().with_env_source(EnvSource::Map(map))
    }

    const YAML: &str = r#"
server:
  port: 9000
auth:
  signing_key: "${KEY:yaml-default-signing-key-0123456789abcdef}"
rate_limit:
  rate: 2.5
  burst: 10
  key_by: address
cache:
  default_ttl: 120
modules:
  images:
    max_bytes: 2048
"#;

    #[test]
    fn test_load_yaml() {
        let config = loader(&[]).load_from_str(YAML, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.signing_key.expose(), "yaml-default-signing-key-0123456789abcdef");
        assert_eq!(config.rate_limit.rate, 2.5);
        assert_eq!(config.rate_limit.burst, 10);
        assert_eq!(config.rate_limit.key_by, RateLimitKey::Address);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(120));
        assert_eq!(config.module("images")["max_bytes"], 2048);
    }

    #[test]
    fn test_placeholder_from_env() {
        let config = loader(&[("KEY", "from-env-signing-key-0123456789abcdef")])
            .load_from_str(YAML, ConfigFormat::Yaml)
            .unwrap();
        assert_eq!(config.auth.signing_key.expose(), "from-env-signing-key-0123456789abcdef");
    }

    #[test]
    fn test_unresolved_placeholder_kept() {
        let loader = loader(&[]);
        assert_eq!(loader.resolve_env_placeholders("a ${MISSING} b"), "a ${MISSING} b");
        assert_eq!(loader.resolve_env_placeholders("x ${UNCLOSED"), "x ${UNCLOSED");
        assert_eq!(loader.resolve_env_placeholders("${A:1}${B:2}"), "12");
    }

    #[test]
    fn test_env_overrides() {
        let config = loader(&[
            ("FIXDESK_SERVER_PORT", "7070"),
            ("FIXDESK_RATE_LIMIT_ENABLED", "false"),
            ("FIXDESK_RATE_LIMIT_BURST", "3"),
        ])
        .load_from_str(YAML, ConfigFormat::Yaml)
        .unwrap();

        assert_eq!(config.server.port, 7070);
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.rate_limit.burst, 3);
    }

    #[test]
    fn test_invalid_env_override() {
        let err = loader(&[("FIXDESK_SERVER_PORT", "not-a-port")])
            .load_from_str(YAML, ConfigFormat::Yaml)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn test_env_disabled_skips_overrides() {
        let config = loader(&[("FIXDESK_SERVER_PORT", "7070")])
            .with_env_vars(false)
            .load_from_str(
                "[auth]\nsigning_key = \"toml-signing-key-0123456789abcdef\"\n",
                ConfigFormat::Toml,
            )
            .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_missing_key_fails_validation() {
        let err = loader(&[])
            .load_from_str("server:\n  port: 80\n", ConfigFormat::Yaml)
            .unwrap_err();
        assert_eq!(err.field(), Some("auth.signing_key"));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"auth": {{"signing_key": "json-signing-key-0123456789abcdef"}}, "server": {{"port": 8181}}}}"#
        )
        .unwrap();

        let config = loader(&[]).load(file.path()).unwrap();
        assert_eq!(config.server.port, 8181);
    }

    #[test]
    fn test_parse_error_carries_path() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "server: [not, a, map").unwrap();

        let err = loader(&[]).load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/fixdesk.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.TOML")).unwrap(), ConfigFormat::Toml);
        assert!(ConfigFormat::from_path(Path::new("a.ini")).is_err());
    }
}
