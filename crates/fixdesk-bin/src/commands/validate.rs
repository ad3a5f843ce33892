// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use fixdesk_api::ModuleRegistry;
use fixdesk_config::FixdeskConfig;
use fixdesk_config::schema::RECOMMENDED_KEY_LEN;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::default_modules;

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = fixdesk_config::load_config(config_path)
        .map_err(|e| BinError::config(format!("Configuration validation failed: {}", e)))?;

    // Module blocks are only checked by their owners.
    let mut registry = ModuleRegistry::new();
    for module in default_modules() {
        registry.register(module)?;
    }
    registry.configure_all(&config)?;
    let known: Vec<String> = registry.describe().into_iter().map(|m| m.name).collect();

    let warnings = validation_warnings(&config, &known);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Listen: {}", config.server.bind_address());
            println!("  Issuer: {}", config.auth.issuer.as_deref().unwrap_or("(any)"));
            println!("  Roles: {}", config.permissions.roles.len());
            println!(
                "  Rate limit: {}",
                if config.rate_limit.enabled {
                    format!("{}/s burst {}", config.rate_limit.rate, config.rate_limit.burst)
                } else {
                    "disabled".to_string()
                }
            );
            println!("  Modules: {}", known.join(", "));

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!(
                    "{}",
                    serde_json::to_string_pretty(&redacted(&config))
                        .unwrap_or_else(|_| "(serialization error)".to_string())
                );
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "bind_address": config.server.bind_address(),
                    "issuer": config.auth.issuer,
                    "role_count": config.permissions.roles.len(),
                    "rate_limit_enabled": config.rate_limit.enabled,
                    "modules": known,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(redacted(&config)) } else { None },
            });
            let text = serde_json::to_string_pretty(&output)
                .map_err(|e| BinError::runtime(format!("Failed to render output: {}", e)))?;
            println!("{}", text);
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Non-fatal findings for a configuration that already passed validation.
pub fn validation_warnings(config: &FixdeskConfig, known_modules: &[String]) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.auth.signing_key.len() < RECOMMENDED_KEY_LEN {
        warnings.push(format!(
            "Signing key is shorter than {} bytes",
            RECOMMENDED_KEY_LEN
        ));
    }

    if !config.rate_limit.enabled {
        warnings.push("Rate limiting is disabled".to_string());
    }

    if config.server.cors.allowed_origins.is_empty() {
        warnings.push("CORS allows any origin".to_string());
    }

    if config.auth.issuer.is_none() {
        warnings.push("No token issuer configured; any issuer is accepted".to_string());
    }

    for name in config.modules.keys() {
        if !known_modules.iter().any(|known| known == name) {
            warnings.push(format!("Configuration for unknown module '{}'", name));
        }
    }

    warnings
}

fn redacted(config: &FixdeskConfig) -> serde_json::Value {
    let mut value = serde_json::to_value(config).unwrap_or(serde_json::Value::Null);
    if let Some(auth) = value.get_mut("auth").and_then(|a| a.as_object_mut()) {
        auth.insert("signing_key".to_string(), serde_json::Value::from("***"));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixdesk_config::{AuthConfig, CorsConfig};

    fn strong_config() -> FixdeskConfig {
        let mut config = FixdeskConfig {
            auth: AuthConfig::with_key("a-signing-key-that-is-long-enough-0123"),
            ..Default::default()
        };
        config.auth.issuer = Some("fixdesk".to_string());
        config.server.cors = CorsConfig {
            allowed_origins: vec!["https://desk.example.com".to_string()],
            ..Default::default()
        };
        config.rate_limit.enabled = true;
        config
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        let warnings = validation_warnings(&strong_config(), &["images".to_string()]);
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_short_key_warns() {
        let mut config = strong_config();
        config.auth = AuthConfig::with_key("short");
        config.auth.issuer = Some("fixdesk".to_string());

        let warnings = validation_warnings(&config, &[]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Signing key"));
    }

    #[test]
    fn test_unknown_module_warns() {
        let mut config = strong_config();
        config
            .modules
            .insert("reports".to_string(), serde_json::json!({}));

        let warnings = validation_warnings(&config, &["images".to_string()]);
        assert_eq!(warnings, vec!["Configuration for unknown module 'reports'"]);
    }

    #[test]
    fn test_redacted_hides_key() {
        let value = redacted(&strong_config());
        assert_eq!(value["auth"]["signing_key"], "***");
    }
}
