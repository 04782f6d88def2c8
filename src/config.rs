// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup; any error here is fatal.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | redb directory for identities | unset (in-memory) |
//! | `CHALLENGE_TEMPLATE_PATH` | Challenge template file, read per challenge | built-in text |
//! | `AUTH_SCHEMES` | Enabled schemes, comma separated | `evm,cardano` |
//! | `ADMIN_ADDRESS` | Privileged wallet address | unset |
//! | `EIP712_DOMAIN_NAME` | EIP-712 domain `name` | unset |
//! | `EIP712_DOMAIN_VERSION` | EIP-712 domain `version` | unset |
//! | `EIP712_CHAIN_ID` | EIP-712 domain `chainId` | unset |
//! | `EIP712_VERIFYING_CONTRACT` | EIP-712 domain `verifyingContract` | unset |
//! | `SESSION_TTL_SECS` | Session lifetime in seconds | `86400` |
//! | `SESSION_CAPACITY` | Maximum live sessions | `100000` |
//! | `SESSION_COOKIE_SECURE` | Mark the session cookie `Secure` | `true` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::auth::address::{Scheme, WalletAddress};
use crate::auth::challenge::{ChallengeTemplate, DomainDescriptor};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Directory holding `identities.redb`. Unset keeps identities in memory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Template file path. Read on every challenge so edits apply without restart.
pub const CHALLENGE_TEMPLATE_PATH_ENV: &str = "CHALLENGE_TEMPLATE_PATH";

pub const AUTH_SCHEMES_ENV: &str = "AUTH_SCHEMES";
pub const ADMIN_ADDRESS_ENV: &str = "ADMIN_ADDRESS";

pub const EIP712_DOMAIN_NAME_ENV: &str = "EIP712_DOMAIN_NAME";
pub const EIP712_DOMAIN_VERSION_ENV: &str = "EIP712_DOMAIN_VERSION";
pub const EIP712_CHAIN_ID_ENV: &str = "EIP712_CHAIN_ID";
pub const EIP712_VERIFYING_CONTRACT_ENV: &str = "EIP712_VERIFYING_CONTRACT";

pub const SESSION_TTL_SECS_ENV: &str = "SESSION_TTL_SECS";
pub const SESSION_CAPACITY_ENV: &str = "SESSION_CAPACITY";
pub const SESSION_COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;
pub const DEFAULT_SESSION_CAPACITY: usize = 100_000;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("{AUTH_SCHEMES_ENV} enables no schemes")]
    NoSchemes,
}

impl ConfigError {
    fn invalid(var: &'static str, message: impl ToString) -> Self {
        ConfigError::Invalid {
            var,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Fully parsed startup configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub challenge_template: ChallengeTemplate,
    pub schemes: Vec<Scheme>,
    pub admin_address: Option<WalletAddress>,
    pub domain: DomainDescriptor,
    pub session_ttl_secs: i64,
    pub session_capacity: usize,
    pub session_cookie_secure: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;

        let schemes = match var(AUTH_SCHEMES_ENV) {
            Some(list) => parse_schemes(&list)?,
            None => Scheme::ALL.to_vec(),
        };

        let admin_address = var(ADMIN_ADDRESS_ENV)
            .map(|raw| {
                WalletAddress::parse_any(&raw)
                    .map_err(|e| ConfigError::invalid(ADMIN_ADDRESS_ENV, e))
            })
            .transpose()?;

        let verifying_contract = var(EIP712_VERIFYING_CONTRACT_ENV)
            .map(|raw| {
                Address::from_str(&raw)
                    .map_err(|e| ConfigError::invalid(EIP712_VERIFYING_CONTRACT_ENV, e))
            })
            .transpose()?;
        let chain_id = var(EIP712_CHAIN_ID_ENV)
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|e| ConfigError::invalid(EIP712_CHAIN_ID_ENV, e))
            })
            .transpose()?;
        let domain = DomainDescriptor {
            name: var(EIP712_DOMAIN_NAME_ENV),
            version: var(EIP712_DOMAIN_VERSION_ENV),
            chain_id,
            verifying_contract,
        };

        let session_ttl_secs =
            parse_or(var(SESSION_TTL_SECS_ENV), SESSION_TTL_SECS_ENV, DEFAULT_SESSION_TTL_SECS)?;
        if session_ttl_secs <= 0 {
            return Err(ConfigError::invalid(SESSION_TTL_SECS_ENV, "must be positive"));
        }
        let session_capacity =
            parse_or(var(SESSION_CAPACITY_ENV), SESSION_CAPACITY_ENV, DEFAULT_SESSION_CAPACITY)?;
        if session_capacity == 0 {
            return Err(ConfigError::invalid(SESSION_CAPACITY_ENV, "must be positive"));
        }

        let session_cookie_secure = match var(SESSION_COOKIE_SECURE_ENV) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::invalid(SESSION_COOKIE_SECURE_ENV, "expected true or false")
            })?,
            None => true,
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host,
            port,
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
            challenge_template: var(CHALLENGE_TEMPLATE_PATH_ENV)
                .map(|p| ChallengeTemplate::File(PathBuf::from(p)))
                .unwrap_or_default(),
            schemes,
            admin_address,
            domain,
            session_ttl_secs,
            session_capacity,
            session_cookie_secure,
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse().map_err(|e| ConfigError::invalid(var, e)),
        None => Ok(default),
    }
}

fn parse_schemes(list: &str) -> Result<Vec<Scheme>, ConfigError> {
    let mut schemes = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let scheme = part
            .parse::<Scheme>()
            .map_err(|e| ConfigError::invalid(AUTH_SCHEMES_ENV, e))?;
        if !schemes.contains(&scheme) {
            schemes.push(scheme);
        }
    }
    if schemes.is_empty() {
        return Err(ConfigError::NoSchemes);
    }
    Ok(schemes)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_address(), "0.0.0.0:8080");
        assert!(cfg.data_dir.is_none());
        assert_eq!(cfg.schemes, Scheme::ALL.to_vec());
        assert!(cfg.admin_address.is_none());
        assert_eq!(cfg.domain, DomainDescriptor::default());
        assert_eq!(cfg.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert_eq!(cfg.session_capacity, DEFAULT_SESSION_CAPACITY);
        assert!(cfg.session_cookie_secure);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(matches!(cfg.challenge_template, ChallengeTemplate::Static(_)));
    }

    #[test]
    fn parses_overrides() {
        let cfg = config(&[
            ("PORT", "9000"),
            ("DATA_DIR", "/var/lib/auth"),
            ("CHALLENGE_TEMPLATE_PATH", "/etc/auth/challenge.txt"),
            ("AUTH_SCHEMES", " cardano , cardano "),
            ("ADMIN_ADDRESS", "0xA11CE000000000000000000000000000000A11CE"),
            ("EIP712_DOMAIN_NAME", "Relational"),
            ("EIP712_CHAIN_ID", "43114"),
            ("SESSION_TTL_SECS", "60"),
            ("SESSION_COOKIE_SECURE", "false"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("/var/lib/auth")));
        assert!(matches!(cfg.challenge_template, ChallengeTemplate::File(_)));
        assert_eq!(cfg.schemes, vec![Scheme::Cardano]);
        assert_eq!(
            cfg.admin_address.unwrap().as_str(),
            "0xa11ce000000000000000000000000000000a11ce"
        );
        assert_eq!(cfg.domain.name.as_deref(), Some("Relational"));
        assert_eq!(cfg.domain.chain_id, Some(43114));
        assert_eq!(cfg.session_ttl_secs, 60);
        assert!(!cfg.session_cookie_secure);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(config(&[("AUTH_SCHEMES", "bitcoin")]), Err(ConfigError::Invalid { .. })));
        assert!(matches!(config(&[("AUTH_SCHEMES", ",")]), Err(ConfigError::NoSchemes)));
        assert!(config(&[("ADMIN_ADDRESS", "0x123")]).is_err());
        assert!(config(&[("PORT", "http")]).is_err());
        assert!(config(&[("SESSION_TTL_SECS", "0")]).is_err());
        assert!(config(&[("SESSION_COOKIE_SECURE", "maybe")]).is_err());
        assert!(config(&[("EIP712_VERIFYING_CONTRACT", "nope")]).is_err());
    }
}
