//! Domain types and validators for attrsync configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::row::DEFAULT_IDENTIFIER_COLUMN;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "connection.host",
    "connection.user",
    "connection.verify_tls",
    "connection.timeout_secs",
    "sync.identifier_column",
    "sync.inventory_refresh",
];
pub const VALID_REFRESH_POLICIES: &[&str] = &["per-row", "per-run"];
pub const VALID_BOOLS: &[&str] = &["true", "false"];

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.attrsync/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AttrsyncConfig {
    /// Default connection settings.
    pub connection: ConnectionConfig,
    /// Sync behaviour.
    pub sync: SyncConfig,
}

/// Connection defaults. The password is never stored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConnectionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Verify the server certificate. Off by default: vCenter appliances
    /// commonly run with self-signed certificates.
    pub verify_tls: bool,
    /// Per-request timeout for platform calls. `None` means no timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Header of the column holding machine names.
    pub identifier_column: String,
    /// How often the inventory tree is fetched.
    pub inventory_refresh: RefreshPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            identifier_column: DEFAULT_IDENTIFIER_COLUMN.to_string(),
            inventory_refresh: RefreshPolicy::default(),
        }
    }
}

/// When the inventory tree is (re-)fetched during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// Fetch before every row, so topology changes during a long run are seen.
    #[default]
    PerRow,
    /// Fetch once, on first use, and reuse it for the rest of the run.
    PerRun,
}

impl fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PerRow => "per-row",
            Self::PerRun => "per-run",
        })
    }
}

impl FromStr for RefreshPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-row" => Ok(Self::PerRow),
            "per-run" => Ok(Self::PerRun),
            other => Err(ConfigError::InvalidValue {
                key: "sync.inventory_refresh".to_string(),
                value: other.to_string(),
                valid: VALID_REFRESH_POLICIES.join(", "),
            }),
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        valid: valid.to_string(),
    };
    match key {
        "connection.verify_tls" if !VALID_BOOLS.contains(&value) => {
            Err(invalid(&VALID_BOOLS.join(", ")).into())
        }
        "connection.timeout_secs" if value.parse::<u64>().map_or(true, |n| n == 0) => {
            Err(invalid("a positive number of seconds").into())
        }
        "sync.inventory_refresh" => {
            value.parse::<RefreshPolicy>()?;
            Ok(())
        }
        "connection.host" | "connection.user" | "sync.identifier_column"
            if value.trim().is_empty() =>
        {
            Err(invalid("a non-empty string").into())
        }
        _ => Ok(()),
    }
}

impl AttrsyncConfig {
    /// Apply an already-validated `key = value` pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "connection.host" => self.connection.host = Some(value.to_string()),
            "connection.user" => self.connection.user = Some(value.to_string()),
            "connection.verify_tls" => self.connection.verify_tls = value == "true",
            "connection.timeout_secs" => self.connection.timeout_secs = value.parse().ok(),
            "sync.identifier_column" => self.sync.identifier_column = value.to_string(),
            "sync.inventory_refresh" => self.sync.inventory_refresh = value.parse()?,
            _ => anyhow::bail!("Unknown setting: {key}"),
        }
        Ok(())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
