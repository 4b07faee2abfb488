//! Process-level configuration recognized by the core (spec §6).
//!
//! Parsing CLI flags themselves is out of scope (spec §1); this module only
//! owns the typed values and their environment-variable fallback, the same
//! way the rest of the corpus keeps config parsing independent of whichever
//! flag library the binary entrypoint happens to use.

use std::env;

use thiserror::Error;

/// `enable-violation-export` gates whether the connection reconciler is
/// constructed at all; `audit-connection` names the one [`Connection`] this
/// core accepts; `audit-channel` is forwarded opaquely to the export driver.
///
/// [`Connection`]: policy_types::Connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub enable_violation_export: bool,
    pub audit_connection: String,
    pub audit_channel: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {0} must be a boolean, got {1:?}")]
    InvalidBool(&'static str, String),
}

const ENV_ENABLE_EXPORT: &str = "POLICY_ENABLE_VIOLATION_EXPORT";
const ENV_AUDIT_CONNECTION: &str = "POLICY_AUDIT_CONNECTION";
const ENV_AUDIT_CHANNEL: &str = "POLICY_AUDIT_CHANNEL";

impl Config {
    /// Parses configuration from the process environment, following the
    /// three options documented in spec §6.
    pub fn from_env() -> Result<Self, Error> {
        let enable_violation_export = match env::var(ENV_ENABLE_EXPORT) {
            Ok(v) => parse_bool(ENV_ENABLE_EXPORT, &v)?,
            Err(_) => false,
        };
        let audit_connection =
            env::var(ENV_AUDIT_CONNECTION).map_err(|_| Error::Missing(ENV_AUDIT_CONNECTION))?;
        let audit_channel = env::var(ENV_AUDIT_CHANNEL).unwrap_or_default();
        Ok(Self {
            enable_violation_export,
            audit_connection,
            audit_channel,
        })
    }
}

fn parse_bool(name: &'static str, raw: &str) -> Result<bool, Error> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(Error::InvalidBool(name, other.to_string())),
    }
}
