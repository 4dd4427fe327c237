use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;

/// Raw resource counters as reported for one account. CPU figures are in
/// microseconds, NET figures in bytes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceLimitRaw {
    pub max: u64,
    pub available: u64,
    pub used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub core_liquid_balance: String,
    pub cpu_limit: ResourceLimitRaw,
    pub net_limit: ResourceLimitRaw,
    pub ram_quota: u64,
    pub ram_usage: u64,
}

/// Failure reported by an account lookup backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupFailure {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub network_failure: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl LookupFailure {
    pub fn status(code: u16) -> Self {
        Self {
            status_code: Some(code),
            network_failure: false,
            message: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            network_failure: true,
            message: Some(message.into()),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            network_failure: false,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status_code, self.network_failure) {
            (_, true) => write!(f, "network failure")?,
            (Some(code), false) => write!(f, "status {code}")?,
            (None, false) => write!(f, "lookup failed")?,
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}
