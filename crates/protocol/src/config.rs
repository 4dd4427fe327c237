use crate::{AccountSnapshot, LookupFailure};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct MonitorConfig {
    pub units: Option<UnitDefaults>,
    pub format: Option<FormatConfig>,
    pub messages: Option<MessagesConfig>,
    pub lookup: Option<LookupConfig>,
    pub validation: Option<ValidationConfig>,
}

/// Initial unit selections; values are unit names or symbols (`ms`, `kilobytes`).
#[derive(Debug, Default, Deserialize)]
pub struct UnitDefaults {
    pub cpu: Option<String>,
    pub net: Option<String>,
    pub ram: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FormatConfig {
    pub fraction_digits: Option<usize>,
    pub decimal_separator: Option<String>,
    pub grouping_separator: Option<String>,
    pub placeholder: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagesConfig {
    pub validation_failed: Option<String>,
    pub account_not_found: Option<String>,
    pub connection_down: Option<String>,
    pub generic_failure: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupConfig {
    pub discard_stale: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidationConfig {
    pub account_pattern: Option<String>,
}

/// Canned lookup responses, used by the fixture lookup adapter.
#[derive(Debug, Default, Deserialize)]
pub struct FixtureFile {
    #[serde(default)]
    pub accounts: Vec<FixtureAccount>,
    #[serde(default)]
    pub failures: Vec<FixtureFailure>,
}

#[derive(Debug, Deserialize)]
pub struct FixtureAccount {
    pub name: String,
    #[serde(default)]
    pub latency_ms: Option<u64>,
    #[serde(flatten)]
    pub snapshot: AccountSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct FixtureFailure {
    pub name: String,
    #[serde(default)]
    pub latency_ms: Option<u64>,
    #[serde(flatten)]
    pub failure: LookupFailure,
}
