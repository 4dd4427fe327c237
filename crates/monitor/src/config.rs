use crate::classify::Messages;
use crate::format::{QuantityFormat, MAX_FRACTION_DIGITS};
use crate::outcome::StalePolicy;
use crate::units::{DurationUnit, StorageUnit};
use crate::validate::DEFAULT_ACCOUNT_PATTERN;
use anyhow::Context;
pub use protocol::config::MonitorConfig;
use std::path::Path;

const DEFAULT_CPU_UNIT: DurationUnit = DurationUnit::Milliseconds;
const DEFAULT_NET_UNIT: StorageUnit = StorageUnit::Kilobytes;
const DEFAULT_RAM_UNIT: StorageUnit = StorageUnit::Kilobytes;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitSelection {
    pub cpu: DurationUnit,
    pub net: StorageUnit,
    pub ram: StorageUnit,
}

impl Default for UnitSelection {
    fn default() -> Self {
        Self {
            cpu: DEFAULT_CPU_UNIT,
            net: DEFAULT_NET_UNIT,
            ram: DEFAULT_RAM_UNIT,
        }
    }
}

/// Resolved pipeline settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub units: UnitSelection,
    pub format: QuantityFormat,
    pub messages: Messages,
    pub stale_policy: StalePolicy,
    pub account_pattern: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            units: UnitSelection::default(),
            format: QuantityFormat::default(),
            messages: Messages::default(),
            stale_policy: StalePolicy::default(),
            account_pattern: DEFAULT_ACCOUNT_PATTERN.to_string(),
        }
    }
}

impl Settings {
    pub fn from_config(config: MonitorConfig) -> anyhow::Result<Self> {
        let defaults = Settings::default();

        let units = config.units.unwrap_or_default();
        let units = UnitSelection {
            cpu: parse_or(units.cpu.as_deref(), defaults.units.cpu, "units.cpu")?,
            net: parse_or(units.net.as_deref(), defaults.units.net, "units.net")?,
            ram: parse_or(units.ram.as_deref(), defaults.units.ram, "units.ram")?,
        };

        let format_config = config.format.unwrap_or_default();
        let format = QuantityFormat {
            fraction_digits: format_config
                .fraction_digits
                .unwrap_or(defaults.format.fraction_digits),
            decimal_separator: format_config
                .decimal_separator
                .unwrap_or(defaults.format.decimal_separator),
            grouping_separator: format_config
                .grouping_separator
                .unwrap_or(defaults.format.grouping_separator),
            placeholder: format_config
                .placeholder
                .unwrap_or(defaults.format.placeholder),
        };
        validate_format(&format)?;

        let stale_policy = config
            .lookup
            .and_then(|lookup| lookup.discard_stale)
            .map(StalePolicy::from_discard_stale)
            .unwrap_or(defaults.stale_policy);
        let account_pattern = config
            .validation
            .and_then(|validation| validation.account_pattern)
            .unwrap_or(defaults.account_pattern);
        regex::Regex::new(&account_pattern)
            .with_context(|| format!("validation.account_pattern {account_pattern} is invalid"))?;

        Ok(Self {
            units,
            format,
            messages: Messages::from_config(config.messages.unwrap_or_default()),
            stale_policy,
            account_pattern,
        })
    }
}

fn parse_or<U>(value: Option<&str>, default: U, key: &str) -> anyhow::Result<U>
where
    U: std::str::FromStr,
    U::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(value) => value
            .parse()
            .with_context(|| format!("{key} has an unsupported unit")),
        None => Ok(default),
    }
}

fn validate_format(format: &QuantityFormat) -> anyhow::Result<()> {
    if format.fraction_digits > MAX_FRACTION_DIGITS {
        anyhow::bail!(
            "format.fraction_digits must be at most {}",
            MAX_FRACTION_DIGITS
        );
    }
    if format.decimal_separator.is_empty() {
        anyhow::bail!("format.decimal_separator cannot be empty");
    }
    if format.decimal_separator == format.grouping_separator {
        anyhow::bail!("format.decimal_separator and format.grouping_separator must differ");
    }
    if format.placeholder.is_empty() {
        anyhow::bail!("format.placeholder cannot be empty");
    }
    Ok(())
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: MonitorConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Settings::from_config(config).with_context(|| format!("invalid config {}", path.display()))
}
