use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A display unit that can express a quantity measured in a fixed base unit.
pub trait ConvertibleUnit: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every unit of the family, in picker order.
    const ALL: &'static [Self];

    /// Unit the raw counters are reported in.
    fn base() -> Self;

    /// Size of one of `self` expressed in base units.
    fn factor(self) -> u64;

    fn symbol(self) -> &'static str;

    fn name(self) -> &'static str;

    /// `raw` counted in `self`, expressed in `target` and scaled by
    /// `10^fraction_digits`, rounded half-up. Integer arithmetic throughout,
    /// so every `u64` counter converts exactly. `None` on overflow.
    fn convert_scaled(self, raw: u64, target: Self, fraction_digits: u32) -> Option<u128> {
        let numerator = u128::from(raw)
            .checked_mul(u128::from(self.factor()))?
            .checked_mul(10u128.checked_pow(fraction_digits)?)?;
        let denominator = u128::from(target.factor());
        numerator
            .checked_add(denominator / 2)
            .map(|rounded| rounded / denominator)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    #[serde(alias = "us", alias = "µs")]
    Microseconds,
    #[serde(alias = "ms")]
    Milliseconds,
    #[serde(alias = "s")]
    Seconds,
    #[serde(alias = "min")]
    Minutes,
    #[serde(alias = "hr")]
    Hours,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageUnit {
    #[serde(alias = "b")]
    Bytes,
    #[serde(alias = "kb")]
    Kilobytes,
    #[serde(alias = "mb")]
    Megabytes,
    #[serde(alias = "gb")]
    Gigabytes,
    #[serde(alias = "tb")]
    Terabytes,
}

impl ConvertibleUnit for DurationUnit {
    const ALL: &'static [Self] = &[
        DurationUnit::Microseconds,
        DurationUnit::Milliseconds,
        DurationUnit::Seconds,
        DurationUnit::Minutes,
        DurationUnit::Hours,
    ];

    fn base() -> Self {
        DurationUnit::Microseconds
    }

    fn factor(self) -> u64 {
        match self {
            DurationUnit::Microseconds => 1,
            DurationUnit::Milliseconds => 1_000,
            DurationUnit::Seconds => 1_000_000,
            DurationUnit::Minutes => 60_000_000,
            DurationUnit::Hours => 3_600_000_000,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            DurationUnit::Microseconds => "µs",
            DurationUnit::Milliseconds => "ms",
            DurationUnit::Seconds => "s",
            DurationUnit::Minutes => "min",
            DurationUnit::Hours => "hr",
        }
    }

    fn name(self) -> &'static str {
        match self {
            DurationUnit::Microseconds => "microseconds",
            DurationUnit::Milliseconds => "milliseconds",
            DurationUnit::Seconds => "seconds",
            DurationUnit::Minutes => "minutes",
            DurationUnit::Hours => "hours",
        }
    }
}

// Decimal multiples, matching how storage sizes are shown to users.
impl ConvertibleUnit for StorageUnit {
    const ALL: &'static [Self] = &[
        StorageUnit::Bytes,
        StorageUnit::Kilobytes,
        StorageUnit::Megabytes,
        StorageUnit::Gigabytes,
        StorageUnit::Terabytes,
    ];

    fn base() -> Self {
        StorageUnit::Bytes
    }

    fn factor(self) -> u64 {
        match self {
            StorageUnit::Bytes => 1,
            StorageUnit::Kilobytes => 1_000,
            StorageUnit::Megabytes => 1_000_000,
            StorageUnit::Gigabytes => 1_000_000_000,
            StorageUnit::Terabytes => 1_000_000_000_000,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            StorageUnit::Bytes => "B",
            StorageUnit::Kilobytes => "kB",
            StorageUnit::Megabytes => "MB",
            StorageUnit::Gigabytes => "GB",
            StorageUnit::Terabytes => "TB",
        }
    }

    fn name(self) -> &'static str {
        match self {
            StorageUnit::Bytes => "bytes",
            StorageUnit::Kilobytes => "kilobytes",
            StorageUnit::Megabytes => "megabytes",
            StorageUnit::Gigabytes => "gigabytes",
            StorageUnit::Terabytes => "terabytes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownUnit(pub String);

impl fmt::Display for UnknownUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown unit: {}", self.0)
    }
}

impl std::error::Error for UnknownUnit {}

fn parse_unit<U: ConvertibleUnit>(value: &str) -> Result<U, UnknownUnit> {
    let trimmed = value.trim();
    let lowered = trimmed.to_lowercase();
    U::ALL
        .iter()
        .copied()
        .find(|unit| unit.name() == lowered || unit.symbol().to_lowercase() == lowered)
        .ok_or_else(|| UnknownUnit(trimmed.to_string()))
}

impl FromStr for DurationUnit {
    type Err = UnknownUnit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "us" | "μs" => Ok(DurationUnit::Microseconds),
            other => parse_unit(other),
        }
    }
}

impl FromStr for StorageUnit {
    type Err = UnknownUnit;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_unit(value)
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for StorageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The two static picker lists offered to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnitCatalog {
    pub duration: Vec<DurationUnit>,
    pub storage: Vec<StorageUnit>,
}

impl UnitCatalog {
    pub fn new() -> Self {
        Self {
            duration: DurationUnit::ALL.to_vec(),
            storage: StorageUnit::ALL.to_vec(),
        }
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::new()
    }
}
