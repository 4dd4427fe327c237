use crate::units::ConvertibleUnit;

pub const DEFAULT_PLACEHOLDER: &str = "-";
pub const DEFAULT_FRACTION_DIGITS: usize = 3;
pub const MAX_FRACTION_DIGITS: usize = 9;

/// Number rendering options. Passed explicitly to every formatting call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantityFormat {
    pub fraction_digits: usize,
    pub decimal_separator: String,
    pub grouping_separator: String,
    pub placeholder: String,
}

impl Default for QuantityFormat {
    fn default() -> Self {
        Self {
            fraction_digits: DEFAULT_FRACTION_DIGITS,
            decimal_separator: ".".to_string(),
            grouping_separator: ",".to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Converts `raw` (counted in `source`) into `target` and renders it with the
/// target unit symbol, e.g. `100.000 ms`. The conversion is exact for every
/// `u64`; the last kept digit is rounded half-up.
pub fn format_quantity<U: ConvertibleUnit>(
    raw: u64,
    source: U,
    target: U,
    format: &QuantityFormat,
) -> String {
    let Ok(digits) = u32::try_from(format.fraction_digits) else {
        return format.placeholder.clone();
    };
    let Some(scaled) = source.convert_scaled(raw, target, digits) else {
        return format.placeholder.clone();
    };
    format!("{} {}", format_scaled(scaled, digits, format), target.symbol())
}

fn format_scaled(scaled: u128, digits: u32, format: &QuantityFormat) -> String {
    let scale = 10u128.pow(digits);
    let integer = (scaled / scale).to_string();
    let mut out = group_digits(&integer, &format.grouping_separator);
    if digits > 0 {
        out.push_str(&format.decimal_separator);
        out.push_str(&format!(
            "{:0width$}",
            scaled % scale,
            width = format.fraction_digits
        ));
    }
    out
}

fn group_digits(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}
