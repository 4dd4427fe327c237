use anyhow::Context;
use regex::Regex;

pub const DEFAULT_ACCOUNT_PATTERN: &str = "^[a-z1-5.]{1,12}$";

pub trait Validator: Send + Sync {
    fn validate(&self, text: &str) -> bool;
}

/// Account names: 1 to 12 characters out of `a-z`, `1-5` and `.`, never
/// ending in a dot.
#[derive(Clone, Debug)]
pub struct AccountNameValidator {
    pattern: Regex,
}

impl AccountNameValidator {
    pub fn new(pattern: &str) -> anyhow::Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("invalid account pattern {pattern}"))?;
        Ok(Self { pattern })
    }
}

impl Validator for AccountNameValidator {
    fn validate(&self, text: &str) -> bool {
        if text.is_empty() || text.ends_with('.') || text.trim() != text {
            return false;
        }
        self.pattern.is_match(text)
    }
}

impl<F> Validator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn validate(&self, text: &str) -> bool {
        self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_validator() -> AccountNameValidator {
        AccountNameValidator::new(DEFAULT_ACCOUNT_PATTERN).expect("validator")
    }

    #[test]
    fn accepts_account_names() {
        let validator = default_validator();
        for name in ["alice", "eosio.token", "a", "abcde1234512", "bob.x"] {
            assert!(validator.validate(name), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        let validator = default_validator();
        for name in [
            "",
            "Alice",
            "alice.",
            " alice",
            "alice ",
            "abcde12345123",
            "alice6",
            "al-ice",
        ] {
            assert!(!validator.validate(name), "{name:?} should be rejected");
        }
    }

    #[test]
    fn custom_pattern_still_rejects_trailing_dot() {
        let validator = AccountNameValidator::new("^[a-z.]+$").expect("validator");
        assert!(validator.validate("averylongaccountname"));
        assert!(!validator.validate("alice."));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = AccountNameValidator::new("([a-z").unwrap_err();
        assert!(err.to_string().contains("invalid account pattern"));
    }

    #[test]
    fn closures_are_validators() {
        let validator = |text: &str| text == "alice";
        assert!(validator.validate("alice"));
        assert!(!Validator::validate(&validator, "bob"));
    }
}
