use crate::error::PipelineError;
use protocol::config::MessagesConfig;
use serde::Serialize;

const ACCOUNT_NOT_FOUND_STATUS: u16 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ValidationFailed,
    AccountNotFound,
    ConnectionDown,
    Generic,
}

pub fn classify(error: &PipelineError) -> ErrorCategory {
    match error {
        PipelineError::ValidationFailed => ErrorCategory::ValidationFailed,
        PipelineError::LookupFailed(failure) => {
            if failure.status_code == Some(ACCOUNT_NOT_FOUND_STATUS) {
                ErrorCategory::AccountNotFound
            } else if failure.network_failure {
                ErrorCategory::ConnectionDown
            } else {
                ErrorCategory::Generic
            }
        }
    }
}

/// User-facing text for each error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Messages {
    pub validation_failed: String,
    pub account_not_found: String,
    pub connection_down: String,
    pub generic_failure: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            validation_failed: "Please enter a valid account name.".to_string(),
            account_not_found: "Account not found.".to_string(),
            connection_down: "Unable to reach the network. Check your connection.".to_string(),
            generic_failure: "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl Messages {
    pub fn from_config(config: MessagesConfig) -> Self {
        let defaults = Self::default();
        Self {
            validation_failed: config
                .validation_failed
                .unwrap_or(defaults.validation_failed),
            account_not_found: config
                .account_not_found
                .unwrap_or(defaults.account_not_found),
            connection_down: config.connection_down.unwrap_or(defaults.connection_down),
            generic_failure: config.generic_failure.unwrap_or(defaults.generic_failure),
        }
    }

    pub fn message(&self, category: ErrorCategory) -> &str {
        match category {
            ErrorCategory::ValidationFailed => &self.validation_failed,
            ErrorCategory::AccountNotFound => &self.account_not_found,
            ErrorCategory::ConnectionDown => &self.connection_down,
            ErrorCategory::Generic => &self.generic_failure,
        }
    }

    pub fn describe(&self, error: &PipelineError) -> String {
        self.message(classify(error)).to_string()
    }
}
