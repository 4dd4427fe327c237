use serde::Serialize;

/// Where the current lookup cycle stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    #[default]
    Idle,
    /// Never published: validation finishes within the trigger step.
    Validating,
    LookingUp,
    Failed,
    Succeeded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LimitView {
    pub max: String,
    pub available: String,
    pub used: String,
    pub unit: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RamView {
    pub quota: String,
    pub usage: String,
    pub unit: String,
}

/// Everything the presentation layer renders for one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResourceView {
    /// Number of search triggers applied so far.
    pub generation: u64,
    /// Lookups issued but not yet resolved, stale ones included.
    pub pending_lookups: u64,
    pub state: CycleState,
    pub error_message: Option<String>,
    pub balance: String,
    pub cpu: LimitView,
    pub net: LimitView,
    pub ram: RamView,
}

impl ResourceView {
    /// All formatted quantity fields, CPU then NET then RAM.
    pub fn quantities(&self) -> [&str; 8] {
        [
            self.cpu.max.as_str(),
            self.cpu.available.as_str(),
            self.cpu.used.as_str(),
            self.net.max.as_str(),
            self.net.available.as_str(),
            self.net.used.as_str(),
            self.ram.quota.as_str(),
            self.ram.usage.as_str(),
        ]
    }
}
