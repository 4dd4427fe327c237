use anyhow::Context;
use async_trait::async_trait;
use protocol::config::FixtureFile;
use protocol::{AccountSnapshot, LookupFailure};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const UNKNOWN_ACCOUNT_STATUS: u16 = 500;

/// Source of account snapshots. Implementations report every failure as a
/// `LookupFailure`; the pipeline never sees a panic or a dropped request.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn lookup(&self, account: &str) -> Result<AccountSnapshot, LookupFailure>;
}

enum FixtureEntry {
    Account(AccountSnapshot),
    Failure(LookupFailure),
}

struct Fixture {
    latency: Option<Duration>,
    entry: FixtureEntry,
}

/// Lookup backed by a static table of canned responses.
pub struct FixtureLookup {
    fixtures: HashMap<String, Fixture>,
}

impl FixtureLookup {
    pub fn from_file(file: FixtureFile) -> anyhow::Result<Self> {
        let mut fixtures = HashMap::new();
        let accounts = file.accounts.into_iter().map(|account| {
            (
                account.name,
                account.latency_ms,
                FixtureEntry::Account(account.snapshot),
            )
        });
        let failures = file.failures.into_iter().map(|failure| {
            (
                failure.name,
                failure.latency_ms,
                FixtureEntry::Failure(failure.failure),
            )
        });
        for (name, latency_ms, entry) in accounts.chain(failures) {
            if name.trim().is_empty() {
                anyhow::bail!("fixture name cannot be empty");
            }
            if fixtures.contains_key(&name) {
                anyhow::bail!("duplicate fixture name: {name}");
            }
            let fixture = Fixture {
                latency: latency_ms.map(Duration::from_millis),
                entry,
            };
            fixtures.insert(name, fixture);
        }
        Ok(Self { fixtures })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixtures {}", path.display()))?;
        let file: FixtureFile = toml::from_str(&raw)
            .with_context(|| format!("failed to parse fixtures {}", path.display()))?;
        Self::from_file(file).with_context(|| format!("invalid fixtures {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

#[async_trait]
impl AccountLookup for FixtureLookup {
    async fn lookup(&self, account: &str) -> Result<AccountSnapshot, LookupFailure> {
        let Some(fixture) = self.fixtures.get(account) else {
            return Err(LookupFailure::status(UNKNOWN_ACCOUNT_STATUS)
                .with_message(format!("unknown account {account}")));
        };
        if let Some(latency) = fixture.latency {
            tokio::time::sleep(latency).await;
        }
        match &fixture.entry {
            FixtureEntry::Account(snapshot) => Ok(snapshot.clone()),
            FixtureEntry::Failure(failure) => Err(failure.clone()),
        }
    }
}
