//! The reactive core.
//!
//! Inputs are combined with two different rules and they are not
//! interchangeable:
//!
//! * merge: the validation branch and the lookup branch feed one error
//!   channel; whichever fires last is the active error, nothing is buffered
//!   beyond that latest value.
//! * combine-latest: every quantity field needs both a raw value (from a
//!   successful lookup) and a unit selection before it renders. Afterwards a
//!   change on either side re-renders the field.
//!
//! Errors are merged into the fields directly, so the placeholder shows up
//! even when a field has never been ready.

use crate::classify::{classify, ErrorCategory, Messages};
use crate::config::{Settings, UnitSelection};
use crate::error::{PipelineClosed, PipelineError};
use crate::field::{BalanceField, QuantityField};
use crate::format::QuantityFormat;
use crate::lookup::AccountLookup;
use crate::outcome::{LookupOutcome, LookupTicket, Outcome, StalePolicy};
use crate::units::{ConvertibleUnit, DurationUnit, StorageUnit, UnitCatalog};
use crate::validate::Validator;
use crate::view::{CycleState, LimitView, RamView, ResourceView};
use futures_util::FutureExt;
use protocol::{AccountSnapshot, LookupFailure};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFamily {
    Cpu,
    Net,
    Ram,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    TriggerAccepted {
        generation: u64,
        account: String,
    },
    ValidationRejected {
        generation: u64,
    },
    LookupResolved {
        generation: u64,
        account: String,
        category: Option<ErrorCategory>,
    },
    StaleDiscarded {
        generation: u64,
        latest: u64,
    },
    UnitChanged {
        family: UnitFamily,
        unit: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    Rejected { generation: u64 },
    Lookup(LookupTicket),
}

struct LimitFields<U: ConvertibleUnit> {
    max: QuantityField<U>,
    available: QuantityField<U>,
    used: QuantityField<U>,
    unit: U,
}

impl<U: ConvertibleUnit> LimitFields<U> {
    fn new(
        unit: U,
        max: fn(&AccountSnapshot) -> u64,
        available: fn(&AccountSnapshot) -> u64,
        used: fn(&AccountSnapshot) -> u64,
        format: &QuantityFormat,
    ) -> Self {
        let mut fields = Self {
            max: QuantityField::new(max, format),
            available: QuantityField::new(available, format),
            used: QuantityField::new(used, format),
            unit,
        };
        fields.on_unit(unit, format);
        fields
    }

    fn on_snapshot(&mut self, snapshot: &AccountSnapshot, format: &QuantityFormat) {
        for field in [&mut self.max, &mut self.available, &mut self.used] {
            field.on_snapshot(snapshot, format);
        }
    }

    fn on_unit(&mut self, unit: U, format: &QuantityFormat) {
        self.unit = unit;
        for field in [&mut self.max, &mut self.available, &mut self.used] {
            field.on_unit(unit, format);
        }
    }

    fn on_error(&mut self, format: &QuantityFormat) {
        for field in [&mut self.max, &mut self.available, &mut self.used] {
            field.on_error(format);
        }
    }

    fn view(&self) -> LimitView {
        LimitView {
            max: self.max.value().to_string(),
            available: self.available.value().to_string(),
            used: self.used.value().to_string(),
            unit: self.unit.symbol().to_string(),
        }
    }
}

struct RamFields {
    quota: QuantityField<StorageUnit>,
    usage: QuantityField<StorageUnit>,
    unit: StorageUnit,
}

impl RamFields {
    fn new(unit: StorageUnit, format: &QuantityFormat) -> Self {
        let mut fields = Self {
            quota: QuantityField::new(|snapshot| snapshot.ram_quota, format),
            usage: QuantityField::new(|snapshot| snapshot.ram_usage, format),
            unit,
        };
        fields.on_unit(unit, format);
        fields
    }

    fn on_snapshot(&mut self, snapshot: &AccountSnapshot, format: &QuantityFormat) {
        self.quota.on_snapshot(snapshot, format);
        self.usage.on_snapshot(snapshot, format);
    }

    fn on_unit(&mut self, unit: StorageUnit, format: &QuantityFormat) {
        self.unit = unit;
        self.quota.on_unit(unit, format);
        self.usage.on_unit(unit, format);
    }

    fn on_error(&mut self, format: &QuantityFormat) {
        self.quota.on_error(format);
        self.usage.on_error(format);
    }

    fn view(&self) -> RamView {
        RamView {
            quota: self.quota.value().to_string(),
            usage: self.usage.value().to_string(),
            unit: self.unit.symbol().to_string(),
        }
    }
}

/// Single-owner state behind the pipeline task. Every method is synchronous;
/// the task applies input events one at a time.
pub struct PipelineState {
    format: QuantityFormat,
    messages: Messages,
    stale_policy: StalePolicy,
    generation: u64,
    pending: u64,
    state: CycleState,
    error_message: Option<String>,
    balance: BalanceField,
    cpu: LimitFields<DurationUnit>,
    net: LimitFields<StorageUnit>,
    ram: RamFields,
}

impl PipelineState {
    pub fn new(settings: &Settings) -> Self {
        let format = settings.format.clone();
        let UnitSelection { cpu, net, ram } = settings.units;
        Self {
            balance: BalanceField::new(&format),
            cpu: LimitFields::new(
                cpu,
                |snapshot| snapshot.cpu_limit.max,
                |snapshot| snapshot.cpu_limit.available,
                |snapshot| snapshot.cpu_limit.used,
                &format,
            ),
            net: LimitFields::new(
                net,
                |snapshot| snapshot.net_limit.max,
                |snapshot| snapshot.net_limit.available,
                |snapshot| snapshot.net_limit.used,
                &format,
            ),
            ram: RamFields::new(ram, &format),
            messages: settings.messages.clone(),
            stale_policy: settings.stale_policy,
            generation: 0,
            pending: 0,
            state: CycleState::Idle,
            error_message: None,
            format,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cycle_state(&self) -> CycleState {
        self.state
    }

    /// Lookups issued whose outcome has not come back yet.
    pub fn pending_lookups(&self) -> u64 {
        self.pending
    }

    /// Starts a new cycle for `text`. Invalid input fails the cycle right
    /// away; valid input yields the ticket for the lookup to issue.
    pub fn begin_trigger(&mut self, text: &str, validator: &dyn Validator) -> TriggerDecision {
        self.generation += 1;
        if !validator.validate(text) {
            self.resolve(&Outcome::validation_failed());
            return TriggerDecision::Rejected {
                generation: self.generation,
            };
        }
        self.pending += 1;
        self.state = CycleState::LookingUp;
        TriggerDecision::Lookup(LookupTicket {
            generation: self.generation,
            account: text.to_string(),
        })
    }

    /// Applies a resolved lookup. Returns false when the stale policy drops it;
    /// either way the lookup no longer counts as pending.
    pub fn apply(&mut self, outcome: &LookupOutcome) -> bool {
        self.pending = self.pending.saturating_sub(1);
        if !self
            .stale_policy
            .accepts(outcome.ticket.generation, self.generation)
        {
            return false;
        }
        self.resolve(&outcome.outcome);
        true
    }

    pub fn select_cpu_unit(&mut self, unit: DurationUnit) {
        self.cpu.on_unit(unit, &self.format);
    }

    pub fn select_net_unit(&mut self, unit: StorageUnit) {
        self.net.on_unit(unit, &self.format);
    }

    pub fn select_ram_unit(&mut self, unit: StorageUnit) {
        self.ram.on_unit(unit, &self.format);
    }

    pub fn view(&self) -> ResourceView {
        ResourceView {
            generation: self.generation,
            pending_lookups: self.pending,
            state: self.state,
            error_message: self.error_message.clone(),
            balance: self.balance.value().to_string(),
            cpu: self.cpu.view(),
            net: self.net.view(),
            ram: self.ram.view(),
        }
    }

    /// Validation and lookup outcomes share this path; the latest one wins.
    fn resolve(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Value(snapshot) => self.succeed(snapshot),
            Outcome::Error(err) => self.fail(err),
        }
    }

    fn succeed(&mut self, snapshot: &AccountSnapshot) {
        self.balance.on_snapshot(snapshot);
        self.cpu.on_snapshot(snapshot, &self.format);
        self.net.on_snapshot(snapshot, &self.format);
        self.ram.on_snapshot(snapshot, &self.format);
        self.error_message = None;
        self.state = CycleState::Succeeded;
    }

    fn fail(&mut self, err: &PipelineError) {
        self.error_message = Some(self.messages.describe(err));
        self.balance.on_error(&self.format);
        self.cpu.on_error(&self.format);
        self.net.on_error(&self.format);
        self.ram.on_error(&self.format);
        self.state = CycleState::Failed;
    }
}

/// Input and output side of a running pipeline.
pub struct PipelineHandle {
    text_tx: watch::Sender<String>,
    trigger_tx: mpsc::UnboundedSender<()>,
    cpu_unit_tx: watch::Sender<DurationUnit>,
    net_unit_tx: watch::Sender<StorageUnit>,
    ram_unit_tx: watch::Sender<StorageUnit>,
    view_rx: watch::Receiver<ResourceView>,
    event_tx: broadcast::Sender<PipelineEvent>,
    triggers: AtomicU64,
}

impl PipelineHandle {
    pub fn set_text(&self, text: impl Into<String>) -> Result<(), PipelineClosed> {
        self.text_tx.send(text.into()).map_err(|_| PipelineClosed)
    }

    pub fn trigger(&self) -> Result<(), PipelineClosed> {
        self.trigger_tx.send(()).map_err(|_| PipelineClosed)?;
        self.triggers.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Triggers accepted by the channel; compare with `ResourceView::generation`
    /// to tell whether the pipeline has caught up.
    pub fn triggers_sent(&self) -> u64 {
        self.triggers.load(Ordering::SeqCst)
    }

    pub fn search(&self, text: impl Into<String>) -> Result<(), PipelineClosed> {
        self.set_text(text)?;
        self.trigger()
    }

    /// Resolves once every trigger sent so far has been processed and no
    /// lookup is still in flight, whichever stale policy is active.
    pub async fn wait_settled(&self) -> Result<ResourceView, PipelineClosed> {
        let issued = self.triggers_sent();
        let mut views = self.subscribe();
        let view = views
            .wait_for(|view| view.generation >= issued && view.pending_lookups == 0)
            .await
            .map_err(|_| PipelineClosed)?
            .clone();
        Ok(view)
    }

    pub fn select_cpu_unit(&self, unit: DurationUnit) -> Result<(), PipelineClosed> {
        self.cpu_unit_tx.send(unit).map_err(|_| PipelineClosed)
    }

    pub fn select_net_unit(&self, unit: StorageUnit) -> Result<(), PipelineClosed> {
        self.net_unit_tx.send(unit).map_err(|_| PipelineClosed)
    }

    pub fn select_ram_unit(&self, unit: StorageUnit) -> Result<(), PipelineClosed> {
        self.ram_unit_tx.send(unit).map_err(|_| PipelineClosed)
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceView> {
        self.view_rx.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<PipelineEvent> {
        self.event_tx.subscribe()
    }

    pub fn view(&self) -> ResourceView {
        self.view_rx.borrow().clone()
    }

    pub fn unit_catalog(&self) -> UnitCatalog {
        UnitCatalog::new()
    }
}

struct PipelineInputs {
    text_rx: watch::Receiver<String>,
    trigger_rx: mpsc::UnboundedReceiver<()>,
    cpu_unit_rx: watch::Receiver<DurationUnit>,
    net_unit_rx: watch::Receiver<StorageUnit>,
    ram_unit_rx: watch::Receiver<StorageUnit>,
}

struct PipelineOutputs {
    view_tx: watch::Sender<ResourceView>,
    event_tx: broadcast::Sender<PipelineEvent>,
}

pub fn spawn_pipeline(
    lookup: Arc<dyn AccountLookup>,
    validator: Arc<dyn Validator>,
    settings: &Settings,
    shutdown: CancellationToken,
) -> (PipelineHandle, JoinHandle<()>) {
    let state = PipelineState::new(settings);
    let (text_tx, text_rx) = watch::channel(String::new());
    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
    let (cpu_unit_tx, cpu_unit_rx) = watch::channel(settings.units.cpu);
    let (net_unit_tx, net_unit_rx) = watch::channel(settings.units.net);
    let (ram_unit_tx, ram_unit_rx) = watch::channel(settings.units.ram);
    let (view_tx, view_rx) = watch::channel(state.view());
    let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

    let inputs = PipelineInputs {
        text_rx,
        trigger_rx,
        cpu_unit_rx,
        net_unit_rx,
        ram_unit_rx,
    };
    let outputs = PipelineOutputs {
        view_tx,
        event_tx: event_tx.clone(),
    };
    let handle = tokio::spawn(run_pipeline(
        state, inputs, outputs, lookup, validator, shutdown,
    ));
    let pipeline = PipelineHandle {
        text_tx,
        trigger_tx,
        cpu_unit_tx,
        net_unit_tx,
        ram_unit_tx,
        view_rx,
        event_tx,
        triggers: AtomicU64::new(0),
    };
    (pipeline, handle)
}

async fn run_pipeline(
    mut state: PipelineState,
    mut inputs: PipelineInputs,
    outputs: PipelineOutputs,
    lookup: Arc<dyn AccountLookup>,
    validator: Arc<dyn Validator>,
    shutdown: CancellationToken,
) {
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<LookupOutcome>();
    info!(policy = ?state.stale_policy, "resource pipeline started");
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            changed = inputs.cpu_unit_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let unit = *inputs.cpu_unit_rx.borrow_and_update();
                state.select_cpu_unit(unit);
                emit(&outputs, PipelineEvent::UnitChanged { family: UnitFamily::Cpu, unit: unit.symbol().to_string() });
            }
            changed = inputs.net_unit_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let unit = *inputs.net_unit_rx.borrow_and_update();
                state.select_net_unit(unit);
                emit(&outputs, PipelineEvent::UnitChanged { family: UnitFamily::Net, unit: unit.symbol().to_string() });
            }
            changed = inputs.ram_unit_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let unit = *inputs.ram_unit_rx.borrow_and_update();
                state.select_ram_unit(unit);
                emit(&outputs, PipelineEvent::UnitChanged { family: UnitFamily::Ram, unit: unit.symbol().to_string() });
            }
            trigger = inputs.trigger_rx.recv() => {
                if trigger.is_none() {
                    break;
                }
                let text = inputs.text_rx.borrow().clone();
                match state.begin_trigger(&text, validator.as_ref()) {
                    TriggerDecision::Rejected { generation } => {
                        info!(generation, "search rejected by validation");
                        emit(&outputs, PipelineEvent::ValidationRejected { generation });
                    }
                    TriggerDecision::Lookup(ticket) => {
                        info!(generation = ticket.generation, account = %ticket.account, "lookup started");
                        emit(&outputs, PipelineEvent::TriggerAccepted {
                            generation: ticket.generation,
                            account: ticket.account.clone(),
                        });
                        spawn_lookup(Arc::clone(&lookup), ticket, outcome_tx.clone());
                    }
                }
            }
            Some(outcome) = outcome_rx.recv() => {
                let LookupOutcome { ticket, .. } = &outcome;
                if state.apply(&outcome) {
                    let category = outcome.outcome.error().map(classify);
                    match category {
                        Some(category) => warn!(
                            generation = ticket.generation,
                            account = %ticket.account,
                            category = ?category,
                            "lookup failed"
                        ),
                        None => info!(
                            generation = ticket.generation,
                            account = %ticket.account,
                            "lookup succeeded"
                        ),
                    }
                    emit(&outputs, PipelineEvent::LookupResolved {
                        generation: ticket.generation,
                        account: ticket.account.clone(),
                        category,
                    });
                } else {
                    debug!(
                        generation = ticket.generation,
                        latest = state.generation(),
                        "stale lookup discarded"
                    );
                    emit(&outputs, PipelineEvent::StaleDiscarded {
                        generation: ticket.generation,
                        latest: state.generation(),
                    });
                }
            }
        }
        outputs.view_tx.send_replace(state.view());
    }
    info!("resource pipeline stopped");
}

fn spawn_lookup(
    lookup: Arc<dyn AccountLookup>,
    ticket: LookupTicket,
    outcome_tx: mpsc::UnboundedSender<LookupOutcome>,
) {
    tokio::spawn(async move {
        let result = AssertUnwindSafe(lookup.lookup(&ticket.account))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(LookupFailure::other("lookup panicked")));
        let outcome = Outcome::from_lookup(result);
        let _ = outcome_tx.send(LookupOutcome { ticket, outcome });
    });
}

fn emit(outputs: &PipelineOutputs, event: PipelineEvent) {
    let _ = outputs.event_tx.send(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{AccountNameValidator, DEFAULT_ACCOUNT_PATTERN};
    use protocol::ResourceLimitRaw;

    fn validator() -> AccountNameValidator {
        AccountNameValidator::new(DEFAULT_ACCOUNT_PATTERN).expect("validator")
    }

    fn alice() -> AccountSnapshot {
        AccountSnapshot {
            core_liquid_balance: "12.3450 EOS".to_string(),
            cpu_limit: ResourceLimitRaw {
                max: 100_000,
                available: 80_000,
                used: 20_000,
            },
            net_limit: ResourceLimitRaw {
                max: 2_048_000,
                available: 1_536_000,
                used: 512_000,
            },
            ram_quota: 8_192_000,
            ram_usage: 4_096_000,
        }
    }

    fn resolve(ticket: LookupTicket, result: Result<AccountSnapshot, LookupFailure>) -> LookupOutcome {
        LookupOutcome {
            ticket,
            outcome: Outcome::from_lookup(result),
        }
    }

    fn expect_ticket(decision: TriggerDecision) -> LookupTicket {
        match decision {
            TriggerDecision::Lookup(ticket) => ticket,
            TriggerDecision::Rejected { .. } => panic!("expected lookup"),
        }
    }

    #[test]
    fn initial_view_is_placeholder_everywhere() {
        let state = PipelineState::new(&Settings::default());
        let view = state.view();
        assert_eq!(view.state, CycleState::Idle);
        assert_eq!(view.error_message, None);
        assert_eq!(view.balance, "-");
        assert!(view.quantities().iter().all(|value| *value == "-"));
        assert_eq!(view.cpu.unit, "ms");
        assert_eq!(view.net.unit, "kB");
        assert_eq!(view.ram.unit, "kB");
    }

    #[test]
    fn successful_lookup_formats_every_field() {
        let mut state = PipelineState::new(&Settings::default());
        let ticket = expect_ticket(state.begin_trigger("alice", &validator()));
        assert_eq!(state.cycle_state(), CycleState::LookingUp);
        assert!(state.apply(&resolve(ticket, Ok(alice()))));

        let view = state.view();
        assert_eq!(view.state, CycleState::Succeeded);
        assert_eq!(view.balance, "12.3450 EOS");
        assert_eq!(view.cpu.max, "100.000 ms");
        assert_eq!(view.cpu.available, "80.000 ms");
        assert_eq!(view.cpu.used, "20.000 ms");
        assert_eq!(view.net.max, "2,048.000 kB");
        assert_eq!(view.net.available, "1,536.000 kB");
        assert_eq!(view.net.used, "512.000 kB");
        assert_eq!(view.ram.quota, "8,192.000 kB");
        assert_eq!(view.ram.usage, "4,096.000 kB");
        assert_eq!(view.error_message, None);
    }

    #[test]
    fn invalid_text_fails_without_ticket() {
        let mut state = PipelineState::new(&Settings::default());
        let decision = state.begin_trigger("Not Valid", &validator());
        assert_eq!(decision, TriggerDecision::Rejected { generation: 1 });
        let view = state.view();
        assert_eq!(view.state, CycleState::Failed);
        assert_eq!(
            view.error_message.as_deref(),
            Some(Messages::default().validation_failed.as_str())
        );
    }

    #[test]
    fn unit_change_reformats_last_snapshot() {
        let mut state = PipelineState::new(&Settings::default());
        let ticket = expect_ticket(state.begin_trigger("alice", &validator()));
        state.apply(&resolve(ticket, Ok(alice())));
        state.select_cpu_unit(DurationUnit::Seconds);
        state.select_ram_unit(StorageUnit::Megabytes);

        let view = state.view();
        assert_eq!(view.cpu.max, "0.100 s");
        assert_eq!(view.cpu.unit, "s");
        assert_eq!(view.ram.quota, "8.192 MB");
        assert_eq!(view.ram.unit, "MB");
        assert_eq!(view.net.max, "2,048.000 kB");
    }

    #[test]
    fn error_overwrites_previous_values() {
        let mut state = PipelineState::new(&Settings::default());
        let first = expect_ticket(state.begin_trigger("alice", &validator()));
        state.apply(&resolve(first, Ok(alice())));
        let second = expect_ticket(state.begin_trigger("alice", &validator()));
        state.apply(&resolve(second, Err(LookupFailure::network("down"))));

        let view = state.view();
        assert_eq!(view.state, CycleState::Failed);
        assert_eq!(view.balance, "-");
        assert!(view.quantities().iter().all(|value| *value == "-"));
        assert_eq!(
            view.error_message.as_deref(),
            Some(Messages::default().connection_down.as_str())
        );

        state.select_cpu_unit(DurationUnit::Seconds);
        assert_eq!(state.view().cpu.max, "-");
    }

    #[test]
    fn success_clears_previous_error() {
        let mut state = PipelineState::new(&Settings::default());
        state.begin_trigger("", &validator());
        assert!(state.view().error_message.is_some());
        let ticket = expect_ticket(state.begin_trigger("alice", &validator()));
        assert!(state.view().error_message.is_some());
        state.apply(&resolve(ticket, Ok(alice())));
        assert_eq!(state.view().error_message, None);
    }

    #[test]
    fn latest_trigger_wins_drops_older_results() {
        let mut state = PipelineState::new(&Settings::default());
        let older = expect_ticket(state.begin_trigger("alice", &validator()));
        let newer = expect_ticket(state.begin_trigger("bob", &validator()));
        assert!(state.apply(&resolve(newer, Err(LookupFailure::status(500)))));
        assert!(!state.apply(&resolve(older, Ok(alice()))));
        assert_eq!(
            state.view().error_message.as_deref(),
            Some(Messages::default().account_not_found.as_str())
        );
    }

    #[test]
    fn last_resolved_wins_applies_older_results() {
        let settings = Settings {
            stale_policy: StalePolicy::LastResolvedWins,
            ..Settings::default()
        };
        let mut state = PipelineState::new(&settings);
        let older = expect_ticket(state.begin_trigger("alice", &validator()));
        let newer = expect_ticket(state.begin_trigger("bob", &validator()));
        assert!(state.apply(&resolve(newer, Err(LookupFailure::status(500)))));
        assert!(state.apply(&resolve(older, Ok(alice()))));
        let view = state.view();
        assert_eq!(view.error_message, None);
        assert_eq!(view.balance, "12.3450 EOS");
    }

    #[test]
    fn validation_failure_makes_inflight_lookup_stale() {
        let mut state = PipelineState::new(&Settings::default());
        let inflight = expect_ticket(state.begin_trigger("alice", &validator()));
        state.begin_trigger("ALICE", &validator());
        assert!(!state.apply(&resolve(inflight, Ok(alice()))));
        assert_eq!(state.view().state, CycleState::Failed);
    }

    #[test]
    fn pending_lookups_count_until_every_outcome_returns() {
        let settings = Settings {
            stale_policy: StalePolicy::LastResolvedWins,
            ..Settings::default()
        };
        let mut state = PipelineState::new(&settings);
        let first = expect_ticket(state.begin_trigger("alice", &validator()));
        let second = expect_ticket(state.begin_trigger("bob", &validator()));
        state.begin_trigger("Not Valid", &validator());
        assert_eq!(state.pending_lookups(), 2);

        state.apply(&resolve(first, Ok(alice())));
        let view = state.view();
        assert_eq!(view.state, CycleState::Succeeded);
        assert_eq!(view.pending_lookups, 1);

        state.apply(&resolve(second, Err(LookupFailure::status(500))));
        assert_eq!(state.view().pending_lookups, 0);
    }

    #[test]
    fn discarded_lookups_are_no_longer_pending() {
        let mut state = PipelineState::new(&Settings::default());
        let older = expect_ticket(state.begin_trigger("alice", &validator()));
        let newer = expect_ticket(state.begin_trigger("bob", &validator()));
        assert!(!state.apply(&resolve(older, Ok(alice()))));
        assert_eq!(state.pending_lookups(), 1);
        assert!(state.apply(&resolve(newer, Ok(alice()))));
        assert_eq!(state.pending_lookups(), 0);
    }

    #[test]
    fn validation_failure_never_passes_through_validating() {
        let mut state = PipelineState::new(&Settings::default());
        state.begin_trigger("", &validator());
        assert_eq!(state.cycle_state(), CycleState::Failed);
        assert_eq!(state.pending_lookups(), 0);
        let ticket = expect_ticket(state.begin_trigger("alice", &validator()));
        assert_eq!(state.cycle_state(), CycleState::LookingUp);
        state.apply(&resolve(ticket, Ok(alice())));
        assert_eq!(state.cycle_state(), CycleState::Succeeded);
    }

    #[test]
    fn replaying_snapshot_is_idempotent() {
        let mut state = PipelineState::new(&Settings::default());
        let first = expect_ticket(state.begin_trigger("alice", &validator()));
        state.apply(&resolve(first, Ok(alice())));
        let before = state.view();
        let second = expect_ticket(state.begin_trigger("alice", &validator()));
        state.apply(&resolve(second, Ok(alice())));
        let after = state.view();
        assert_eq!(after.generation, before.generation + 1);
        assert_eq!(after.quantities(), before.quantities());
        assert_eq!(after.balance, before.balance);
        assert_eq!(after.state, before.state);
    }
}
