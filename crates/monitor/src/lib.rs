//! Account resource summary: validates a searched account name, looks the
//! account up through an [`lookup::AccountLookup`] and turns the raw CPU, NET
//! and RAM counters into unit-aware display strings.

pub mod classify;
pub mod config;
pub mod error;
pub mod field;
pub mod format;
pub mod lookup;
pub mod outcome;
pub mod pipeline;
pub mod units;
pub mod validate;
pub mod view;

pub use classify::{classify, ErrorCategory, Messages};
pub use config::{load_settings, Settings, UnitSelection};
pub use error::{PipelineClosed, PipelineError};
pub use format::{format_quantity, QuantityFormat, DEFAULT_PLACEHOLDER};
pub use lookup::{AccountLookup, FixtureLookup};
pub use pipeline::{spawn_pipeline, PipelineEvent, PipelineHandle, PipelineState};
pub use protocol::{AccountSnapshot, LookupFailure, ResourceLimitRaw};
pub use units::{ConvertibleUnit, DurationUnit, StorageUnit, UnitCatalog};
pub use validate::{AccountNameValidator, Validator};
pub use view::{CycleState, ResourceView};
