//! Recurring-event engine for the calseries calendar.
//!
//! - `rule` and `summary`: recurrence rules, validation, one-line summaries
//! - `recurrence`: expanding a rule from an anchor date into occurrence dates
//! - `series`: "this", "this and future" and "all" edits and deletes
//! - `materialize`: turning generated dates into stored event instances
//! - `store` and `config`: the JSON event file and user configuration

pub mod config;
pub mod constants;
pub mod error;
pub mod instance;
pub mod materialize;
pub mod recurrence;
pub mod rule;
pub mod series;
pub mod store;
mod summary;

pub use error::{CalSeriesError, CalSeriesResult};
pub use instance::{EventInstance, EventPatch, EventTemplate};
pub use recurrence::{MonthOverflow, SequenceLimits, generate_iso_sequence, generate_sequence};
pub use rule::{EndType, Frequency, RecurrenceRule};
pub use series::{Scope, SeriesChange, apply_scoped_delete, apply_scoped_edit};
