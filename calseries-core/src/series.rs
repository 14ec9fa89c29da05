//! Series-scoped edits and deletes.
//!
//! An edit or delete is triggered from one target instance and reaches
//! "this" instance, "this and future" instances, or "all" instances of
//! the target's series. Each operation resolves its scope once into a
//! selection predicate, then makes a single pass over the collection.
//! The input slice is never modified; callers get a new collection back.
//!
//! Editing one instance detaches it from its series, so later series-wide
//! operations leave it alone. Series-wide edits keep every instance's own
//! `id` and `date`. As a consequence members of a series may end up with
//! different `recurrence` values: a shared `series_id` means a common
//! origin, not an identical current rule.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CalSeriesError, CalSeriesResult};
use crate::instance::{EventInstance, EventPatch};

/// How far an edit or delete reaches into the target's series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only the target instance.
    This,
    /// The target and every later instance of its series.
    Future,
    /// Every instance of the target's series.
    All,
}

impl Scope {
    pub const ALL_SCOPES: [Scope; 3] = [Scope::This, Scope::Future, Scope::All];

    /// Prompt label for interactive scope pickers.
    pub fn label(&self) -> &'static str {
        match self {
            Scope::This => "This event",
            Scope::Future => "This and following events",
            Scope::All => "All events",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::This => write!(f, "this"),
            Scope::Future => write!(f, "future"),
            Scope::All => write!(f, "all"),
        }
    }
}

impl FromStr for Scope {
    type Err = CalSeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "this" => Ok(Scope::This),
            "future" | "following" => Ok(Scope::Future),
            "all" => Ok(Scope::All),
            other => Err(CalSeriesError::InvalidScope(other.to_string())),
        }
    }
}

/// Result of a scoped operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesChange {
    /// The full collection after the change.
    pub instances: Vec<EventInstance>,
    /// Number of instances edited or removed.
    pub affected: usize,
}

/// Which instances a scoped operation touches, resolved from the target.
enum Selection {
    Single { id: String },
    FromDate { series_id: String, date: NaiveDate },
    Series { series_id: String },
}

impl Selection {
    /// Resolve `scope` against `target`. Without a series, every scope
    /// degrades to the target alone.
    fn resolve(target: &EventInstance, scope: Scope) -> Self {
        match (&target.series_id, scope) {
            (None, _) | (_, Scope::This) => Selection::Single {
                id: target.id.clone(),
            },
            (Some(series_id), Scope::Future) => Selection::FromDate {
                series_id: series_id.clone(),
                date: target.date,
            },
            (Some(series_id), Scope::All) => Selection::Series {
                series_id: series_id.clone(),
            },
        }
    }

    fn matches(&self, instance: &EventInstance) -> bool {
        match self {
            Selection::Single { id } => instance.id == *id,
            Selection::FromDate { series_id, date } => {
                instance.in_series(series_id) && instance.date >= *date
            }
            Selection::Series { series_id } => instance.in_series(series_id),
        }
    }

    fn is_single(&self) -> bool {
        matches!(self, Selection::Single { .. })
    }
}

fn find_target<'a>(instances: &'a [EventInstance], target_id: &str) -> CalSeriesResult<&'a EventInstance> {
    instances
        .iter()
        .find(|instance| instance.id == target_id)
        .ok_or_else(|| {
            tracing::warn!(target_id, "Scoped change target not found");
            CalSeriesError::NotFound(target_id.to_string())
        })
}

/// Apply `patch` to the instances `scope` selects from `target_id`.
///
/// A single-instance edit also detaches the target from its series.
/// Returns `NotFound` when no instance has `target_id`.
pub fn apply_scoped_edit(
    instances: &[EventInstance],
    target_id: &str,
    scope: Scope,
    patch: &EventPatch,
) -> CalSeriesResult<SeriesChange> {
    let target = find_target(instances, target_id)?;
    let selection = Selection::resolve(target, scope);
    let mut affected = 0;

    let instances = instances
        .iter()
        .map(|instance| {
            let mut instance = instance.clone();
            if selection.matches(&instance) {
                affected += 1;
                if selection.is_single() {
                    patch.apply_to_single(&mut instance);
                    instance.detach();
                } else {
                    patch.apply_payload(&mut instance);
                }
            }
            instance
        })
        .collect();

    tracing::debug!(target_id, %scope, affected, "Applied scoped edit");

    Ok(SeriesChange {
        instances,
        affected,
    })
}

/// Remove the instances `scope` selects from `target_id`.
///
/// Returns `NotFound` when no instance has `target_id`.
pub fn apply_scoped_delete(
    instances: &[EventInstance],
    target_id: &str,
    scope: Scope,
) -> CalSeriesResult<SeriesChange> {
    let target = find_target(instances, target_id)?;
    let selection = Selection::resolve(target, scope);

    let kept: Vec<EventInstance> = instances
        .iter()
        .filter(|instance| !selection.matches(instance))
        .cloned()
        .collect();
    let affected = instances.len() - kept.len();

    tracing::debug!(target_id, %scope, affected, "Applied scoped delete");

    Ok(SeriesChange {
        instances: kept,
        affected,
    })
}

/// Instances of `series_id`, ordered by date.
pub fn series_members<'a>(instances: &'a [EventInstance], series_id: &str) -> Vec<&'a EventInstance> {
    let mut members: Vec<&EventInstance> = instances
        .iter()
        .filter(|instance| instance.in_series(series_id))
        .collect();
    members.sort_by_key(|instance| instance.date);
    members
}
