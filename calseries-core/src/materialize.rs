//! Turning a rule into stored event instances.
//!
//! The materializer is the only place that needs fresh ids and the current
//! time. Both are injected so the rest of the engine stays pure and tests
//! stay deterministic.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{CalSeriesError, CalSeriesResult};
use crate::instance::{EventInstance, EventTemplate};
use crate::recurrence::{SequenceLimits, try_generate_sequence};
use crate::rule::RecurrenceRule;

/// Source of unique ids for instances and series.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `prefix-1`, `prefix-2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        SequentialIdGenerator {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Creates event instances, one per occurrence of a rule.
pub struct SeriesMaterializer<I: IdGenerator, C: Clock> {
    ids: I,
    clock: C,
    limits: SequenceLimits,
}

impl SeriesMaterializer<UuidIdGenerator, SystemClock> {
    /// Materializer using random ids and the system clock.
    pub fn system(limits: SequenceLimits) -> Self {
        SeriesMaterializer::new(UuidIdGenerator, SystemClock, limits)
    }
}

impl<I: IdGenerator, C: Clock> SeriesMaterializer<I, C> {
    pub fn new(ids: I, clock: C, limits: SequenceLimits) -> Self {
        SeriesMaterializer { ids, clock, limits }
    }

    /// Expand `rule` from `anchor` into instances sharing a new series id.
    ///
    /// Fails with `InvalidRule` instead of returning an empty series, and
    /// with `InvalidRule` when the rule produces no occurrence at all
    /// (e.g. an `until` before the anchor).
    pub fn materialize(
        &mut self,
        template: &EventTemplate,
        anchor: NaiveDate,
        rule: &RecurrenceRule,
    ) -> CalSeriesResult<Vec<EventInstance>> {
        let dates = try_generate_sequence(anchor, rule, &self.limits)?;
        if dates.is_empty() {
            return Err(CalSeriesError::InvalidRule(format!(
                "'{}' has no occurrences starting {}",
                rule, anchor
            )));
        }

        let series_id = self.ids.next_id();
        let created = self.clock.now();

        let instances: Vec<EventInstance> = dates
            .into_iter()
            .map(|date| EventInstance {
                id: self.ids.next_id(),
                series_id: Some(series_id.clone()),
                date,
                recurrence: Some(rule.clone()),
                title: template.title.clone(),
                description: template.description.clone(),
                location: template.location.clone(),
                start_time: template.start_time,
                end_time: template.end_time,
                created,
            })
            .collect();

        tracing::info!(
            series_id = %series_id,
            count = instances.len(),
            rule = %rule,
            "Materialized recurring series"
        );

        Ok(instances)
    }

    /// A one-off event outside any series.
    pub fn single(&mut self, template: &EventTemplate, date: NaiveDate) -> EventInstance {
        EventInstance {
            id: self.ids.next_id(),
            series_id: None,
            date,
            recurrence: None,
            title: template.title.clone(),
            description: template.description.clone(),
            location: template.location.clone(),
            start_time: template.start_time,
            end_time: template.end_time,
            created: self.clock.now(),
        }
    }
}
