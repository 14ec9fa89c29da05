//! Recurrence expansion.
//!
//! Turns an anchor date plus a `RecurrenceRule` into the ordered list of
//! occurrence dates. Every candidate is computed from the anchor and the
//! step index, so no date value is carried and mutated across iterations.
//!
//! The generator never loops forever: count, until and never-ending rules
//! all stop on their own condition, and every sequence is truncated at the
//! hard safety cap. Invalid rules and anchors produce an empty sequence;
//! use [`try_generate_sequence`] to learn why.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_OCCURRENCES, HARD_SAFETY_CAP, ISO_DATE_FORMAT};
use crate::error::{CalSeriesError, CalSeriesResult};
use crate::rule::{EndType, Frequency, RecurrenceRule};

/// What to do when the anchor's day of month does not exist in a target
/// month (e.g. the 31st, one month later).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthOverflow {
    /// Use the last day of the target month (Jan 31 -> Feb 28).
    #[default]
    Clamp,
    /// Carry the surplus days into the next month (Jan 31 -> Mar 3).
    RollOver,
}

/// Bounds applied while generating a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceLimits {
    /// Stop point for rules that never end.
    pub max_occurrences: usize,
    /// Stop point for every rule.
    pub hard_safety_cap: usize,
    pub month_overflow: MonthOverflow,
}

impl Default for SequenceLimits {
    fn default() -> Self {
        SequenceLimits {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            hard_safety_cap: HARD_SAFETY_CAP,
            month_overflow: MonthOverflow::default(),
        }
    }
}

/// Parse an ISO `YYYY-MM-DD` anchor date.
pub fn parse_anchor(anchor: &str) -> CalSeriesResult<NaiveDate> {
    NaiveDate::parse_from_str(anchor.trim(), ISO_DATE_FORMAT)
        .map_err(|_| CalSeriesError::InvalidAnchor(anchor.to_string()))
}

/// Expand `rule` from `anchor`, reporting invalid rules as errors.
#[tracing::instrument(level = "debug", skip(rule, limits), fields(frequency = ?rule.frequency, interval = rule.interval))]
pub fn try_generate_sequence(
    anchor: NaiveDate,
    rule: &RecurrenceRule,
    limits: &SequenceLimits,
) -> CalSeriesResult<Vec<NaiveDate>> {
    rule.validate()?;

    let dates: Vec<NaiveDate> = Occurrences::new(anchor, rule, *limits).collect();

    tracing::debug!(count = dates.len(), "Generated occurrence dates");
    Ok(dates)
}

/// Expand `rule` from `anchor`. Returns an empty sequence for an invalid rule.
pub fn generate_sequence(
    anchor: NaiveDate,
    rule: &RecurrenceRule,
    limits: &SequenceLimits,
) -> Vec<NaiveDate> {
    match try_generate_sequence(anchor, rule, limits) {
        Ok(dates) => dates,
        Err(e) => {
            tracing::warn!(error = %e, "Refusing to expand recurrence rule");
            Vec::new()
        }
    }
}

/// Expand `rule` from an ISO anchor string into ISO date strings.
///
/// An unparsable anchor or an invalid rule yields an empty list.
pub fn generate_iso_sequence(
    anchor: &str,
    rule: &RecurrenceRule,
    limits: &SequenceLimits,
) -> Vec<String> {
    let anchor = match parse_anchor(anchor) {
        Ok(date) => date,
        Err(e) => {
            tracing::warn!(error = %e, "Refusing to expand recurrence rule");
            return Vec::new();
        }
    };

    generate_sequence(anchor, rule, limits)
        .into_iter()
        .map(|d| d.format(ISO_DATE_FORMAT).to_string())
        .collect()
}

/// Lazily expand `rule` from `anchor`.
///
/// An invalid rule gives an iterator that yields nothing.
pub fn occurrences(anchor: NaiveDate, rule: &RecurrenceRule, limits: SequenceLimits) -> Occurrences<'_> {
    let mut occurrences = Occurrences::new(anchor, rule, limits);
    if let Err(e) = rule.validate() {
        tracing::warn!(error = %e, "Refusing to expand recurrence rule");
        occurrences.finished = true;
    }
    occurrences
}

/// Iterator over the included occurrence dates of a rule.
pub struct Occurrences<'a> {
    rule: &'a RecurrenceRule,
    limits: SequenceLimits,
    candidates: Candidates,
    emitted: usize,
    finished: bool,
}

impl<'a> Occurrences<'a> {
    fn new(anchor: NaiveDate, rule: &'a RecurrenceRule, limits: SequenceLimits) -> Self {
        Occurrences {
            rule,
            limits,
            candidates: Candidates::new(anchor, rule, limits.month_overflow),
            emitted: 0,
            finished: false,
        }
    }

    /// Has the sequence hit one of its stop conditions?
    fn limit_reached(&self) -> bool {
        if self.emitted >= self.limits.hard_safety_cap {
            tracing::debug!(cap = self.limits.hard_safety_cap, "Hard safety cap reached");
            return true;
        }

        match self.rule.end_type {
            EndType::Count => self.emitted >= self.rule.count.unwrap_or(0) as usize,
            EndType::Never => self.emitted >= self.limits.max_occurrences,
            EndType::Until => false,
        }
    }

    fn is_included(&self, candidate: NaiveDate) -> bool {
        if self.rule.exceptions.contains(&candidate) {
            tracing::trace!(date = %candidate, "Skipping exception date");
            return false;
        }

        if self.rule.has_weekday_filter() {
            let weekday = candidate.weekday().num_days_from_sunday() as u8;
            return self.rule.by_weekday.contains(&weekday);
        }

        true
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        while !self.finished {
            if self.limit_reached() {
                self.finished = true;
                break;
            }

            let Some(candidate) = self.candidates.next() else {
                self.finished = true;
                break;
            };

            if self.rule.end_type == EndType::Until
                && self.rule.until.is_some_and(|until| candidate > until)
            {
                self.finished = true;
                break;
            }

            if self.is_included(candidate) {
                self.emitted += 1;
                return Some(candidate);
            }
        }

        None
    }
}

/// Raw candidate dates before exceptions, weekday filters and end
/// conditions are applied. Strictly increasing; ends only when the
/// calendar runs out of representable dates.
struct Candidates {
    anchor: NaiveDate,
    frequency: Frequency,
    interval: u64,
    overflow: MonthOverflow,
    /// Step index for the frequencies computed from the anchor.
    index: u64,
    /// Next day to visit when walking weekdays one at a time.
    cursor: Option<NaiveDate>,
    walk_days: bool,
}

impl Candidates {
    fn new(anchor: NaiveDate, rule: &RecurrenceRule, overflow: MonthOverflow) -> Self {
        Candidates {
            anchor,
            frequency: rule.frequency,
            interval: u64::from(rule.interval.max(1)),
            overflow,
            index: 0,
            cursor: Some(anchor),
            walk_days: rule.has_weekday_filter(),
        }
    }

    /// The `index`-th candidate of a rule without a weekday filter.
    fn candidate_at(&self, index: u64) -> Option<NaiveDate> {
        let periods = index.checked_mul(self.interval)?;

        match self.frequency {
            Frequency::Daily => self.anchor.checked_add_days(Days::new(periods)),
            Frequency::Weekly => self
                .anchor
                .checked_add_days(Days::new(periods.checked_mul(7)?)),
            Frequency::Monthly => add_months(self.anchor, periods, self.overflow),
            Frequency::Yearly => add_months(self.anchor, periods.checked_mul(12)?, self.overflow),
        }
    }

    /// Visit every day of the anchor's week (from the anchor on), then every
    /// day of each `interval`-th week after it. Weeks start on Sunday.
    fn next_walked_day(&mut self) -> Option<NaiveDate> {
        let day = self.cursor?;

        let next = day.succ_opt().and_then(|next| {
            if next.weekday() == Weekday::Sun && self.interval > 1 {
                next.checked_add_days(Days::new((self.interval - 1) * 7))
            } else {
                Some(next)
            }
        });
        self.cursor = next;

        Some(day)
    }
}

impl Iterator for Candidates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.walk_days {
            return self.next_walked_day();
        }

        let candidate = self.candidate_at(self.index)?;
        self.index += 1;
        Some(candidate)
    }
}

/// Move `date` forward by `months`, resolving missing days per `overflow`.
fn add_months(date: NaiveDate, months: u64, overflow: MonthOverflow) -> Option<NaiveDate> {
    let months = i64::try_from(months).ok()?;
    let total = i64::from(date.year())
        .checked_mul(12)?
        .checked_add(i64::from(date.month0()))?
        .checked_add(months)?;

    let year = i32::try_from(total.div_euclid(12)).ok()?;
    let month = u32::try_from(total.rem_euclid(12)).ok()? + 1;

    match overflow {
        MonthOverflow::Clamp => {
            let day = date.day().min(days_in_month(year, month)?);
            NaiveDate::from_ymd_opt(year, month, day)
        }
        MonthOverflow::RollOver => NaiveDate::from_ymd_opt(year, month, 1)?
            .checked_add_days(Days::new(u64::from(date.day() - 1))),
    }
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next_first - first).num_days()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn iso(dates: &[NaiveDate]) -> Vec<String> {
        dates.iter().map(|d| d.to_string()).collect()
    }

    fn limits() -> SequenceLimits {
        SequenceLimits::default()
    }

    #[test_log::test]
    fn test_daily_interval_with_count() {
        let rule = RecurrenceRule::new(Frequency::Daily)
            .with_interval(3)
            .with_count(4);
        let dates = generate_sequence(date(2025, 1, 30), &rule, &limits());
        assert_eq!(
            iso(&dates),
            vec!["2025-01-30", "2025-02-02", "2025-02-05", "2025-02-08"]
        );
    }

    #[test_log::test]
    fn test_weekly_tue_thu_from_monday_anchor() {
        let rule = RecurrenceRule::new(Frequency::Weekly)
            .on_weekdays([2, 4])
            .with_count(4);
        let dates = generate_sequence(date(2025, 11, 3), &rule, &limits());
        assert_eq!(
            iso(&dates),
            vec!["2025-11-04", "2025-11-06", "2025-11-11", "2025-11-13"]
        );
    }

    #[test]
    fn test_weekly_weekdays_jump_interval_weeks() {
        let rule = RecurrenceRule::new(Frequency::Weekly)
            .with_interval(2)
            .on_weekdays([1, 3])
            .with_count(4);
        // Anchor on a Wednesday: Monday of the anchor week is already past.
        let dates = generate_sequence(date(2025, 11, 5), &rule, &limits());
        assert_eq!(
            iso(&dates),
            vec!["2025-11-05", "2025-11-17", "2025-11-19", "2025-12-01"]
        );
    }

    #[test]
    fn test_weekly_without_weekdays_steps_whole_weeks() {
        let rule = RecurrenceRule::new(Frequency::Weekly)
            .with_interval(2)
            .with_count(3);
        let dates = generate_sequence(date(2025, 12, 24), &rule, &limits());
        assert_eq!(iso(&dates), vec!["2025-12-24", "2026-01-07", "2026-01-21"]);
    }

    #[test]
    fn test_monthly_clamps_to_month_end() {
        let rule = RecurrenceRule::new(Frequency::Monthly).with_count(4);
        let dates = generate_sequence(date(2025, 1, 31), &rule, &limits());
        assert_eq!(
            iso(&dates),
            vec!["2025-01-31", "2025-02-28", "2025-03-31", "2025-04-30"]
        );
    }

    #[test]
    fn test_monthly_roll_over() {
        let rule = RecurrenceRule::new(Frequency::Monthly).with_count(4);
        let limits = SequenceLimits {
            month_overflow: MonthOverflow::RollOver,
            ..SequenceLimits::default()
        };
        let dates = generate_sequence(date(2025, 1, 31), &rule, &limits);
        assert_eq!(
            iso(&dates),
            vec!["2025-01-31", "2025-03-03", "2025-03-31", "2025-05-01"]
        );
    }

    #[test]
    fn test_monthly_crosses_year_boundary() {
        let rule = RecurrenceRule::new(Frequency::Monthly)
            .with_interval(5)
            .with_count(3);
        let dates = generate_sequence(date(2025, 10, 15), &rule, &limits());
        assert_eq!(iso(&dates), vec!["2025-10-15", "2026-03-15", "2026-08-15"]);
    }

    #[test]
    fn test_yearly_leap_day() {
        let rule = RecurrenceRule::new(Frequency::Yearly).with_count(5);
        let dates = generate_sequence(date(2024, 2, 29), &rule, &limits());
        assert_eq!(
            iso(&dates),
            vec![
                "2024-02-29",
                "2025-02-28",
                "2026-02-28",
                "2027-02-28",
                "2028-02-29"
            ]
        );

        let roll = SequenceLimits {
            month_overflow: MonthOverflow::RollOver,
            ..SequenceLimits::default()
        };
        let dates = generate_sequence(date(2024, 2, 29), &rule, &roll);
        assert_eq!(dates[1], date(2025, 3, 1));
    }

    #[test]
    fn test_until_is_inclusive() {
        let rule = RecurrenceRule::new(Frequency::Daily)
            .with_interval(2)
            .with_until(date(2025, 3, 7));
        let dates = generate_sequence(date(2025, 3, 1), &rule, &limits());
        assert_eq!(
            iso(&dates),
            vec!["2025-03-01", "2025-03-03", "2025-03-05", "2025-03-07"]
        );
    }

    #[test]
    fn test_until_before_anchor_is_empty() {
        let rule = RecurrenceRule::new(Frequency::Daily).with_until(date(2025, 2, 28));
        assert!(generate_sequence(date(2025, 3, 1), &rule, &limits()).is_empty());
    }

    #[test]
    fn test_exceptions_do_not_count_towards_count() {
        let rule = RecurrenceRule::new(Frequency::Daily)
            .with_count(3)
            .with_exception(date(2025, 5, 2));
        let dates = generate_sequence(date(2025, 5, 1), &rule, &limits());
        assert_eq!(iso(&dates), vec!["2025-05-01", "2025-05-03", "2025-05-04"]);
    }

    #[test]
    fn test_never_ending_rule_stops_at_max_occurrences() {
        let rule = RecurrenceRule::new(Frequency::Daily);
        assert_eq!(generate_sequence(date(2025, 1, 1), &rule, &limits()).len(), 365);

        let short = SequenceLimits {
            max_occurrences: 10,
            ..SequenceLimits::default()
        };
        assert_eq!(generate_sequence(date(2025, 1, 1), &rule, &short).len(), 10);
    }

    #[test]
    fn test_hard_cap_bounds_every_end_type() {
        let count = RecurrenceRule::new(Frequency::Daily).with_count(5000);
        assert_eq!(
            generate_sequence(date(2025, 1, 1), &count, &limits()).len(),
            HARD_SAFETY_CAP
        );

        let until = RecurrenceRule::new(Frequency::Daily).with_until(date(2099, 12, 31));
        assert_eq!(
            generate_sequence(date(2025, 1, 1), &until, &limits()).len(),
            HARD_SAFETY_CAP
        );

        let never = RecurrenceRule::new(Frequency::Daily);
        let generous = SequenceLimits {
            max_occurrences: 100_000,
            ..SequenceLimits::default()
        };
        assert_eq!(
            generate_sequence(date(2025, 1, 1), &never, &generous).len(),
            HARD_SAFETY_CAP
        );
    }

    #[test]
    fn test_end_of_calendar_terminates() {
        let rule = RecurrenceRule::new(Frequency::Yearly).with_interval(u32::MAX);
        let dates = generate_sequence(date(2025, 1, 1), &rule, &limits());
        assert_eq!(dates, vec![date(2025, 1, 1)]);
    }

    #[test]
    fn test_invalid_rule_yields_empty_sequence() {
        let rule = RecurrenceRule::new(Frequency::Daily).with_interval(0);
        assert!(generate_sequence(date(2025, 1, 1), &rule, &limits()).is_empty());
        assert!(matches!(
            try_generate_sequence(date(2025, 1, 1), &rule, &limits()),
            Err(CalSeriesError::InvalidRule(_))
        ));
        assert_eq!(occurrences(date(2025, 1, 1), &rule, limits()).count(), 0);
    }

    #[test]
    fn test_iso_sequence_and_bad_anchor() {
        let rule = RecurrenceRule::new(Frequency::Weekly).with_count(2);
        assert_eq!(
            generate_iso_sequence("2025-06-30", &rule, &limits()),
            vec!["2025-06-30", "2025-07-07"]
        );
        assert!(generate_iso_sequence("30/06/2025", &rule, &limits()).is_empty());
        assert!(matches!(
            parse_anchor("2025-02-30"),
            Err(CalSeriesError::InvalidAnchor(_))
        ));
    }

    #[test]
    fn test_occurrences_is_lazy_and_restartable() {
        let rule = RecurrenceRule::new(Frequency::Daily);
        let first: Vec<_> = occurrences(date(2025, 1, 1), &rule, limits()).take(3).collect();
        let again: Vec<_> = occurrences(date(2025, 1, 1), &rule, limits()).take(3).collect();
        assert_eq!(first, again);
        assert_eq!(first.last(), Some(&date(2025, 1, 3)));
    }

    #[test]
    fn test_add_months_clamps_and_stops_at_calendar_end() {
        assert_eq!(
            add_months(date(2025, 11, 30), 3, MonthOverflow::Clamp),
            Some(date(2026, 2, 28))
        );
        assert_eq!(add_months(NaiveDate::MAX, 1, MonthOverflow::Clamp), None);
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 12), Some(31));
    }
}
