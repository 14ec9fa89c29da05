//! Recurrence rules.
//!
//! A `RecurrenceRule` describes how a series repeats from its anchor date.
//! Rules are plain data: they are built (or deserialized) by the caller,
//! validated once, then handed to the generator. A rule is never changed
//! after a series has been generated from it; changing the rule means
//! regenerating the series.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::ISO_DATE_FORMAT;
use crate::error::{CalSeriesError, CalSeriesResult};

/// Weekday abbreviations indexed by day number (Sunday = 0).
pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Unit noun used in summaries ("day", "week", ...).
    pub fn unit(&self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "Daily"),
            Frequency::Weekly => write!(f, "Weekly"),
            Frequency::Monthly => write!(f, "Monthly"),
            Frequency::Yearly => write!(f, "Yearly"),
        }
    }
}

impl FromStr for Frequency {
    type Err = CalSeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Frequency::Daily),
            "weekly" | "week" => Ok(Frequency::Weekly),
            "monthly" | "month" => Ok(Frequency::Monthly),
            "yearly" | "year" | "annually" => Ok(Frequency::Yearly),
            other => Err(CalSeriesError::InvalidRule(format!(
                "unknown frequency '{}'",
                other
            ))),
        }
    }
}

/// How a series terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndType {
    #[default]
    Never,
    Count,
    Until,
}

/// A recurrence rule, shaped like the records the calendar UI stores.
///
/// `count` is only read when `end_type` is `Count`, `until` only when it is
/// `Until`. `by_weekday` (Sunday = 0) only applies to weekly rules and
/// `by_month_day` only to monthly ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub end_type: EndType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub by_weekday: BTreeSet<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_month_day: Option<u8>,
    /// Dates that are skipped silently.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exceptions: BTreeSet<NaiveDate>,
}

fn default_interval() -> u32 {
    1
}

impl RecurrenceRule {
    /// A rule repeating every period forever.
    pub fn new(frequency: Frequency) -> Self {
        RecurrenceRule {
            frequency,
            interval: 1,
            end_type: EndType::Never,
            count: None,
            until: None,
            by_weekday: BTreeSet::new(),
            by_month_day: None,
            exceptions: BTreeSet::new(),
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Stop after `count` occurrences.
    pub fn with_count(mut self, count: u32) -> Self {
        self.end_type = EndType::Count;
        self.count = Some(count);
        self.until = None;
        self
    }

    /// Stop after `until` (inclusive).
    pub fn with_until(mut self, until: NaiveDate) -> Self {
        self.end_type = EndType::Until;
        self.until = Some(until);
        self.count = None;
        self
    }

    pub fn on_weekdays(mut self, weekdays: impl IntoIterator<Item = u8>) -> Self {
        self.by_weekday = weekdays.into_iter().collect();
        self
    }

    pub fn on_month_day(mut self, day: u8) -> Self {
        self.by_month_day = Some(day);
        self
    }

    pub fn with_exception(mut self, date: NaiveDate) -> Self {
        self.exceptions.insert(date);
        self
    }

    /// Parse a rule from its JSON form and validate it.
    ///
    /// An `until` that is not an ISO date is only an error when the rule
    /// ends on a date; otherwise it is never read and is dropped. Exception
    /// entries that are not ISO dates can never match an occurrence and are
    /// dropped too. Other malformed fields (an unknown frequency, a
    /// non-numeric interval) are reported as `InvalidRule`.
    pub fn from_json(json: &str) -> CalSeriesResult<Self> {
        let mut value: Value =
            serde_json::from_str(json).map_err(|e| CalSeriesError::InvalidRule(e.to_string()))?;
        if let Some(fields) = value.as_object_mut() {
            drop_unread_dates(fields);
        }

        let rule: RecurrenceRule =
            serde_json::from_value(value).map_err(|e| CalSeriesError::InvalidRule(e.to_string()))?;
        rule.validate()?;
        Ok(rule)
    }

    /// Check the rule's structural constraints.
    pub fn validate(&self) -> CalSeriesResult<()> {
        if self.interval < 1 {
            return Err(CalSeriesError::InvalidRule(
                "interval must be at least 1".into(),
            ));
        }

        match self.end_type {
            EndType::Never => {}
            EndType::Count => match self.count {
                Some(n) if n >= 1 => {}
                Some(_) => {
                    return Err(CalSeriesError::InvalidRule(
                        "count must be at least 1".into(),
                    ));
                }
                None => {
                    return Err(CalSeriesError::InvalidRule(
                        "count is required when the rule ends after a count".into(),
                    ));
                }
            },
            EndType::Until => {
                if self.until.is_none() {
                    return Err(CalSeriesError::InvalidRule(
                        "until is required when the rule ends on a date".into(),
                    ));
                }
            }
        }

        if let Some(day) = self.by_weekday.iter().find(|d| **d > 6) {
            return Err(CalSeriesError::InvalidRule(format!(
                "weekday {} is out of range (0 = Sunday .. 6 = Saturday)",
                day
            )));
        }

        if let Some(day) = self.by_month_day {
            if !(1..=31).contains(&day) {
                return Err(CalSeriesError::InvalidRule(format!(
                    "month day {} is out of range (1..31)",
                    day
                )));
            }
        }

        Ok(())
    }

    /// True when this weekly rule only fires on specific weekdays.
    pub fn has_weekday_filter(&self) -> bool {
        self.frequency == Frequency::Weekly && !self.by_weekday.is_empty()
    }
}

fn is_iso_date(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| NaiveDate::parse_from_str(s, ISO_DATE_FORMAT).is_ok())
}

fn drop_unread_dates(fields: &mut Map<String, Value>) {
    let ends_on_date = fields.get("endType").and_then(Value::as_str) == Some("until");
    if !ends_on_date && fields.get("until").is_some_and(|until| !is_iso_date(until)) {
        tracing::debug!("Ignoring unparsable until on a rule that does not end on a date");
        fields.remove("until");
    }

    if let Some(Value::Array(exceptions)) = fields.get_mut("exceptions") {
        exceptions.retain(|exception| {
            let keep = is_iso_date(exception);
            if !keep {
                tracing::warn!(%exception, "Ignoring exception that is not an ISO date");
            }
            keep
        });
    }
}

/// Parse a weekday given as a name ("mon", "Monday") or a number (0 = Sunday).
pub fn weekday_from_name(s: &str) -> Option<u8> {
    let lower = s.trim().to_lowercase();

    if let Ok(n) = lower.parse::<u8>() {
        return (n <= 6).then_some(n);
    }

    if lower.len() < 2 {
        return None;
    }

    const FULL_NAMES: [&str; 7] = [
        "sunday",
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
    ];

    FULL_NAMES
        .iter()
        .position(|name| name.starts_with(&lower))
        .map(|i| i as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_rule_is_valid() {
        assert!(RecurrenceRule::new(Frequency::Daily).validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let rule = RecurrenceRule::new(Frequency::Weekly).with_interval(0);
        assert!(matches!(
            rule.validate(),
            Err(CalSeriesError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_count_end_requires_positive_count() {
        let mut rule = RecurrenceRule::new(Frequency::Daily);
        rule.end_type = EndType::Count;
        assert!(rule.validate().is_err());

        rule.count = Some(0);
        assert!(rule.validate().is_err());

        rule.count = Some(3);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_until_end_requires_date() {
        let mut rule = RecurrenceRule::new(Frequency::Daily);
        rule.end_type = EndType::Until;
        assert!(rule.validate().is_err());

        let rule = rule.with_until(date(2025, 12, 31));
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_weekday_and_month_day() {
        let rule = RecurrenceRule::new(Frequency::Weekly).on_weekdays([1, 7]);
        assert!(rule.validate().is_err());

        let rule = RecurrenceRule::new(Frequency::Monthly).on_month_day(32);
        assert!(rule.validate().is_err());

        let rule = RecurrenceRule::new(Frequency::Monthly).on_month_day(0);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_builder_end_conditions_replace_each_other() {
        let rule = RecurrenceRule::new(Frequency::Daily)
            .with_count(5)
            .with_until(date(2025, 1, 1));
        assert_eq!(rule.end_type, EndType::Until);
        assert_eq!(rule.count, None);
    }

    #[test]
    fn test_from_json_camel_case() {
        let rule = RecurrenceRule::from_json(
            r#"{
                "frequency": "weekly",
                "interval": 1,
                "endType": "count",
                "count": 4,
                "byWeekday": [2, 4],
                "exceptions": ["2025-11-06"]
            }"#,
        )
        .unwrap();

        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.count, Some(4));
        assert!(rule.by_weekday.contains(&2));
        assert!(rule.exceptions.contains(&date(2025, 11, 6)));
    }

    #[test]
    fn test_from_json_defaults_interval_and_end() {
        let rule = RecurrenceRule::from_json(r#"{"frequency": "daily"}"#).unwrap();
        assert_eq!(rule.interval, 1);
        assert_eq!(rule.end_type, EndType::Never);
    }

    #[test]
    fn test_from_json_unparsable_until_is_invalid_rule() {
        let result = RecurrenceRule::from_json(
            r#"{"frequency": "daily", "endType": "until", "until": "next tuesday"}"#,
        );
        assert!(matches!(result, Err(CalSeriesError::InvalidRule(_))));
    }

    #[test]
    fn test_from_json_ignores_until_when_not_ending_on_date() {
        let rule = RecurrenceRule::from_json(
            r#"{"frequency": "daily", "endType": "count", "count": 2, "until": "someday"}"#,
        )
        .unwrap();
        assert_eq!(rule.end_type, EndType::Count);
        assert_eq!(rule.until, None);

        let rule =
            RecurrenceRule::from_json(r#"{"frequency": "daily", "until": "12/31/2025"}"#).unwrap();
        assert_eq!(rule.end_type, EndType::Never);
        assert_eq!(rule.until, None);
    }

    #[test]
    fn test_from_json_drops_non_iso_exceptions() {
        let rule = RecurrenceRule::from_json(
            r#"{"frequency": "daily", "exceptions": ["2025-11-05", "Nov 6", 7]}"#,
        )
        .unwrap();
        assert_eq!(rule.exceptions.len(), 1);
        assert!(rule.exceptions.contains(&date(2025, 11, 5)));
    }

    #[test]
    fn test_serialize_skips_unused_fields() {
        let json = serde_json::to_string(&RecurrenceRule::new(Frequency::Yearly)).unwrap();
        assert_eq!(json, r#"{"frequency":"yearly","interval":1,"endType":"never"}"#);
    }

    #[test]
    fn test_frequency_from_str() {
        assert_eq!("Weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert_eq!("annually".parse::<Frequency>().unwrap(), Frequency::Yearly);
        assert!("hourly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_weekday_from_name() {
        assert_eq!(weekday_from_name("sun"), Some(0));
        assert_eq!(weekday_from_name("Monday"), Some(1));
        assert_eq!(weekday_from_name("th"), Some(4));
        assert_eq!(weekday_from_name("6"), Some(6));
        assert_eq!(weekday_from_name("7"), None);
        assert_eq!(weekday_from_name("t"), None);
        assert_eq!(weekday_from_name("funday"), None);
    }
}
