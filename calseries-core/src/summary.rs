//! Human-readable rule summaries ("Every 2 weeks on Mon, Wed").

use std::fmt;

use crate::rule::{EndType, RecurrenceRule, WEEKDAY_NAMES};

impl RecurrenceRule {
    /// One-line description of the rule, for lists and confirmations.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.interval <= 1 {
            write!(f, "{}", self.frequency)?;
        } else {
            write!(f, "Every {} {}s", self.interval, self.frequency.unit())?;
        }

        if self.has_weekday_filter() {
            let days: Vec<&str> = self
                .by_weekday
                .iter()
                .filter_map(|d| WEEKDAY_NAMES.get(usize::from(*d)).copied())
                .collect();
            write!(f, " on {}", days.join(", "))?;
        }

        match (self.end_type, self.count, self.until) {
            (EndType::Count, Some(count), _) => write!(f, ", until count of {}", count)?,
            (EndType::Until, _, Some(until)) => write!(f, ", until {}", until)?,
            _ => {}
        }

        match self.exceptions.len() {
            0 => {}
            1 => write!(f, " (except 1 date)")?,
            n => write!(f, " (except {} dates)", n)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::rule::Frequency;

    #[test]
    fn test_simple_frequencies() {
        assert_eq!(RecurrenceRule::new(Frequency::Daily).summary(), "Daily");
        assert_eq!(RecurrenceRule::new(Frequency::Yearly).summary(), "Yearly");
        assert_eq!(
            RecurrenceRule::new(Frequency::Monthly)
                .with_interval(3)
                .summary(),
            "Every 3 months"
        );
    }

    #[test]
    fn test_weekly_with_days_and_count() {
        let rule = RecurrenceRule::new(Frequency::Weekly)
            .with_interval(2)
            .on_weekdays([3, 1])
            .with_count(10);
        assert_eq!(rule.summary(), "Every 2 weeks on Mon, Wed, until count of 10");
    }

    #[test]
    fn test_monthly_until_and_exceptions() {
        let rule = RecurrenceRule::new(Frequency::Monthly)
            .on_month_day(15)
            .with_until(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap())
            .with_exception(NaiveDate::from_ymd_opt(2026, 2, 15).unwrap())
            .with_exception(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        assert_eq!(
            rule.to_string(),
            "Monthly, until 2026-06-30 (except 2 dates)"
        );
    }

    #[test]
    fn test_weekday_list_ignored_for_non_weekly_rules() {
        let rule = RecurrenceRule::new(Frequency::Daily).on_weekdays([1]);
        assert_eq!(rule.summary(), "Daily");
    }
}
