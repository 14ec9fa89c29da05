pub mod delete;
pub mod edit;
pub mod expand;
pub mod list;
pub mod new;

use std::io::IsTerminal;

use anyhow::{Context, Result};
use calseries_core::rule::weekday_from_name;
use calseries_core::{EventInstance, Frequency, RecurrenceRule, Scope};
use chrono::{Datelike, NaiveDate};
use clap::Args;
use dialoguer::Select;

use crate::dates::parse_date;
use crate::render::Render;

/// Recurrence flags shared by `expand` and `new`.
#[derive(Args, Debug, Default, Clone)]
pub struct RuleArgs {
    /// Repeat frequency: daily, weekly, monthly or yearly
    #[arg(long)]
    pub freq: Option<Frequency>,

    /// Repeat every N periods
    #[arg(long, default_value_t = 1)]
    pub interval: u32,

    /// Weekdays for weekly rules (e.g. "mon,wed" or "1,3")
    #[arg(long, value_delimiter = ',')]
    pub on: Vec<String>,

    /// Day of month for monthly rules; must be the start date's day
    #[arg(long)]
    pub month_day: Option<u8>,

    /// Stop after this many occurrences
    #[arg(long, conflicts_with = "until")]
    pub count: Option<u32>,

    /// Last possible date (inclusive)
    #[arg(long)]
    pub until: Option<String>,

    /// Dates to skip (comma separated)
    #[arg(long = "except", value_delimiter = ',')]
    pub exceptions: Vec<String>,
}

impl RuleArgs {
    /// Build the rule for a series starting on `anchor`, or None when no
    /// frequency was given.
    pub fn to_rule(&self, anchor: NaiveDate) -> Result<Option<RecurrenceRule>> {
        let Some(frequency) = self.freq else {
            return Ok(None);
        };

        let mut rule = RecurrenceRule::new(frequency).with_interval(self.interval);

        if !self.on.is_empty() {
            let weekdays = self
                .on
                .iter()
                .map(|name| {
                    weekday_from_name(name)
                        .ok_or_else(|| anyhow::anyhow!("Unknown weekday: \"{}\"", name))
                })
                .collect::<Result<Vec<u8>>>()?;
            rule = rule.on_weekdays(weekdays);
        }

        if let Some(day) = self.month_day {
            if frequency != Frequency::Monthly {
                anyhow::bail!("--month-day only applies to --freq monthly");
            }
            // Monthly dates follow the start date's day of month.
            if u32::from(day) != anchor.day() {
                anyhow::bail!(
                    "--month-day {} does not match the start date {} (day {}). Start the series on a day {} instead.",
                    day,
                    anchor,
                    anchor.day(),
                    day
                );
            }
            rule = rule.on_month_day(day);
        }

        if let Some(count) = self.count {
            rule = rule.with_count(count);
        }

        if let Some(until) = &self.until {
            rule = rule.with_until(parse_date(until)?);
        }

        for exception in &self.exceptions {
            rule = rule.with_exception(parse_date(exception)?);
        }

        rule.validate()?;
        Ok(Some(rule))
    }
}

/// Resolve an id or unique id prefix against the stored instances.
///
/// Unknown ids are passed through so the engine reports them as not found.
pub fn resolve_target(instances: &[EventInstance], id: &str) -> Result<String> {
    if instances.iter().any(|instance| instance.id == id) {
        return Ok(id.to_string());
    }

    let matches: Vec<&EventInstance> = instances
        .iter()
        .filter(|instance| instance.id.starts_with(id))
        .collect();

    match matches.as_slice() {
        [single] => Ok(single.id.clone()),
        [] => Ok(id.to_string()),
        many => anyhow::bail!(
            "Id '{}' is ambiguous, it matches {} events. Use more characters.",
            id,
            many.len()
        ),
    }
}

/// Pick the scope of a change. Events outside a series are always `this`;
/// for series members without `--scope` the user is asked.
pub fn resolve_scope(scope: Option<Scope>, target: &EventInstance, action: &str) -> Result<Scope> {
    if let Some(scope) = scope {
        return Ok(scope);
    }

    if !target.is_series_member() {
        return Ok(Scope::This);
    }

    if !std::io::stdin().is_terminal() {
        anyhow::bail!(
            "\"{}\" is a recurring event. Use --scope this|future|all to choose what to {}.",
            target.title,
            action
        );
    }

    let items: Vec<String> = Scope::ALL_SCOPES.iter().map(|s| s.render()).collect();
    let selection = Select::new()
        .with_prompt(format!("  {} recurring event", capitalize(action)))
        .items(&items)
        .default(0)
        .interact()
        .context("Could not read scope selection")?;

    Ok(Scope::ALL_SCOPES[selection])
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
