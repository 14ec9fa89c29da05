use anyhow::Result;
use calseries_core::SequenceLimits;
use calseries_core::recurrence::try_generate_sequence;
use owo_colors::OwoColorize;

use super::RuleArgs;
use crate::dates::parse_date;
use crate::render::{Render, pluralize};

/// Print the dates a rule produces from `anchor`, without storing anything.
pub fn run(anchor: &str, rule_args: &RuleArgs, json: bool, limits: &SequenceLimits) -> Result<()> {
    let anchor = parse_date(anchor)?;
    let rule = rule_args
        .to_rule(anchor)?
        .ok_or_else(|| anyhow::anyhow!("A frequency is required. Use --freq daily|weekly|monthly|yearly"))?;

    let dates = try_generate_sequence(anchor, &rule, limits)?;

    if json {
        let iso: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
        println!("{}", serde_json::to_string_pretty(&iso)?);
        return Ok(());
    }

    println!("{}", rule.render());
    println!(
        "{}",
        format!(
            "  {} {} from {}",
            dates.len(),
            pluralize("occurrence", dates.len()),
            anchor
        )
        .dimmed()
    );

    for date in &dates {
        println!("  {} {}", date, date.format("%a").dimmed());
    }

    Ok(())
}
