use anyhow::Result;
use calseries_core::materialize::SeriesMaterializer;
use calseries_core::store::EventStore;
use calseries_core::{EventTemplate, SequenceLimits};
use owo_colors::OwoColorize;

use super::RuleArgs;
use crate::dates::{parse_date, parse_time};
use crate::render::{Render, pluralize};

/// Event details from the command line.
pub struct NewEvent {
    pub title: String,
    pub start: String,
    pub at: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Create a one-off event, or a whole series when a frequency is given.
pub fn run(store: &EventStore, new: NewEvent, rule_args: &RuleArgs, limits: SequenceLimits) -> Result<()> {
    let anchor = parse_date(&new.start)?;

    let template = EventTemplate {
        title: new.title,
        description: new.description.filter(|d| !d.is_empty()),
        location: new.location.filter(|l| !l.is_empty()),
        start_time: new.at.as_deref().map(parse_time).transpose()?,
        end_time: new.end_time.as_deref().map(parse_time).transpose()?,
    };

    if template.end_time.is_some() && template.start_time.is_none() {
        anyhow::bail!("--end-time needs a start time (--at)");
    }

    let mut materializer = SeriesMaterializer::system(limits);

    match rule_args.to_rule(anchor)? {
        Some(rule) => {
            let instances = materializer.materialize(&template, anchor, &rule)?;
            let count = instances.len();
            store.append(instances)?;

            println!(
                "{}",
                format!(
                    "  Created: {} ({} {})",
                    template.title,
                    count,
                    pluralize("occurrence", count)
                )
                .green()
            );
            println!("  {}", rule.render());
        }
        None => {
            let instance = materializer.single(&template, anchor);
            store.append(vec![instance.clone()])?;
            println!("{}", format!("  Created: {}", template.title).green());
            println!("  {}", instance.render());
        }
    }

    Ok(())
}
