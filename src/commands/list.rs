use anyhow::Result;
use calseries_core::store::EventStore;
use calseries_core::{EventInstance, series::series_members};
use chrono::NaiveDate;
use owo_colors::OwoColorize;

use crate::render::Render;

pub fn run(store: &EventStore, series: Option<&str>, from: Option<NaiveDate>) -> Result<()> {
    let instances = store.load()?;

    let mut shown: Vec<&EventInstance> = match series {
        Some(series_id) => series_members(&instances, series_id),
        None => instances.iter().collect(),
    };
    if let Some(from) = from {
        shown.retain(|instance| instance.date >= from);
    }
    shown.sort_by_key(|instance| (instance.date, instance.start_time));

    if shown.is_empty() {
        println!("{}", "No events".dimmed());
        return Ok(());
    }

    if let Some(rule) = series.and_then(|_| shown.first()).and_then(|i| i.recurrence.as_ref()) {
        println!("{}", rule.render());
    }

    for instance in shown {
        println!("{}", instance.render());
    }

    Ok(())
}
