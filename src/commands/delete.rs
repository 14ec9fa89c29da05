use anyhow::Result;
use calseries_core::store::{EventStore, find};
use calseries_core::{Scope, apply_scoped_delete};

use super::{resolve_scope, resolve_target};
use crate::render::render_change;

pub fn run(store: &EventStore, id: &str, scope: Option<Scope>) -> Result<()> {
    let instances = store.load()?;
    let target_id = resolve_target(&instances, id)?;

    let scope = match find(&instances, &target_id) {
        Some(target) => resolve_scope(scope, target, "delete")?,
        None => scope.unwrap_or(Scope::This),
    };

    let change = apply_scoped_delete(&instances, &target_id, scope)?;
    store.save(&change.instances)?;

    println!("{}", render_change("Deleted", &change, scope));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calseries_core::materialize::{FixedClock, SequentialIdGenerator, SeriesMaterializer};
    use calseries_core::{EventTemplate, Frequency, RecurrenceRule, SequenceLimits};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn seeded_store(dir: &std::path::Path) -> EventStore {
        let mut materializer = SeriesMaterializer::new(
            SequentialIdGenerator::new("evt"),
            FixedClock(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            SequenceLimits::default(),
        );
        let rule = RecurrenceRule::new(Frequency::Daily).with_count(10);
        let anchor = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let instances = materializer
            .materialize(&EventTemplate::new("Walk"), anchor, &rule)
            .unwrap();

        let store = EventStore::new(dir.join("events.json"));
        store.save(&instances).unwrap();
        store
    }

    #[test]
    fn delete_future_from_fifth_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        // evt-1 is the series id; evt-6 is the fifth occurrence
        run(&store, "evt-6", Some(Scope::Future)).unwrap();

        let remaining = store.load().unwrap();
        let ids: Vec<_> = remaining.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["evt-2", "evt-3", "evt-4", "evt-5"]);
    }

    #[test]
    fn delete_unknown_id_fails_and_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path());

        assert!(run(&store, "nope", Some(Scope::All)).is_err());
        assert_eq!(store.load().unwrap().len(), 10);
    }
}
