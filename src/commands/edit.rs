use anyhow::Result;
use calseries_core::store::{EventStore, find};
use calseries_core::{EventPatch, Scope, apply_scoped_edit};

use super::{resolve_scope, resolve_target};
use crate::render::render_change;

/// Apply `patch` to the event `id` and, depending on scope, its series.
pub fn run(store: &EventStore, id: &str, scope: Option<Scope>, patch: EventPatch) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("Nothing to change. Pass at least one of --title, --location, --description, --date, --at, --end-time");
    }

    let instances = store.load()?;
    let target_id = resolve_target(&instances, id)?;

    let scope = match find(&instances, &target_id) {
        Some(target) => {
            let scope = resolve_scope(scope, target, "edit")?;
            if patch.date.is_some() && target.is_series_member() && scope != Scope::This {
                anyhow::bail!(
                    "--date moves a single event. Use --scope this to move \"{}\" out of its series.",
                    target.title
                );
            }
            scope
        }
        None => scope.unwrap_or(Scope::This),
    };

    let change = apply_scoped_edit(&instances, &target_id, scope, &patch)?;
    store.save(&change.instances)?;

    println!("{}", render_change("Updated", &change, scope));
    Ok(())
}
