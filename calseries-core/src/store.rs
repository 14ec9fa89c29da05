//! JSON file holding every event instance.

use std::path::{Path, PathBuf};

use crate::error::{CalSeriesError, CalSeriesResult};
use crate::instance::EventInstance;

pub struct EventStore {
    path: PathBuf,
}

impl EventStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EventStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all instances. A missing file is an empty calendar.
    pub fn load(&self) -> CalSeriesResult<Vec<EventInstance>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            CalSeriesError::Store(format!("Could not read {}: {}", self.path.display(), e))
        })
    }

    /// Replace the stored collection, ordered by date.
    pub fn save(&self, instances: &[EventInstance]) -> CalSeriesResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let mut sorted: Vec<&EventInstance> = instances.iter().collect();
        sorted.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.start_time.cmp(&b.start_time)));

        let content = serde_json::to_string_pretty(&sorted)
            .map_err(|e| CalSeriesError::Serialization(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;

        tracing::debug!(path = %self.path.display(), count = instances.len(), "Saved event store");
        Ok(())
    }

    /// Append new instances to the stored collection.
    pub fn append(&self, new_instances: Vec<EventInstance>) -> CalSeriesResult<Vec<EventInstance>> {
        let mut instances = self.load()?;

        if let Some(duplicate) = new_instances
            .iter()
            .find(|new| instances.iter().any(|existing| existing.id == new.id))
        {
            return Err(CalSeriesError::Store(format!(
                "An event with id '{}' already exists",
                duplicate.id
            )));
        }

        instances.extend(new_instances);
        self.save(&instances)?;
        Ok(instances)
    }
}

/// Look up an instance by id.
pub fn find<'a>(instances: &'a [EventInstance], id: &str) -> Option<&'a EventInstance> {
    instances.iter().find(|instance| instance.id == id)
}
