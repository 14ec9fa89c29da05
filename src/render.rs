//! TUI rendering traits for calseries types.
//!
//! Extension traits that add colored terminal rendering to calseries-core
//! types using owo_colors.

use calseries_core::{EventInstance, RecurrenceRule, Scope, SeriesChange};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventInstance {
    fn render(&self) -> String {
        let marker = if self.is_series_member() { "↻" } else { " " };
        format!(
            "{} {} {} {}",
            marker.cyan(),
            self.render_when().dimmed(),
            self.title,
            format!("[{}]", short_id(&self.id)).dimmed()
        )
    }
}

impl Render for RecurrenceRule {
    fn render(&self) -> String {
        format!("↻ {}", self.summary()).cyan().to_string()
    }
}

impl Render for Scope {
    fn render(&self) -> String {
        match self {
            Scope::This => self.label().green().to_string(),
            Scope::Future => self.label().yellow().to_string(),
            Scope::All => self.label().red().to_string(),
        }
    }
}

/// First segment of an id, enough to tell events apart on screen.
pub fn short_id(id: &str) -> &str {
    id.split('-').next().filter(|s| !s.is_empty()).unwrap_or(id)
}

/// "Deleted 6 events (This and following events)"
pub fn render_change(verb: &str, change: &SeriesChange, scope: Scope) -> String {
    let label = format!("{} {} {}", verb, change.affected, pluralize("event", change.affected));
    format!("  {} {}", label.green(), format!("({})", scope.label()).dimmed())
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
