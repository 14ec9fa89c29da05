//! Shared defaults.

/// Occurrences generated for a rule that never ends.
pub const DEFAULT_MAX_OCCURRENCES: usize = 365;

/// Upper bound on any generated sequence, whatever the rule says.
pub const HARD_SAFETY_CAP: usize = 1000;

/// Date format used for anchors, exceptions and on-disk dates.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
