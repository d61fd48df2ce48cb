//! Normalized projections of remote messages and events.

use serde::{Deserialize, Serialize};

/// Envelope of a mailbox message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailRecord {
    pub id: String,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub date: String,
}

/// A calendar event. `start`/`end` hold the timestamp, or the date for all-day events.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarEventRecord {
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    pub organizer: String,
}

impl CalendarEventRecord {
    /// Convenience constructor, mostly for fixtures.
    pub fn new(id: &str, title: &str, start: &str, end: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            organizer: String::new(),
        }
    }
}
