//! A tracing event rendered for a log target.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::Level;

/// A single event destined for a target.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    /// The event's tracing target (usually its module path).
    pub target: String,
    pub message: String,
    /// Remaining structured fields, in name order.
    pub fields: BTreeMap<String, String>,
}

impl LogEntry {
    pub fn new(level: Level, target: String, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            target,
            message,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = fields;
        self
    }

    /// One newline-terminated line: `<ts> <LEVEL> [<target>] <message> {k=v, ..}`.
    pub fn to_line(&self) -> String {
        let fields_str = if self.fields.is_empty() {
            String::new()
        } else {
            let fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!(" {{{}}}", fields.join(", "))
        };

        format!(
            "{} {} [{}] {}{}\n",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.level,
            self.target,
            self.message,
            fields_str
        )
    }
}
