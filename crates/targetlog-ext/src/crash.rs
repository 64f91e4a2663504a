//! Extra key/value pairs for a future crash report.

use std::sync::{Mutex, PoisonError};

/// Receives annotations to include if the process later crashes.
pub trait CrashDiagnostics: Send + Sync {
    fn add_extra(&self, key: &str, value: &str);
}

/// Forwards one annotation. Fire-and-forget.
pub fn crash_log(sink: &dyn CrashDiagnostics, key: &str, value: &str) {
    sink.add_extra(key, value);
}

/// Keeps annotations in memory, in insertion order.
#[derive(Debug, Default)]
pub struct CrashAnnotations {
    entries: Mutex<Vec<(String, String)>>,
}

impl CrashAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Renders the annotations as `key: value` lines for a crash report.
    pub fn render(&self) -> String {
        self.entries()
            .iter()
            .map(|(k, v)| format!("{}: {}\n", k, v))
            .collect()
    }
}

impl CrashDiagnostics for CrashAnnotations {
    fn add_extra(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((key.to_string(), value.to_string()));
    }
}
