//! Boundary helpers that sit next to the target writer.
//!
//! The subsystems behind these traits (crash reporting, server status, request timing,
//! interpreter state) live elsewhere; this crate only adapts their output into
//! `serde_json` values and bundles them with a [`TargetWriter`] in [`Output`].

pub mod crash;
pub mod state;
pub mod status;
pub mod timers;

use std::sync::Arc;

use serde_json::{Map, Value};
use targetlog::TargetWriter;

pub use crash::{crash_log, CrashAnnotations, CrashDiagnostics};
pub use state::{output_global_state, GlobalState, GlobalStateSource};
pub use status::{get_status, StatusReporter};
pub use timers::{get_timers, RequestTimers, RequestTimes};

/// A writer plus the collaborators an output surface reports on.
pub struct Output {
    writer: Arc<TargetWriter>,
    crash: Arc<dyn CrashDiagnostics>,
    status: Arc<dyn StatusReporter>,
    timers: Arc<dyn RequestTimers>,
    state: Arc<dyn GlobalStateSource>,
}

impl Output {
    pub fn new(
        writer: Arc<TargetWriter>,
        crash: Arc<dyn CrashDiagnostics>,
        status: Arc<dyn StatusReporter>,
        timers: Arc<dyn RequestTimers>,
        state: Arc<dyn GlobalStateSource>,
    ) -> Self {
        Self {
            writer,
            crash,
            status,
            timers,
            state,
        }
    }

    pub fn writer(&self) -> &Arc<TargetWriter> {
        &self.writer
    }

    /// Appends `message` to the target `name`.
    pub fn log(&self, name: &str, message: &[u8]) -> bool {
        self.writer.write(name, message)
    }

    pub fn crash_log(&self, key: &str, value: &str) {
        crash_log(self.crash.as_ref(), key, value);
    }

    pub fn status(&self) -> Result<Value, serde_json::Error> {
        get_status(self.status.as_ref())
    }

    pub fn timers(&self, as_float: bool) -> Option<Map<String, Value>> {
        get_timers(self.timers.as_ref(), as_float)
    }

    pub fn global_state(&self, serialize: bool) -> Result<GlobalState, serde_json::Error> {
        output_global_state(self.state.as_ref(), serialize)
    }
}
