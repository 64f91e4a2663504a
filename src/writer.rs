//! The public write operation.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use envconfig::Envconfig;
use once_cell::sync::Lazy;

use crate::{
    config::WriterConfig,
    error::{Result, TargetError},
    registry::{Target, TargetRegistry},
    rotation::{Clock, SystemClock},
};

/// Writes messages to named targets.
///
/// ```ignore
/// let writer = TargetWriter::new(WriterConfig::default());
///
/// writer.write("/tmp/a.log", b"hello");
/// writer.write("|logger -t app", b"piped");
/// writer.write("/var/log/app-%Y%m%d.log", b"rotated daily");
/// ```
///
/// Each target is opened on the first write to its name and kept open for the writer's
/// lifetime. Dropping the writer closes every file and waits for piped commands to exit;
/// a piped command that ignores end of input keeps the drop waiting until it exits.
#[derive(Debug)]
pub struct TargetWriter {
    enabled: AtomicBool,
    config: WriterConfig,
    registry: TargetRegistry,
    clock: Arc<dyn Clock>,
}

impl TargetWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Uses `clock` instead of the host's local time to drive rotation.
    pub fn with_clock(config: WriterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
            config,
            registry: TargetRegistry::new(),
            clock,
        }
    }

    /// Builds a writer from `TARGETLOG_*` environment variables.
    pub fn from_env() -> std::result::Result<Self, envconfig::Error> {
        Ok(Self::new(WriterConfig::init_from_env()?))
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Flips the administrative gate. While off, every write fails without touching targets.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Appends `message` to the target `name`. Returns whether the message was written.
    pub fn write(&self, name: &str, message: &[u8]) -> bool {
        self.try_write(name, message).is_ok()
    }

    /// Like [`write`](Self::write), reporting why a write failed.
    pub fn try_write(&self, name: &str, message: &[u8]) -> Result<()> {
        if !self.is_enabled() {
            return Err(TargetError::Disabled);
        }

        let chunk = self.config.drop_cache_chunk;
        match self
            .registry
            .resolve(name, self.clock.now(), self.config.create_dirs)?
        {
            Target::Fixed(target) => target.write(message, chunk),
            // Resolution may have waited on the registry lock; take a fresh reading.
            Target::Rotating(target) => target.write(self.clock.now(), message, chunk),
        }
    }
}

impl Default for TargetWriter {
    fn default() -> Self {
        Self::new(WriterConfig::default())
    }
}

static GLOBAL_WRITER: Lazy<Arc<TargetWriter>> = Lazy::new(|| {
    let config = WriterConfig::init_from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "invalid TARGETLOG_* environment, using defaults");
        WriterConfig::default()
    });
    Arc::new(TargetWriter::new(config))
});

/// Process-wide writer, configured from the environment on first use.
///
/// Prefer constructing a [`TargetWriter`] and passing it where it is needed; this exists for
/// call sites that cannot be handed one.
pub fn global() -> Arc<TargetWriter> {
    GLOBAL_WRITER.clone()
}
