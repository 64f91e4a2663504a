//! Tracing setup and event routing to log targets.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      tracing Subscriber                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐                             │
//! │  │ Console Layer│  │ Target Layer │                             │
//! │  │ (RUST_LOG)   │  │ (log_target) │                             │
//! │  └──────────────┘  └──────┬───────┘                             │
//! └───────────────────────────┼─────────────────────────────────────┘
//!                             ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  TargetWriter: file / |pipe / rotating-%Y%m%d file              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use targetlog::{logging, TargetWriter};
//!
//! let writer = Arc::new(TargetWriter::from_env()?);
//! logging::init_with_writer(Arc::clone(&writer));
//!
//! let span = tracing::info_span!("request", log_target = "/var/log/access-%Y%m%d.log");
//! let _guard = span.enter();
//! tracing::info!(status = 200, "GET /");
//! ```

pub mod entry;
pub mod layer;

pub use entry::LogEntry;
pub use layer::{TargetLayer, LOG_TARGET_FIELD};

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::writer::TargetWriter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a console subscriber filtered by `RUST_LOG` (default `info`).
///
/// Call this once at application startup.
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Installs the console subscriber plus a [`TargetLayer`] routing through `writer`.
pub fn init_with_writer(writer: Arc<TargetWriter>) {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(TargetLayer::new(writer))
        .init();
}

/// Installs only the [`TargetLayer`], without console output or filtering.
pub fn init_target_routing_only(writer: Arc<TargetWriter>) {
    tracing_subscriber::registry()
        .with(TargetLayer::new(writer))
        .init();
}
