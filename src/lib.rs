//! Concurrent writer for named log targets.
//!
//! A target name selects its sink by convention:
//!
//! - `|command`: piped to the stdin of `sh -c command`
//! - a name containing `%`: a strftime template, rotated per period (`app-%Y%m%d.log`)
//! - anything else: a file opened for append
//!
//! Every name is opened at most once, on its first write, and the handle is reused for the
//! lifetime of the [`TargetWriter`].

pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod rotation;
pub mod target;
pub mod writer;

pub use config::WriterConfig;
pub use error::{Result, TargetError};
pub use registry::{RegistrySnapshot, Target, TargetRegistry, TargetSnapshot};
pub use rotation::{Clock, ManualClock, PeriodKey, Periodicity, RotationPolicy, SystemClock};
pub use target::{ByteCounts, TargetKind};
pub use writer::{global, TargetWriter};
