//! Time-rotated file targets.
//!
//! A target name containing strftime conversions (`/var/log/app-%Y%m%d.log`) is a template.
//! The finest conversion it uses sets the rotation period, and each period writes to the
//! template rendered at the period's start. Before every write the current period is
//! recomputed; when it is later than the active one the next file is opened and the previous
//! handle is closed. Periods only move forward: a write stamped with an earlier time goes to
//! the active file.

pub mod clock;
pub mod policy;

use std::{
    fs::{self, File},
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        PoisonError, RwLock,
    },
};

use chrono::NaiveDateTime;
use tracing::debug;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{PeriodKey, Periodicity, RotationPolicy, WeekStart};

use crate::{
    error::{Result, TargetError},
    target::{append_counted, open_append, ByteCounter, ByteCounts},
};

/// The open file for one rotation period.
#[derive(Debug)]
struct ActivePeriod {
    key: PeriodKey,
    path: PathBuf,
    file: File,
}

impl ActivePeriod {
    fn open(policy: &RotationPolicy, key: PeriodKey, create_dirs: bool) -> Result<Self> {
        let path = policy.concrete_path(key)?;
        if create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| TargetError::Open {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let file = open_append(&path)?;
        Ok(Self { key, path, file })
    }
}

/// A target whose file changes with each rotation period.
#[derive(Debug)]
pub struct RotatingTarget {
    name: String,
    policy: RotationPolicy,
    create_dirs: bool,
    active: RwLock<ActivePeriod>,
    counter: ByteCounter,
    rollovers: AtomicU64,
}

impl RotatingTarget {
    /// Parses `template` and opens the file for the period containing `now`.
    pub fn open(template: &str, now: NaiveDateTime, create_dirs: bool) -> Result<Self> {
        let policy = RotationPolicy::parse(template)?;
        let active = ActivePeriod::open(&policy, policy.period_key(now), create_dirs)?;

        Ok(Self {
            name: template.to_string(),
            policy,
            create_dirs,
            active: RwLock::new(active),
            counter: ByteCounter::new(),
            rollovers: AtomicU64::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    pub fn current_period(&self) -> PeriodKey {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .key
    }

    pub fn current_path(&self) -> PathBuf {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .path
            .clone()
    }

    /// Number of period changes since the target was created.
    pub fn rollovers(&self) -> u64 {
        self.rollovers.load(Ordering::Acquire)
    }

    /// Counters accumulate across periods.
    pub fn counters(&self) -> ByteCounts {
        self.counter.counts()
    }

    /// Rolls over if `now` is in a later period, then appends `message`.
    ///
    /// A `now` that falls before the active period (a timestamp taken before another writer
    /// rolled over) appends to the active file. If the next period's file cannot be opened the previous handle is kept and the period
    /// is left unchanged, so the following write tries again.
    pub fn write(&self, now: NaiveDateTime, message: &[u8], drop_cache_chunk: u64) -> Result<()> {
        let key = self.policy.period_key(now);
        {
            let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
            if key <= active.key {
                return self.append(&active, message, drop_cache_chunk);
            }
        }

        let (written, closed) = {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            let mut closed = None;
            // Another writer may have rolled over while we waited.
            if key > active.key {
                let next = ActivePeriod::open(&self.policy, key, self.create_dirs)?;
                let previous = std::mem::replace(&mut *active, next);
                self.rollovers.fetch_add(1, Ordering::AcqRel);
                closed = Some(previous.path);
            }
            (self.append(&active, message, drop_cache_chunk), closed)
        };

        if let Some(closed) = closed {
            debug!(
                target_name = %self.name,
                closed = %closed.display(),
                opened = %self.current_path().display(),
                period = %key,
                "rotated log target"
            );
        }
        written
    }

    fn append(&self, active: &ActivePeriod, message: &[u8], drop_cache_chunk: u64) -> Result<()> {
        append_counted(&active.file, &self.counter, message, drop_cache_chunk).map_err(|source| {
            TargetError::Write {
                target: self.name.clone(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn at(d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_rollover_switches_files() {
        let dir = TempDir::new().unwrap();
        let template = format!("{}/app-%Y%m%d.log", dir.path().display());

        let target = RotatingTarget::open(&template, at(1, 23, 59), false).unwrap();
        target.write(at(1, 23, 59), b"m1", 0).unwrap();
        let first = target.current_path();
        let first_key = target.current_period();

        target.write(at(2, 0, 1), b"m2", 0).unwrap();
        let second = target.current_path();

        assert_ne!(first, second);
        assert_ne!(first_key, target.current_period());
        assert_eq!(target.rollovers(), 1);
        assert!(second.starts_with(dir.path()));
        assert_eq!(fs::read_to_string(first).unwrap(), "m1");
        assert_eq!(fs::read_to_string(second).unwrap(), "m2");
        assert_eq!(target.counters().written, 4);
    }

    #[test]
    fn test_same_period_does_not_roll() {
        let dir = TempDir::new().unwrap();
        let template = format!("{}/app-%Y%m%d%H.log", dir.path().display());

        let target = RotatingTarget::open(&template, at(5, 10, 0), false).unwrap();
        for minute in 0..60 {
            target.write(at(5, 10, minute), b".", 0).unwrap();
        }

        assert_eq!(target.rollovers(), 0);
        assert_eq!(fs::read_to_string(target.current_path()).unwrap().len(), 60);
    }

    #[test]
    fn test_late_timestamp_never_rolls_back() {
        let dir = TempDir::new().unwrap();
        let template = format!("{}/app-%Y%m%d.log", dir.path().display());

        let target = RotatingTarget::open(&template, at(9, 23, 59), false).unwrap();
        target.write(at(10, 0, 0), b"t2 ", 0).unwrap();
        let key = target.current_period();

        // Stamped before midnight, but the day-10 file is already active.
        target.write(at(9, 23, 59), b"t1 ", 0).unwrap();
        target.write(at(10, 0, 1), b"t3 ", 0).unwrap();

        assert_eq!(target.current_period(), key);
        assert_eq!(target.rollovers(), 1);
        let day9 = dir.path().join("app-20240109.log");
        let day10 = dir.path().join("app-20240110.log");
        assert_eq!(fs::read_to_string(day9).unwrap(), "");
        assert_eq!(fs::read_to_string(day10).unwrap(), "t2 t1 t3 ");
    }

    #[test]
    fn test_creates_period_directories() {
        let dir = TempDir::new().unwrap();
        let template = format!("{}/%Y/%m/app-%d.log", dir.path().display());

        let target = RotatingTarget::open(&template, at(9, 8, 0), true).unwrap();
        target.write(at(9, 8, 0), b"x", 0).unwrap();

        assert_eq!(
            target.current_path(),
            dir.path().join("2024").join("01").join("app-09.log")
        );
    }

    #[test]
    fn test_failed_rollover_keeps_previous_period() {
        let dir = TempDir::new().unwrap();
        let template = format!("{}/%d/app.log", dir.path().display());
        fs::create_dir(dir.path().join("03")).unwrap();

        let target = RotatingTarget::open(&template, at(3, 12, 0), false).unwrap();
        let key = target.current_period();

        // Day 04's directory does not exist and may not be created.
        assert!(target.write(at(4, 0, 0), b"lost", 0).is_err());
        assert_eq!(target.current_period(), key);
        assert_eq!(target.rollovers(), 0);

        fs::create_dir(dir.path().join("04")).unwrap();
        target.write(at(4, 0, 0), b"kept", 0).unwrap();
        assert_eq!(target.rollovers(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("04").join("app.log")).unwrap(),
            "kept"
        );
    }
}
