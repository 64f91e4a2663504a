//! Name → open target entries, created at most once per name.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::{
    error::Result,
    rotation::{PeriodKey, RotatingTarget},
    target::{ByteCounts, FixedTarget, TargetKind, TargetSpec},
};

/// A resolved entry, shared with the caller beyond the registry lock.
#[derive(Debug, Clone)]
pub enum Target {
    Fixed(Arc<FixedTarget>),
    Rotating(Arc<RotatingTarget>),
}

impl Target {
    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Fixed(t) => t.kind(),
            Target::Rotating(_) => TargetKind::Rotating,
        }
    }

    pub fn counters(&self) -> Option<ByteCounts> {
        match self {
            Target::Fixed(t) => t.counters(),
            Target::Rotating(t) => Some(t.counters()),
        }
    }
}

#[derive(Debug, Default)]
struct Namespaces {
    /// Plain files and pipes.
    fixed: HashMap<String, Arc<FixedTarget>>,
    /// Strftime templates.
    rotating: HashMap<String, Arc<RotatingTarget>>,
}

impl Namespaces {
    fn get(&self, name: &str) -> Option<Target> {
        if let Some(t) = self.fixed.get(name) {
            return Some(Target::Fixed(Arc::clone(t)));
        }
        self.rotating
            .get(name)
            .map(|t| Target::Rotating(Arc::clone(t)))
    }
}

/// One target entry per line in a [`RegistrySnapshot`].
#[derive(Debug, Clone, Serialize)]
pub struct TargetSnapshot {
    pub name: String,
    pub kind: TargetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counters: Option<ByteCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollovers: Option<u64>,
}

/// Serializable view of every registered target.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub open_count: u64,
    pub targets: Vec<TargetSnapshot>,
}

/// Registry of open targets.
///
/// Lookups share a read lock; creation takes the write lock and re-checks before opening, so
/// two racing callers never open two handles for one name. Entries live until the registry
/// is dropped. A failed creation is not remembered.
#[derive(Debug, Default)]
pub struct TargetRegistry {
    entries: RwLock<Namespaces>,
    /// Successful opens and spawns at creation time.
    created: AtomicU64,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `name`, creating it if absent.
    ///
    /// `now` is only used to pick the first period of a new rotating entry.
    pub fn resolve(&self, name: &str, now: NaiveDateTime, create_dirs: bool) -> Result<Target> {
        if let Some(target) = self.get(name) {
            return Ok(target);
        }

        let target = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(target) = entries.get(name) {
                return Ok(target);
            }

            let target = match TargetSpec::parse(name) {
                TargetSpec::Pipe { command } => {
                    let t = Arc::new(FixedTarget::spawn_pipe(name, command)?);
                    entries.fixed.insert(name.to_string(), Arc::clone(&t));
                    Target::Fixed(t)
                }
                TargetSpec::Rotating { template } => {
                    let t = Arc::new(RotatingTarget::open(template, now, create_dirs)?);
                    entries.rotating.insert(name.to_string(), Arc::clone(&t));
                    Target::Rotating(t)
                }
                TargetSpec::File { path } => {
                    let t = Arc::new(FixedTarget::open_file(name, path)?);
                    entries.fixed.insert(name.to_string(), Arc::clone(&t));
                    Target::Fixed(t)
                }
            };
            self.created.fetch_add(1, Ordering::AcqRel);
            target
        };

        debug!(target_name = name, kind = ?target.kind(), "opened log target");
        Ok(target)
    }

    /// Looks `name` up without creating it.
    pub fn get(&self, name: &str) -> Option<Target> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn kind(&self, name: &str) -> Option<TargetKind> {
        self.get(name).map(|t| t.kind())
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.fixed.len() + entries.rotating.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Files opened and processes spawned so far, rotation reopens included.
    pub fn open_count(&self) -> u64 {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        self.opens(&entries)
    }

    fn opens(&self, entries: &Namespaces) -> u64 {
        let reopened: u64 = entries.rotating.values().map(|t| t.rollovers()).sum();
        self.created.load(Ordering::Acquire) + reopened
    }

    /// Byte counters for `name`; `None` for pipes and unknown names.
    pub fn counters(&self, name: &str) -> Option<ByteCounts> {
        self.get(name).and_then(|t| t.counters())
    }

    pub fn current_period(&self, name: &str) -> Option<PeriodKey> {
        match self.get(name)? {
            Target::Rotating(t) => Some(t.current_period()),
            Target::Fixed(_) => None,
        }
    }

    pub fn rollovers(&self, name: &str) -> Option<u64> {
        match self.get(name)? {
            Target::Rotating(t) => Some(t.rollovers()),
            Target::Fixed(_) => None,
        }
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        let mut targets: Vec<TargetSnapshot> = entries
            .fixed
            .values()
            .map(|t| TargetSnapshot {
                name: t.name().to_string(),
                kind: t.kind(),
                counters: t.counters(),
                current_period: None,
                rollovers: None,
            })
            .chain(entries.rotating.values().map(|t| TargetSnapshot {
                name: t.name().to_string(),
                kind: TargetKind::Rotating,
                counters: Some(t.counters()),
                current_period: Some(t.current_period().to_string()),
                rollovers: Some(t.rollovers()),
            }))
            .collect();
        targets.sort_by(|a, b| a.name.cmp(&b.name));

        RegistrySnapshot {
            open_count: self.opens(&entries),
            targets,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread};

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let name = dir.path().join("a.log").display().to_string();
        let registry = TargetRegistry::new();

        let first = registry.resolve(&name, noon(), true).unwrap();
        let second = registry.resolve(&name, noon(), true).unwrap();

        match (first, second) {
            (Target::Fixed(a), Target::Fixed(b)) => assert!(Arc::ptr_eq(&a, &b)),
            other => panic!("expected fixed targets, got {:?}", other),
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.open_count(), 1);
    }

    #[test]
    fn test_names_land_in_one_namespace() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.log").display().to_string();
        let rotating = format!("{}/rot-%Y%m%d.log", dir.path().display());
        let registry = TargetRegistry::new();

        registry.resolve(&file, noon(), true).unwrap();
        registry.resolve(&rotating, noon(), true).unwrap();

        let entries = registry.entries.read().unwrap();
        assert!(entries.fixed.contains_key(&file));
        assert!(!entries.rotating.contains_key(&file));
        assert!(entries.rotating.contains_key(&rotating));
        assert!(!entries.fixed.contains_key(&rotating));
    }

    #[test]
    fn test_failed_open_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let name = dir.path().join("later").join("a.log").display().to_string();
        let registry = TargetRegistry::new();

        assert!(registry.resolve(&name, noon(), true).is_err());
        assert!(!registry.contains(&name));
        assert_eq!(registry.open_count(), 0);

        std::fs::create_dir(dir.path().join("later")).unwrap();
        assert!(registry.resolve(&name, noon(), true).is_ok());
        assert_eq!(registry.kind(&name), Some(TargetKind::File));
    }

    #[test]
    fn test_racing_resolves_share_one_entry() {
        let dir = TempDir::new().unwrap();
        let name = dir.path().join("race.log").display().to_string();
        let registry = Arc::new(TargetRegistry::new());
        let barrier = Arc::new(Barrier::new(16));

        let threads: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                let name = name.clone();
                thread::spawn(move || {
                    barrier.wait();
                    match registry.resolve(&name, noon(), true).unwrap() {
                        Target::Fixed(t) => Arc::as_ptr(&t) as usize,
                        Target::Rotating(t) => Arc::as_ptr(&t) as usize,
                    }
                })
            })
            .collect();

        let ptrs: Vec<usize> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert!(ptrs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(registry.open_count(), 1);
    }

    #[test]
    fn test_snapshot_lists_targets() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.log").display().to_string();
        let rotating = format!("{}/b-%Y%m%d.log", dir.path().display());
        let registry = TargetRegistry::new();

        registry.resolve(&file, noon(), true).unwrap();
        registry.resolve(&rotating, noon(), true).unwrap();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.open_count, 2);
        assert_eq!(snapshot.targets.len(), 2);
        assert_eq!(snapshot.targets[0].kind, TargetKind::File);
        assert_eq!(snapshot.targets[1].kind, TargetKind::Rotating);
        assert_eq!(
            snapshot.targets[1].current_period.as_deref(),
            Some("2024-06-01T00:00:00")
        );

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["targets"][1]["kind"], "rotating");
        assert!(json["targets"][0].get("rollovers").is_none());
    }
}
