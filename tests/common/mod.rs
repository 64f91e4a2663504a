//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use chrono::{NaiveDate, NaiveDateTime};
use targetlog::{ManualClock, TargetWriter, WriterConfig};

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

/// A writer driven by a manual clock, with cache-drop disabled.
pub fn manual_writer(start: NaiveDateTime) -> (TargetWriter, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let writer = TargetWriter::with_clock(
        WriterConfig::default().with_drop_cache_chunk(0),
        clock.clone(),
    );
    (writer, clock)
}

pub fn name_in(dir: &Path, file: &str) -> String {
    dir.join(file).display().to_string()
}

pub fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}
