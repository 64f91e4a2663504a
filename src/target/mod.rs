//! Target classification and the non-rotating sinks.

pub mod counter;
pub mod pipe;
pub mod platform;

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;

pub use counter::{ByteCounter, ByteCounts};
pub use pipe::PipeSink;

use crate::error::{Result, TargetError};

/// Prefix marking a target name as a shell command.
pub const PIPE_SIGIL: char = '|';

/// Marker of a strftime placeholder; its presence makes a target rotate.
pub const TIME_PLACEHOLDER: char = '%';

/// What a target name resolves to, decided once when its entry is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    File,
    Pipe,
    Rotating,
}

/// A target name split by the naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec<'a> {
    /// `|cmd`: everything after the sigil is handed to `sh -c`.
    Pipe { command: &'a str },
    /// A name containing `%`: a strftime template.
    Rotating { template: &'a str },
    /// Anything else: a path opened for append.
    File { path: &'a Path },
}

impl<'a> TargetSpec<'a> {
    pub fn parse(name: &'a str) -> Self {
        if let Some(command) = name.strip_prefix(PIPE_SIGIL) {
            TargetSpec::Pipe { command }
        } else if name.contains(TIME_PLACEHOLDER) {
            TargetSpec::Rotating { template: name }
        } else {
            TargetSpec::File {
                path: Path::new(name),
            }
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TargetSpec::Pipe { .. } => TargetKind::Pipe,
            TargetSpec::Rotating { .. } => TargetKind::Rotating,
            TargetSpec::File { .. } => TargetKind::File,
        }
    }
}

/// Opens `path` for append, creating it if needed.
pub(crate) fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TargetError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes `message` with one `write_all` and flushes.
pub(crate) fn append(file: &File, message: &[u8]) -> io::Result<()> {
    let mut writer = file;
    writer.write_all(message)?;
    writer.flush()
}

/// Appends to `file` and runs the cache-drop policy on success.
pub(crate) fn append_counted(
    file: &File,
    counter: &ByteCounter,
    message: &[u8],
    drop_cache_chunk: u64,
) -> io::Result<()> {
    append(file, message)?;
    if counter.record(message.len() as u64, drop_cache_chunk).is_some() {
        // Advisory only.
        let _ = platform::drop_cache(file);
    }
    Ok(())
}

/// The handle behind a non-rotating target.
#[derive(Debug)]
enum FixedSink {
    File {
        path: PathBuf,
        file: File,
        counter: ByteCounter,
    },
    Pipe(PipeSink),
}

/// A plain-file or pipe target. Its handle lives as long as the entry.
#[derive(Debug)]
pub struct FixedTarget {
    name: String,
    sink: FixedSink,
}

impl FixedTarget {
    pub fn open_file(name: &str, path: &Path) -> Result<Self> {
        let file = open_append(path)?;
        Ok(Self {
            name: name.to_string(),
            sink: FixedSink::File {
                path: path.to_path_buf(),
                file,
                counter: ByteCounter::new(),
            },
        })
    }

    pub fn spawn_pipe(name: &str, command: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            sink: FixedSink::Pipe(PipeSink::spawn(command)?),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TargetKind {
        match self.sink {
            FixedSink::File { .. } => TargetKind::File,
            FixedSink::Pipe(_) => TargetKind::Pipe,
        }
    }

    /// The file path, for file targets.
    pub fn path(&self) -> Option<&Path> {
        match &self.sink {
            FixedSink::File { path, .. } => Some(path),
            FixedSink::Pipe(_) => None,
        }
    }

    /// Byte counters; pipes have none.
    pub fn counters(&self) -> Option<ByteCounts> {
        match &self.sink {
            FixedSink::File { counter, .. } => Some(counter.counts()),
            FixedSink::Pipe(_) => None,
        }
    }

    pub fn write(&self, message: &[u8], drop_cache_chunk: u64) -> Result<()> {
        let written = match &self.sink {
            FixedSink::File { file, counter, .. } => {
                append_counted(file, counter, message, drop_cache_chunk)
            }
            FixedSink::Pipe(pipe) => pipe.append(message),
        };
        written.map_err(|source| TargetError::Write {
            target: self.name.clone(),
            source,
        })
    }
}
