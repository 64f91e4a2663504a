//! `|command` targets: a shell child fed through its standard input.

use std::{
    io::{self, Write},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::error::{Result, TargetError};

/// A spawned `sh -c <command>` whose stdin receives every message.
///
/// Dropping the sink closes the pipe and waits for the child to exit. The wait is
/// unbounded: a command that keeps running after its stdin closes blocks the drop.
#[derive(Debug)]
pub struct PipeSink {
    command: String,
    stdin: Option<ChildStdin>,
    child: Child,
}

impl PipeSink {
    pub fn spawn(command: &str) -> Result<Self> {
        if command.trim().is_empty() {
            return Err(TargetError::EmptyCommand);
        }

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| TargetError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdin = child.stdin.take();
        Ok(Self {
            command: command.to_string(),
            stdin,
            child,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Writes `message` in full and flushes. Takes `&self`: concurrent callers share the pipe.
    pub fn append(&self, message: &[u8]) -> io::Result<()> {
        let Some(stdin) = self.stdin.as_ref() else {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        };
        let mut writer = stdin;
        writer.write_all(message)?;
        writer.flush()
    }
}

impl Drop for PipeSink {
    fn drop(&mut self) {
        // Closing stdin lets the child see EOF before we reap it.
        drop(self.stdin.take());
        if let Ok(None) = self.child.try_wait() {
            tracing::debug!(
                command = %self.command,
                pid = self.child.id(),
                "waiting for piped command to exit"
            );
        }
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_pipe_delivers_on_close() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");

        let sink = PipeSink::spawn(&format!("cat > {}", out.display())).unwrap();
        sink.append(b"one ").unwrap();
        sink.append(b"two").unwrap();
        drop(sink);

        assert_eq!(std::fs::read_to_string(&out).unwrap(), "one two");
    }

    #[test]
    fn test_drop_reaps_finished_command() {
        let sink = PipeSink::spawn("exit 0").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        drop(sink);
    }

    #[test]
    fn test_empty_command_is_rejected() {
        assert!(matches!(
            PipeSink::spawn("   "),
            Err(TargetError::EmptyCommand)
        ));
    }
}
