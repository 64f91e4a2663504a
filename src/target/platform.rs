//! OS page-cache advisory. A no-op where the platform has no `posix_fadvise`.

use std::{fs::File, io};

/// Advises the kernel that the cached pages of `file` are no longer needed.
///
/// The whole file is covered: an append-mode handle adds its bytes at the end, after
/// whatever the file held when it was opened.
#[cfg(target_os = "linux")]
pub fn drop_cache(file: &File) -> io::Result<()> {
    use nix::fcntl::{posix_fadvise, PosixFadviseAdvice};
    use std::os::unix::io::AsRawFd;

    // A zero length extends the range to the end of the file.
    posix_fadvise(
        file.as_raw_fd(),
        0,
        0,
        PosixFadviseAdvice::POSIX_FADV_DONTNEED,
    )?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn drop_cache(_file: &File) -> io::Result<()> {
    Ok(())
}
