//! PTY (pseudoterminal) master management
//!
//! Handles creation of the PTY master/slave pair and window-size ioctls.
//!
//! Reference: https://www.man7.org/linux/man-pages/man3/posix_openpt.3.html

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, RawFd};

use nix::fcntl::OFlag;
use nix::pty::{grantpt, posix_openpt, ptsname, unlockpt, PtyMaster};

use crate::error::{Error, Result};
use crate::size::WindowSize;

/// A pseudoterminal master
pub struct Pty {
    /// The PTY master file descriptor
    master: PtyMaster,
    /// File wrapper for I/O
    file: File,
    /// Path to the slave PTY
    slave_path: String,
}

impl Pty {
    /// Create a new PTY
    pub fn new() -> Result<Self> {
        let master =
            posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).map_err(Error::OpenMaster)?;
        grantpt(&master).map_err(Error::GrantPty)?;
        unlockpt(&master).map_err(Error::UnlockPty)?;

        // SAFETY: ptsname is not thread-safe, but it is called here before
        // any other thread exists.
        let slave_path = unsafe { ptsname(&master) }.map_err(Error::PtsName)?;

        let fd = master.as_raw_fd();
        // SAFETY: fd is a valid descriptor owned by `master`; the dup gives
        // the File its own descriptor with an independent lifetime.
        let file = unsafe { File::from_raw_fd(libc::dup(fd)) };

        Ok(Self {
            master,
            file,
            slave_path,
        })
    }

    /// Path to the slave side of this PTY
    pub fn slave_path(&self) -> &str {
        &self.slave_path
    }

    /// Raw file descriptor of the PTY master
    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// Set the window size on the PTY master
    pub fn set_window_size(&self, size: WindowSize) -> Result<()> {
        let ws = size.to_winsize();
        let fd = self.master.as_raw_fd();
        // SAFETY: TIOCSWINSZ is a valid ioctl for setting window size
        let result = unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, &ws) };
        if result < 0 {
            Err(Error::SetWinsize(nix::errno::Errno::last()))
        } else {
            Ok(())
        }
    }

    /// Get the window size from the PTY master
    pub fn get_window_size(&self) -> Result<WindowSize> {
        // SAFETY: winsize is plain-old-data, zeroed is a valid value
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let fd = self.master.as_raw_fd();
        // SAFETY: TIOCGWINSZ is a valid ioctl for querying window size
        let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) };
        if result < 0 {
            Err(Error::GetWinsize(nix::errno::Errno::last()))
        } else {
            Ok(WindowSize::from(ws))
        }
    }

    /// Read from the PTY master (blocking)
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    /// Write all bytes to the PTY master
    pub fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.file.write_all(buf)
    }
}

impl AsRawFd for Pty {
    fn as_raw_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }
}

impl AsFd for Pty {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.master.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pty_creation() {
        let pty = Pty::new();
        assert!(pty.is_ok());
        let pty = pty.unwrap();
        assert!(!pty.slave_path().is_empty());
        #[cfg(target_os = "linux")]
        assert!(pty.slave_path().starts_with("/dev/pts/"));
    }

    #[test]
    fn test_pty_window_size_roundtrip() {
        let pty = Pty::new().unwrap();
        pty.set_window_size(WindowSize::new(120, 40)).unwrap();
        let retrieved = pty.get_window_size().unwrap();
        assert_eq!(retrieved.cols, 120);
        assert_eq!(retrieved.rows, 40);
        assert_eq!(retrieved.pixel_width, 0);
        assert_eq!(retrieved.pixel_height, 0);
    }

    #[test]
    fn test_pty_window_size_idempotent() {
        let pty = Pty::new().unwrap();
        pty.set_window_size(WindowSize::new(100, 30)).unwrap();
        pty.set_window_size(WindowSize::new(100, 30)).unwrap();
        let retrieved = pty.get_window_size().unwrap();
        assert_eq!(retrieved.cols, 100);
        assert_eq!(retrieved.rows, 30);
    }
}
