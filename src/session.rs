//! PTY session management
//!
//! Spawns a child process attached to the slave side of a freshly allocated
//! PTY and owns the master side for the lifetime of the session.

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{dup2, execvp, fork, setsid, ForkResult, Pid};

use crate::error::{Error, Result};
use crate::pty::Pty;

/// A child process attached to a PTY.
///
/// Exactly one child and one master exist per session; the master stays valid
/// until [`Session::reap`] consumes the session.
pub struct Session {
    /// The PTY master
    pty: Pty,
    /// Child process ID
    pid: Pid,
}

impl Session {
    /// Spawn a child process attached to a new PTY.
    ///
    /// `argv[0]` is used both to locate the executable (via PATH lookup) and
    /// as the child's self-reported name; the whole vector is passed to the
    /// child verbatim. If the command cannot be executed, the child exits
    /// with status 127, observable through [`Session::reap`].
    ///
    /// On PTY-allocation or fork failure no child exists and all descriptors
    /// are released before returning.
    pub fn spawn(argv: &[String]) -> Result<Self> {
        let program = argv
            .first()
            .ok_or_else(|| Error::InvalidCommand("empty argument vector".to_string()))?;

        let program_cstr = CString::new(program.as_bytes())
            .map_err(|e| Error::InvalidCommand(e.to_string()))?;
        let mut argv_cstr: Vec<CString> = Vec::with_capacity(argv.len());
        for arg in argv {
            argv_cstr.push(
                CString::new(arg.as_bytes())
                    .map_err(|e| Error::InvalidCommand(e.to_string()))?,
            );
        }

        let pty = Pty::new()?;
        let slave_path = pty.slave_path().to_string();

        // SAFETY: fork is safe as long as the child only calls async-signal-safe
        // functions before exec
        match unsafe { fork() }.map_err(Error::Fork)? {
            ForkResult::Parent { child } => Ok(Self { pty, pid: child }),
            ForkResult::Child => {
                // Create new session so the slave can become the controlling
                // terminal
                if setsid().is_err() {
                    std::process::exit(1);
                }

                // Open slave PTY
                let slave_fd = match open_slave(&slave_path) {
                    Ok(fd) => fd,
                    Err(_) => std::process::exit(1),
                };
                let slave_raw = slave_fd.as_raw_fd();

                // Set as controlling terminal
                // SAFETY: TIOCSCTTY is a valid ioctl on a PTY slave
                unsafe {
                    if libc::ioctl(slave_raw, libc::TIOCSCTTY, 0) < 0 {
                        std::process::exit(1);
                    }
                }

                // Duplicate slave to stdin, stdout, stderr
                if dup2(slave_raw, libc::STDIN_FILENO).is_err() {
                    std::process::exit(1);
                }
                if dup2(slave_raw, libc::STDOUT_FILENO).is_err() {
                    std::process::exit(1);
                }
                if dup2(slave_raw, libc::STDERR_FILENO).is_err() {
                    std::process::exit(1);
                }

                // Close original slave fd if it's not one of the standard fds
                if slave_raw > 2 {
                    drop(slave_fd);
                }

                // Execute the command; environment and terminal modes are
                // left entirely to the child
                let _ = execvp(&program_cstr, &argv_cstr);

                // execvp only returns on error
                std::process::exit(127);
            }
        }
    }

    /// The PTY master owned by this session
    pub fn pty(&self) -> &Pty {
        &self.pty
    }

    /// Mutable access to the PTY master
    pub fn pty_mut(&mut self) -> &mut Pty {
        &mut self.pty
    }

    /// Child process ID
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Tear down the session: close the master and block until the child is
    /// collected.
    ///
    /// Closing the master first means a child that lingers after the host
    /// side is gone loses its terminal and receives a hangup, so the wait
    /// terminates. Call exactly once, after the relay loop has stopped.
    pub fn reap(self) -> Result<WaitStatus> {
        let Session { pty, pid } = self;
        drop(pty);
        waitpid(pid, None).map_err(Error::Wait)
    }
}

/// Open the slave side of a PTY by path
fn open_slave(path: &str) -> io::Result<OwnedFd> {
    let path_cstr =
        CString::new(path).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: path_cstr is a valid NUL-terminated string
    let fd = unsafe { libc::open(path_cstr.as_ptr(), libc::O_RDWR | libc::O_NOCTTY) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: fd was just returned by open and is owned by no one else
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_spawn_echo() {
        let mut session = Session::spawn(&strv(&["/bin/echo", "hello"])).unwrap();

        // Collect output until the terminal closes.
        let mut output = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            match session.pty_mut().read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => output.extend_from_slice(&buf[..n]),
            }
        }

        let text = String::from_utf8_lossy(&output);
        assert!(text.contains("hello"), "unexpected output: {text}");

        let status = session.reap().unwrap();
        assert!(matches!(status, WaitStatus::Exited(_, 0)));
    }

    #[test]
    fn test_spawn_argv0_passthrough() {
        // `sh -c 'echo $0'` reports its argv[0]; position 0 of the vector is
        // both the lookup path and the conventional name.
        let mut session =
            Session::spawn(&strv(&["/bin/sh", "-c", "echo name=$0"])).unwrap();

        let mut output = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            match session.pty_mut().read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => output.extend_from_slice(&buf[..n]),
            }
        }

        let text = String::from_utf8_lossy(&output);
        assert!(text.contains("name=/bin/sh"), "unexpected output: {text}");

        session.reap().unwrap();
    }

    #[test]
    fn test_spawn_missing_program_exits_127() {
        let session = Session::spawn(&strv(&["/nonexistent/program"])).unwrap();
        let status = session.reap().unwrap();
        assert!(
            matches!(status, WaitStatus::Exited(_, 127)),
            "expected exit 127, got {status:?}"
        );
    }

    #[test]
    fn test_spawn_empty_argv_rejected() {
        let result = Session::spawn(&[]);
        assert!(matches!(result, Err(Error::InvalidCommand(_))));
    }

    #[test]
    fn test_reap_after_master_close_unblocks() {
        // cat never exits on its own; dropping the master during reap hangs
        // it up so the wait completes.
        let session = Session::spawn(&strv(&["/bin/cat"])).unwrap();
        let status = session.reap().unwrap();
        assert!(
            matches!(status, WaitStatus::Exited(..) | WaitStatus::Signaled(..)),
            "unexpected status: {status:?}"
        );
    }
}
