//! Three-way relay loop between PTY master, host input/output, and the
//! resize control channel
//!
//! A single thread blocks in poll(2) across the three readable handles and
//! services whichever are ready, one bounded chunk per stream per iteration.
//! Back-pressure is the OS stream semantics: a blocked write stalls only
//! until that destination drains.

use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsFd, OwnedFd};

use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::control::parse_chunk;
use crate::error::{Error, Result};
use crate::pty::Pty;

/// Bytes moved per stream per iteration
const CHUNK_SIZE: usize = 1024;

/// Why the relay loop stopped.
///
/// All three are clean stops followed by reaping the child; they differ only
/// in which side ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The PTY master reached end-of-stream (child's terminal closed)
    ChildEof,
    /// An OS-level error on the PTY master (PTY gone)
    ChildError,
    /// The host closed the external input stream
    HostEof,
}

/// Relay between a PTY master and three host-side streams.
///
/// The control channel is an explicit handle rather than a hardcoded
/// descriptor number; the caller decides where it comes from.
pub struct Relay {
    /// Host -> PTY byte stream
    input: File,
    /// PTY -> host byte stream
    output: File,
    /// Resize directives, one `<rows>x<columns>` line each
    control: File,
}

impl Relay {
    /// Create a relay over the given host-side handles
    pub fn new(input: OwnedFd, output: OwnedFd, control: OwnedFd) -> Self {
        Self {
            input: File::from(input),
            output: File::from(output),
            control: File::from(control),
        }
    }

    /// Run the relay loop until a stream-fatal condition stops it.
    ///
    /// Blocks in poll(2) with no timeout; the only way out is one of the
    /// [`StopReason`] conditions or a process-fatal host I/O error. Control
    /// channel anomalies (zero-byte reads, malformed or undecodable
    /// directives, failed resizes) never stop the loop.
    pub fn run(&mut self, pty: &mut Pty) -> Result<StopReason> {
        let mut buf = [0u8; CHUNK_SIZE];

        loop {
            let (pty_ready, input_ready, control_ready) = {
                let mut fds = [
                    PollFd::new(pty.as_fd(), PollFlags::POLLIN),
                    PollFd::new(self.input.as_fd(), PollFlags::POLLIN),
                    PollFd::new(self.control.as_fd(), PollFlags::POLLIN),
                ];
                poll(&mut fds, PollTimeout::NONE).map_err(Error::Poll)?;
                (readable(&fds[0]), readable(&fds[1]), readable(&fds[2]))
            };

            if pty_ready {
                // PTY -> output
                let n = match pty.read(&mut buf) {
                    Ok(0) => return Ok(StopReason::ChildEof),
                    Err(e) => {
                        tracing::debug!("PTY master read failed: {e}");
                        return Ok(StopReason::ChildError);
                    }
                    Ok(n) => n,
                };
                self.output.write_all(&buf[..n])?;
            }

            if input_ready {
                // input -> PTY
                let n = match self.input.read(&mut buf) {
                    Ok(0) => return Ok(StopReason::HostEof),
                    Err(e) => return Err(Error::Io(e)),
                    Ok(n) => n,
                };
                if let Err(e) = pty.write_all(&buf[..n]) {
                    tracing::debug!("PTY master write failed: {e}");
                    return Ok(StopReason::ChildError);
                }
            }

            if control_ready {
                // Zero bytes here means the channel is idle or its writer is
                // gone; neither ends the session.
                match self.control.read(&mut buf) {
                    Ok(0) => {}
                    Err(e) => {
                        tracing::debug!("control channel read failed: {e}");
                    }
                    Ok(n) => {
                        for size in parse_chunk(&buf[..n]) {
                            match pty.set_window_size(size) {
                                Ok(()) => tracing::debug!(
                                    "resized PTY to {}x{}",
                                    size.rows,
                                    size.cols
                                ),
                                Err(e) => tracing::warn!("resize failed: {e}"),
                            }
                        }
                    }
                }
            }
        }
    }
}

/// A descriptor counts as readable on data, hangup, or error; the follow-up
/// read decides which it was.
fn readable(fd: &PollFd) -> bool {
    fd.revents().is_some_and(|r| {
        r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
    })
}
