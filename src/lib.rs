//! PTY bridge - relay between a spawned command and a hosting process
//!
//! This crate provides the pieces of a minimal terminal-multiplexing bridge:
//!
//! - `session`: PTY allocation plus a child process attached to the slave side
//! - `relay`: the poll-driven loop moving bytes between the PTY master and
//!   the host's input/output streams
//! - `control`: parsing of out-of-band `<rows>x<columns>` resize directives
//!
//! It is not a terminal emulator: no escape sequences are interpreted, bytes
//! pass through verbatim in both directions.
//!
//! Reference: https://www.man7.org/linux/man-pages/man3/posix_openpt.3.html

mod control;
mod error;
mod pty;
mod relay;
mod session;
mod size;

pub use control::parse_chunk;
pub use error::{Error, Result};
pub use pty::Pty;
pub use relay::{Relay, StopReason};
pub use session::Session;
pub use size::WindowSize;
