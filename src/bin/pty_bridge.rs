//! PTY bridge binary
//!
//! Spawns the command given on the command line inside a fresh PTY and
//! relays bytes between the PTY master and this process's stdin/stdout.
//! Resize directives (`<rows>x<columns>` lines) arrive on inherited
//! descriptor 3, which the hosting process must keep open.

use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};
use std::process::ExitCode;

use nix::fcntl::{fcntl, FcntlArg};

use pty_bridge::{Error, Relay, Result, Session};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Inherited descriptor carrying resize directives, by convention with the
/// hosting process
const CONTROL_FD: RawFd = 3;

fn main() -> ExitCode {
    // Logs go to stderr; stdout is the data plane
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.is_empty() {
        eprintln!("usage: pty-bridge <command> [args...]");
        return ExitCode::from(2);
    }

    match run(&argv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(argv: &[String]) -> Result<()> {
    // Fail up front if the host did not pass the control channel, rather
    // than mid-loop with a confusing poll error.
    fcntl(CONTROL_FD, FcntlArg::F_GETFD).map_err(|e| {
        Error::ControlChannel(format!("descriptor {CONTROL_FD} is not open: {e}"))
    })?;

    let mut session = Session::spawn(argv)?;
    tracing::debug!("spawned {} as pid {}", argv[0], session.pid());

    // SAFETY: the standard descriptors and the inherited control descriptor
    // are open for the lifetime of the process and owned by no other handle.
    let input = unsafe { OwnedFd::from_raw_fd(libc::STDIN_FILENO) };
    let output = unsafe { OwnedFd::from_raw_fd(libc::STDOUT_FILENO) };
    let control = unsafe { OwnedFd::from_raw_fd(CONTROL_FD) };

    let mut relay = Relay::new(input, output, control);
    let run_result = relay.run(session.pty_mut());

    // Reap exactly once, no matter how the loop ended
    let status = session.reap()?;
    tracing::debug!("child reaped: {status:?}");

    let reason = run_result?;
    tracing::debug!("relay stopped: {reason:?}");
    Ok(())
}
