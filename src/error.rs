//! Error types for PTY and relay operations

use std::io;

use thiserror::Error;

/// Bridge error type
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on a host-side stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to open PTY master
    #[error("Failed to open PTY master: {0}")]
    OpenMaster(#[source] nix::Error),

    /// Failed to grant PTY slave access
    #[error("Failed to grant PTY access: {0}")]
    GrantPty(#[source] nix::Error),

    /// Failed to unlock PTY slave
    #[error("Failed to unlock PTY: {0}")]
    UnlockPty(#[source] nix::Error),

    /// Failed to resolve PTY slave name
    #[error("Failed to get PTY slave name: {0}")]
    PtsName(#[source] nix::Error),

    /// Failed to fork
    #[error("Failed to fork: {0}")]
    Fork(#[source] nix::Error),

    /// Failed to set window size
    #[error("Failed to set window size: {0}")]
    SetWinsize(#[source] nix::Error),

    /// Failed to get window size
    #[error("Failed to get window size: {0}")]
    GetWinsize(#[source] nix::Error),

    /// Failed to poll the watched descriptors
    #[error("Failed to poll: {0}")]
    Poll(#[source] nix::Error),

    /// Failed to wait for the child process
    #[error("Failed to wait for child: {0}")]
    Wait(#[source] nix::Error),

    /// Command argument vector was empty or malformed
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Control channel descriptor was not inherited from the host
    #[error("Control channel unavailable: {0}")]
    ControlChannel(String),
}

/// Result type for PTY and relay operations
pub type Result<T> = std::result::Result<T, Error>;
