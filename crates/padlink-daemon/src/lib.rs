//! Core relay daemon for padlink.
//!
//! Implements the session registry, the per-connection message loop, and
//! the emulator process lifecycle state machine. Connections arrive over
//! the WebSocket transport; input frames are translated and handed to the
//! injected [`padlink_input::InputSink`].

pub mod config;
pub mod daemon;
pub mod error;
pub mod process;
pub mod registry;
pub mod session;
pub mod setup;
pub mod state;

pub use config::Config;
pub use daemon::{Daemon, Relay};
pub use error::DaemonError;
pub use process::{ProcessController, ProcessError, ProcessState, StartOutcome, StopOutcome};
pub use registry::{RegistryFull, SessionRegistry};
