//! Shared types for padlink.
//!
//! This crate contains all types shared across the padlink workspace:
//! client identity, controller input frames, the wire message vocabulary,
//! and the source-to-target input translation table.

pub mod client;
pub mod input;
pub mod message;
pub mod translate;

pub use client::ClientId;
pub use input::{InputFrame, InputValue, TargetFrame};
pub use message::{ClientMessage, ControlCommand, InputKind, ProcessStatus, ServerMessage};
pub use translate::translate;
