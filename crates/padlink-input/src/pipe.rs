//! Dolphin pipe-input backend (Linux).
//!
//! Dolphin reads controller input from named pipes (`Pipes/ctrl1` ...
//! under its user directory) as a line protocol: `PRESS A`, `RELEASE
//! D_UP`, `SET MAIN 0.5 0.5`. Each connected client gets its own pipe,
//! i.e. its own player slot; slots are assigned first-free and released
//! when the session ends.
//!
//! Axis unit conversion happens here: the wire carries signed normalised
//! values in `-1.0..=1.0`, the pipe protocol wants `0.0..=1.0`.

use std::path::PathBuf;

use async_trait::async_trait;
use padlink_types::{ClientId, InputValue, TargetFrame};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::SinkError;
use crate::InputSink;

/// Pipe token for a button in the target vocabulary.
fn button_token(name: &str) -> Option<&'static str> {
    let token = match name {
        "a" => "A",
        "b" => "B",
        "x" => "X",
        "y" => "Y",
        "z" => "Z",
        "start" => "START",
        "l" => "L",
        "r" => "R",
        "zl" => "ZL",
        "zr" => "ZR",
        "dpad_up" => "D_UP",
        "dpad_down" => "D_DOWN",
        "dpad_left" => "D_LEFT",
        "dpad_right" => "D_RIGHT",
        _ => return None,
    };
    Some(token)
}

/// Rescale a signed normalised axis value to the pipe's `0.0..=1.0` range.
fn scale_axis(value: f64) -> f64 {
    ((value + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Per-slot stick state. Sticks are written as whole `SET` lines, so the
/// last seen value of the other axis has to be remembered.
struct Slot {
    client: ClientId,
    file: File,
    main: (f64, f64),
    c: (f64, f64),
}

impl Slot {
    /// Render the pipe lines for one frame, updating stick state.
    fn render(&mut self, frame: &TargetFrame) -> String {
        let mut out = String::new();
        for (name, value) in frame {
            match (name.as_str(), value) {
                (name, InputValue::Button(pressed)) => {
                    if let Some(token) = button_token(name) {
                        let verb = if *pressed { "PRESS" } else { "RELEASE" };
                        out.push_str(&format!("{verb} {token}\n"));
                    } else {
                        debug!(name, "no pipe token for button");
                    }
                }
                ("left_x", InputValue::Axis(v)) => {
                    self.main.0 = scale_axis(*v);
                    out.push_str(&format!("SET MAIN {:.4} {:.4}\n", self.main.0, self.main.1));
                }
                ("left_y", InputValue::Axis(v)) => {
                    self.main.1 = scale_axis(*v);
                    out.push_str(&format!("SET MAIN {:.4} {:.4}\n", self.main.0, self.main.1));
                }
                ("right_x", InputValue::Axis(v)) => {
                    self.c.0 = scale_axis(*v);
                    out.push_str(&format!("SET C {:.4} {:.4}\n", self.c.0, self.c.1));
                }
                ("right_y", InputValue::Axis(v)) => {
                    self.c.1 = scale_axis(*v);
                    out.push_str(&format!("SET C {:.4} {:.4}\n", self.c.0, self.c.1));
                }
                (name, InputValue::Axis(_)) => {
                    debug!(name, "no pipe mapping for axis");
                }
            }
        }
        out
    }
}

/// Input sink writing Dolphin's pipe-input line protocol.
pub struct PipeSink {
    pipe_dir: PathBuf,
    slots: Mutex<Vec<Option<Slot>>>,
}

impl PipeSink {
    /// Create a sink with `max_slots` pipes under `pipe_dir`.
    ///
    /// Pipe files are named `ctrl1` .. `ctrlN` and are expected to exist
    /// (Dolphin creates them for configured pipe controllers).
    pub fn new(pipe_dir: impl Into<PathBuf>, max_slots: usize) -> Self {
        Self {
            pipe_dir: pipe_dir.into(),
            slots: Mutex::new((0..max_slots).map(|_| None).collect()),
        }
    }

    fn pipe_path(&self, slot: usize) -> PathBuf {
        self.pipe_dir.join(format!("ctrl{}", slot + 1))
    }
}

#[async_trait]
impl InputSink for PipeSink {
    async fn deliver(&self, client: ClientId, frame: &TargetFrame) -> Result<(), SinkError> {
        let mut slots = self.slots.lock().await;

        let index = match slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.client == client))
        {
            Some(index) => index,
            None => {
                let Some(index) = slots.iter().position(Option::is_none) else {
                    return Err(SinkError::SlotsExhausted(slots.len()));
                };
                let path = self.pipe_path(index);
                let file = OpenOptions::new().write(true).open(&path).await?;
                debug!(client = %client, slot = index + 1, path = %path.display(), "assigned controller slot");
                slots[index] = Some(Slot {
                    client,
                    file,
                    main: (0.5, 0.5),
                    c: (0.5, 0.5),
                });
                index
            }
        };

        let slot = slots[index].as_mut().expect("slot assigned above");
        let lines = slot.render(frame);
        if !lines.is_empty() {
            slot.file.write_all(lines.as_bytes()).await?;
            slot.file.flush().await?;
        }
        Ok(())
    }

    async fn release(&self, client: ClientId) -> Result<(), SinkError> {
        let mut slots = self.slots.lock().await;
        if let Some(slot) = slots
            .iter_mut()
            .find(|s| s.as_ref().is_some_and(|s| s.client == client))
        {
            debug!(client = %client, "released controller slot");
            *slot = None;
        } else {
            warn!(client = %client, "release for client without a slot");
        }
        Ok(())
    }
}
