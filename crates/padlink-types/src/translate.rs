//! Source-to-target input vocabulary translation.
//!
//! Clients speak the external controller vocabulary (`"A"`,
//! `"DPAD_UP"`, `"ANALOG_LEFT_X"`); sinks speak the target vocabulary
//! (`"a"`, `"dpad_up"`, `"left_x"`). The table is fixed at compile time.

use crate::input::{InputFrame, TargetFrame};

/// Resolve a source key to its target-vocabulary name.
///
/// Returns `None` for keys outside the table; such keys are dropped by
/// [`translate`] rather than treated as errors.
#[must_use]
pub fn target_name(source: &str) -> Option<&'static str> {
    let name = match source {
        "A" => "a",
        "B" => "b",
        "X" => "x",
        "Y" => "y",
        "Z" => "z",
        "START" => "start",
        "DPAD_UP" => "dpad_up",
        "DPAD_DOWN" => "dpad_down",
        "DPAD_LEFT" => "dpad_left",
        "DPAD_RIGHT" => "dpad_right",
        "L" => "l",
        "R" => "r",
        "ZL" => "zl",
        "ZR" => "zr",
        "ANALOG_LEFT_X" => "left_x",
        "ANALOG_LEFT_Y" => "left_y",
        "ANALOG_RIGHT_X" => "right_x",
        "ANALOG_RIGHT_Y" => "right_y",
        _ => return None,
    };
    Some(name)
}

/// Translate a raw client frame into the target vocabulary.
///
/// Values pass through unchanged — axis scaling is device-specific and
/// belongs to the sink. Unknown keys are silently dropped.
#[must_use]
pub fn translate(raw: &InputFrame) -> TargetFrame {
    raw.iter()
        .filter_map(|(key, value)| target_name(key).map(|name| (name.to_string(), *value)))
        .collect()
}
