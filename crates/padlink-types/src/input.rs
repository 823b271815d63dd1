//! Controller input value and frame types.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// A single controller input value.
///
/// Buttons carry a pressed/released boolean; analog axes carry a signed
/// normalised float in `-1.0..=1.0`. Untagged on the wire: `true` / `-0.5`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    /// Button state (`true` = pressed).
    Button(bool),
    /// Analog axis position.
    Axis(f64),
}

impl InputValue {
    /// Whether this value is a pressed button.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        matches!(self, Self::Button(true))
    }
}

/// A raw input frame as received from a client, keyed by the external
/// controller vocabulary (`"A"`, `"ANALOG_LEFT_X"`, ...).
///
/// Ephemeral: built per received message and consumed by the translator.
pub type InputFrame = HashMap<String, InputValue>;

/// A translated input frame keyed by the target vocabulary (`"a"`,
/// `"left_x"`, ...). Ordered so sinks and tests see deterministic
/// iteration.
pub type TargetFrame = BTreeMap<String, InputValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_value_deserialises_from_bool() {
        let v: InputValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, InputValue::Button(true));
        assert!(v.is_pressed());
    }

    #[test]
    fn axis_value_deserialises_from_number() {
        let v: InputValue = serde_json::from_str("-0.75").unwrap();
        assert_eq!(v, InputValue::Axis(-0.75));
        assert!(!v.is_pressed());
    }

    #[test]
    fn frame_deserialises_mixed_values() {
        let frame: InputFrame =
            serde_json::from_str(r#"{"A": true, "ANALOG_LEFT_X": 0.5}"#).unwrap();
        assert_eq!(frame.get("A"), Some(&InputValue::Button(true)));
        assert_eq!(frame.get("ANALOG_LEFT_X"), Some(&InputValue::Axis(0.5)));
    }
}
