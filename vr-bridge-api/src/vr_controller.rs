use crate::VRPose;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde-serialization", serde(rename_all = "lowercase"))]
pub enum VRControllerHand {
    Left,
    Right,
}

impl VRControllerHand {
    pub const ALL: [VRControllerHand; 2] = [VRControllerHand::Left, VRControllerHand::Right];

    /// Lower-case name, used for action names and message keys.
    pub fn name(&self) -> &'static str {
        match *self {
            VRControllerHand::Left => "left",
            VRControllerHand::Right => "right",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match *self {
            VRControllerHand::Left => "Left",
            VRControllerHand::Right => "Right",
        }
    }

    /// Top level user path of the hand, e.g. `/user/hand/left`.
    pub fn user_path(&self) -> &'static str {
        match *self {
            VRControllerHand::Left => "/user/hand/left",
            VRControllerHand::Right => "/user/hand/right",
        }
    }

    /// Input source path on this hand, e.g. `/user/hand/left/input/trigger/value`.
    pub fn input_path(&self, component: &str) -> String {
        format!("{}/input/{}", self.user_path(), component)
    }
}

impl fmt::Display for VRControllerHand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sampled state of a Vive controller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct VRControllerState {
    pub hand: VRControllerHand,
    pub connected: bool,
    pub timestamp: f64,
    pub pose: VRPose,
    pub menu_button: bool,
    pub trackpad_x: f32,
    pub trackpad_y: f32,
    pub trackpad_button: bool,
    /// Analog trigger travel in `[0, 1]`.
    pub trigger: f32,
    pub grip_button: bool,
}

impl VRControllerState {
    pub fn new(hand: VRControllerHand) -> VRControllerState {
        VRControllerState {
            hand,
            connected: false,
            timestamp: 0.0,
            pose: VRPose::default(),
            menu_button: false,
            trackpad_x: 0.0,
            trackpad_y: 0.0,
            trackpad_button: false,
            trigger: 0.0,
            grip_button: false,
        }
    }

    /// True when a button flipped or the trigger moved more than `trigger_threshold`.
    pub fn input_changed(&self, previous: &VRControllerState, trigger_threshold: f32) -> bool {
        self.connected != previous.connected
            || self.grip_button != previous.grip_button
            || self.menu_button != previous.menu_button
            || self.trackpad_button != previous.trackpad_button
            || (self.trigger - previous.trigger).abs() > trigger_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_hand() {
        assert_eq!(VRControllerHand::Left.user_path(), "/user/hand/left");
        assert_eq!(
            VRControllerHand::Right.input_path("squeeze/click"),
            "/user/hand/right/input/squeeze/click"
        );
        assert_eq!(VRControllerHand::Right.to_string(), "right");
    }

    #[test]
    fn trigger_changes_below_threshold_are_ignored() {
        let previous = VRControllerState::new(VRControllerHand::Left);
        let mut current = previous.clone();
        current.trigger = 0.005;
        assert!(!current.input_changed(&previous, 0.01));
        current.trigger = 0.5;
        assert!(current.input_changed(&previous, 0.01));
    }

    #[test]
    fn button_flips_are_changes() {
        let previous = VRControllerState::new(VRControllerHand::Right);
        let mut current = previous.clone();
        current.grip_button = true;
        assert!(current.input_changed(&previous, 1.0));
    }
}
