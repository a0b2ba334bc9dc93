use crate::{VRControllerHand, VRSessionState};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MockButtons {
    pub menu_button: bool,
    pub trackpad: [f32; 2],
    pub trackpad_button: bool,
    pub trigger: f32,
    pub grip_button: bool,
}

pub enum MockVRControlMsg {
    SetControllerPose(VRControllerHand, [f32; 3], [f32; 4]),
    SetButtons(VRControllerHand, MockButtons),
    SetHmdPose([f32; 3], [f32; 4]),
    SetConnected(VRControllerHand, bool),
    SetSessionState(VRSessionState),
}
