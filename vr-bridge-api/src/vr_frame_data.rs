use crate::{VRControllerHand, VRControllerState, VRPose};

// Everything sampled from the runtime during a single bridge tick
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct VRFrameData {
    // Time of the sample in milliseconds since the UNIX epoch.
    pub timestamp: f64,

    // Headset pose (VIEW space located in STAGE space).
    pub hmd: VRPose,

    pub left: VRControllerState,

    pub right: VRControllerState,
}

impl Default for VRFrameData {
    fn default() -> VRFrameData {
        VRFrameData {
            timestamp: 0f64,
            hmd: VRPose::default(),
            left: VRControllerState::new(VRControllerHand::Left),
            right: VRControllerState::new(VRControllerHand::Right),
        }
    }
}

impl VRFrameData {
    pub fn controller(&self, hand: VRControllerHand) -> &VRControllerState {
        match hand {
            VRControllerHand::Left => &self.left,
            VRControllerHand::Right => &self.right,
        }
    }

    pub fn controller_mut(&mut self, hand: VRControllerHand) -> &mut VRControllerState {
        match hand {
            VRControllerHand::Left => &mut self.left,
            VRControllerHand::Right => &mut self.right,
        }
    }
}
