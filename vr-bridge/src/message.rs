//! The datagram relayed to teleoperation consumers.
//!
//! One JSON object per tick. `left`/`right` each carry `pose` (row-major
//! 4x4 transform), `button_pressed` (grip) and `trigger`; consumers rely on
//! those keys. The remaining fields are extra inputs.

use vr_bridge_api::{utils, VRControllerState, VRError, VRFrameData, VRResult};

/// Reference frame the relayed poses are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameConversion {
    /// OpenXR stage space: +Y up, -Z forward, meters.
    Stage,
    /// Robot convention: +X forward, +Y left, +Z up.
    ZUp,
}

impl Default for FrameConversion {
    fn default() -> FrameConversion {
        FrameConversion::Stage
    }
}

// Change of basis from stage axes to (forward, left, up), column-major.
const STAGE_TO_Z_UP: [f32; 16] = [
    0.0, -1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    -1.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

impl FrameConversion {
    /// Re-expresses a stage-space transform in this frame.
    pub fn apply(&self, transform: &[f32; 16]) -> [f32; 16] {
        match *self {
            FrameConversion::Stage => *transform,
            FrameConversion::ZUp => {
                let mut out = [0f32; 16];
                utils::multiply_matrix(&STAGE_TO_Z_UP, transform, &mut out);
                out
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerMessage {
    pub pose: [[f32; 4]; 4],
    // Grip button
    pub button_pressed: bool,
    pub trigger: f32,
    pub menu_button: bool,
    pub trackpad: [f32; 2],
    pub trackpad_button: bool,
    pub connected: bool,
}

impl ControllerMessage {
    pub fn from_state(state: &VRControllerState, conversion: FrameConversion) -> ControllerMessage {
        let transform = conversion.apply(&state.pose.to_matrix());
        ControllerMessage {
            pose: utils::matrix_rows(&transform),
            button_pressed: state.grip_button,
            trigger: state.trigger,
            menu_button: state.menu_button,
            trackpad: [state.trackpad_x, state.trackpad_y],
            trackpad_button: state.trackpad_button,
            connected: state.connected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMessage {
    pub left: ControllerMessage,
    pub right: ControllerMessage,
    pub timestamp: f64,
}

impl BridgeMessage {
    pub fn from_frame(frame: &VRFrameData, conversion: FrameConversion) -> BridgeMessage {
        BridgeMessage {
            left: ControllerMessage::from_state(&frame.left, conversion),
            right: ControllerMessage::from_state(&frame.right, conversion),
            timestamp: frame.timestamp,
        }
    }

    pub fn to_bytes(&self) -> VRResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| VRError::Serialize(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> VRResult<BridgeMessage> {
        serde_json::from_slice(bytes).map_err(|e| VRError::Serialize(e.to_string()))
    }
}
