macro_rules! identity_matrix {
    () => ([1.0, 0.0, 0.0, 0.0,  0.0, 1.0, 0.0, 0.0,  0.0, 0.0, 1.0, 0.0,  0.0, 0.0, 0.0, 1.0]);
}

#[cfg(feature = "serde-serialization")]
#[macro_use]
extern crate serde_derive;

pub mod mock;
pub mod utils;

pub mod vr_controller;
pub mod vr_error;
pub mod vr_event;
pub mod vr_frame_data;
pub mod vr_pose;
pub mod vr_service;

pub use mock::{MockButtons, MockVRControlMsg};
pub use vr_controller::{VRControllerHand, VRControllerState};
pub use vr_error::{VRError, VRResult};
pub use vr_event::{VREvent, VRSessionState};
pub use vr_frame_data::VRFrameData;
pub use vr_pose::VRPose;
pub use vr_service::{VRService, VRServiceCreator};
