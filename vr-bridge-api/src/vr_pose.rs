use crate::utils;

// The VRPose struct represents a tracked device's state at a given time,
// expressed in the stage (play area) reference space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct VRPose {
    // Position of the device in meters.
    // None until the runtime has reported a valid position.
    pub position: Option<[f32; 3]>,

    // Orientation of the device as a scalar-last quaternion `[x, y, z, w]`.
    // None until the runtime has reported a valid position.
    pub orientation: Option<[f32; 4]>,
}

impl VRPose {
    pub fn new(position: [f32; 3], orientation: [f32; 4]) -> VRPose {
        VRPose {
            position: Some(position),
            orientation: Some(orientation),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.position.is_some() && self.orientation.is_some()
    }

    /// The pose as `[x, y, z, qw, qx, qy, qz]`.
    ///
    /// The quaternion is reordered to scalar-first here, unlike `orientation`.
    pub fn to_array(&self) -> [f32; 7] {
        let [x, y, z] = self.position.unwrap_or([0.0; 3]);
        let [qx, qy, qz, qw] = self.orientation.unwrap_or(utils::IDENTITY_QUAT);
        [x, y, z, qw, qx, qy, qz]
    }

    /// Column-major homogeneous transform from device space to stage space.
    pub fn to_matrix(&self) -> [f32; 16] {
        utils::pose_matrix(
            &self.position.unwrap_or([0.0; 3]),
            &self.orientation.unwrap_or(utils::IDENTITY_QUAT),
        )
    }
}
