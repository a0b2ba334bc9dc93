use crate::VRControllerHand;
use std::fmt;

/// Lifecycle of a runtime session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub enum VRSessionState {
    Unknown,
    Idle,
    // The runtime wants the session to begin.
    Ready,
    Synchronized,
    Visible,
    Focused,
    // The runtime wants the session to end.
    Stopping,
    LossPending,
    Exiting,
}

impl VRSessionState {
    /// True for the states in which frames are flowing and inputs can be sampled.
    pub fn is_running(&self) -> bool {
        match *self {
            VRSessionState::Synchronized | VRSessionState::Visible | VRSessionState::Focused => true,
            _ => false,
        }
    }

    /// True once the runtime has asked the application to go away.
    pub fn is_terminal(&self) -> bool {
        match *self {
            VRSessionState::LossPending | VRSessionState::Exiting => true,
            _ => false,
        }
    }
}

impl Default for VRSessionState {
    fn default() -> VRSessionState {
        VRSessionState::Unknown
    }
}

impl fmt::Display for VRSessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub enum VREvent {
    // The session moved to a new lifecycle state.
    SessionStateChanged(VRSessionState),

    // A controller started reporting an active pose.
    ControllerConnected(VRControllerHand),

    // A controller stopped reporting an active pose.
    ControllerDisconnected(VRControllerHand),

    // The runtime is going away, the instance must be destroyed.
    InstanceLossPending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_states() {
        assert!(VRSessionState::Focused.is_running());
        assert!(VRSessionState::Synchronized.is_running());
        assert!(!VRSessionState::Ready.is_running());
        assert!(!VRSessionState::Stopping.is_running());
        assert!(VRSessionState::Exiting.is_terminal());
        assert!(!VRSessionState::Idle.is_terminal());
    }
}
