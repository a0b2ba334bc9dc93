use crate::{VREvent, VRFrameData, VRResult, VRSessionState};

/// A source of headset and controller data, one per runtime backend.
pub trait VRService: Send {
    /// Connects to the runtime. Calling it again after success is a no-op;
    /// calling it after a failure retries from scratch.
    fn initialize(&mut self) -> VRResult<()>;

    fn is_available(&self) -> bool;

    /// Pumps runtime events and samples the headset and both controllers.
    /// Blocks until the runtime's next frame when a session is running.
    fn sync(&mut self) -> VRResult<VRFrameData>;

    /// Returns and clears the events gathered since the last call.
    fn poll_events(&mut self) -> Vec<VREvent>;

    fn session_state(&self) -> VRSessionState;

    /// Releases every runtime handle. Safe to call more than once.
    fn shutdown(&mut self);
}

pub trait VRServiceCreator {
    fn new_service(&self) -> Box<dyn VRService>;
}
