use std::io;
use thiserror::Error;

pub type VRResult<T> = Result<T, VRError>;

#[derive(Debug, Error)]
pub enum VRError {
    /// The runtime, its loader or a required extension is missing.
    #[error("VR runtime unavailable: {0}")]
    Unavailable(String),

    /// A runtime call failed.
    #[error("VR runtime call failed: {0}")]
    Runtime(String),

    /// The runtime is up but does not see a headset.
    #[error("no head mounted display detected by the runtime")]
    NoSystem,

    /// No controller reported an active pose before the warm-up window ran out.
    #[error("controllers not detected yet, check that they are on and visible to the base stations")]
    ControllersNotDetected,

    #[error("service used before initialization")]
    NotInitialized,

    /// The runtime ended the session.
    #[error("VR session exited")]
    Exited,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(String),
}

impl VRError {
    /// Errors that typically go away once the runtime finishes detecting hardware.
    pub fn is_retryable(&self) -> bool {
        match *self {
            VRError::Unavailable(_) | VRError::NoSystem | VRError::ControllersNotDetected => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_errors_are_retryable() {
        assert!(VRError::NoSystem.is_retryable());
        assert!(VRError::ControllersNotDetected.is_retryable());
        assert!(VRError::Unavailable("loader".into()).is_retryable());
        assert!(!VRError::Exited.is_retryable());
        assert!(!VRError::Runtime("boom".into()).is_retryable());
    }
}
