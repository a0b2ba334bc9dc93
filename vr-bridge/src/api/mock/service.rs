use super::device::{MockVRDevice, MockVRDevicePtr};
use std::sync::mpsc::Receiver;
use std::sync::MutexGuard;
use std::thread;
use vr_bridge_api::{MockVRControlMsg, VREvent, VRError, VRFrameData, VRResult, VRService, VRSessionState};

pub struct MockVRService {
    device: MockVRDevicePtr,
    initialized: bool,
}

impl VRService for MockVRService {
    fn initialize(&mut self) -> VRResult<()> {
        self.initialized = true;
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn sync(&mut self) -> VRResult<VRFrameData> {
        if !self.initialized {
            return Err(VRError::NotInitialized);
        }
        let mut device = self.device();
        if device.session_state().is_terminal() {
            return Err(VRError::Exited);
        }
        Ok(device.sample())
    }

    fn poll_events(&mut self) -> Vec<VREvent> {
        self.device().take_events()
    }

    fn session_state(&self) -> VRSessionState {
        self.device().session_state()
    }

    fn shutdown(&mut self) {
        self.initialized = false;
    }
}

impl MockVRService {
    pub fn new() -> MockVRService {
        MockVRService {
            device: MockVRDevice::new(),
            initialized: false,
        }
    }

    pub fn new_with_receiver(rcv: Receiver<MockVRControlMsg>) -> MockVRService {
        let device = MockVRDevice::new();
        let state = device.clone();
        thread::spawn(move || {
            while let Ok(msg) = rcv.recv() {
                lock(&state).handle_msg(msg);
            }
        });
        MockVRService {
            device,
            initialized: false,
        }
    }

    fn device(&self) -> MutexGuard<MockVRDevice> {
        lock(&self.device)
    }
}

// A panic while holding the lock only poisons scripted test state.
fn lock(device: &MockVRDevicePtr) -> MutexGuard<MockVRDevice> {
    device.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
