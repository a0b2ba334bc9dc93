use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use vr_bridge_api::{utils, MockVRControlMsg, VRControllerHand, VREvent, VRFrameData, VRPose, VRSessionState};

pub type MockVRDevicePtr = Arc<Mutex<MockVRDevice>>;

// Simulates a headset and two Vive controllers sitting in front of it
pub struct MockVRDevice {
    frame: VRFrameData,
    session_state: VRSessionState,
    events: Vec<VREvent>,
    vsync: Duration,
}

impl MockVRDevice {
    pub fn new() -> MockVRDevicePtr {
        let mut frame = VRFrameData::default();
        frame.hmd = VRPose::new([0.0, 1.6, 0.0], utils::IDENTITY_QUAT);
        frame.left.pose = VRPose::new([-0.2, 1.0, -0.3], utils::IDENTITY_QUAT);
        frame.right.pose = VRPose::new([0.2, 1.0, -0.3], utils::IDENTITY_QUAT);
        frame.left.connected = true;
        frame.right.connected = true;

        Arc::new(Mutex::new(MockVRDevice {
            frame,
            session_state: VRSessionState::Focused,
            events: vec![
                VREvent::SessionStateChanged(VRSessionState::Focused),
                VREvent::ControllerConnected(VRControllerHand::Left),
                VREvent::ControllerConnected(VRControllerHand::Right),
            ],
            vsync: Duration::from_millis(1),
        }))
    }

    pub fn session_state(&self) -> VRSessionState {
        self.session_state
    }

    pub fn sample(&mut self) -> VRFrameData {
        // Simulate Vsync
        thread::sleep(self.vsync);

        let now = utils::timestamp();
        self.frame.timestamp = now;
        self.frame.left.timestamp = now;
        self.frame.right.timestamp = now;
        self.frame.clone()
    }

    pub fn take_events(&mut self) -> Vec<VREvent> {
        std::mem::take(&mut self.events)
    }

    pub fn handle_msg(&mut self, msg: MockVRControlMsg) {
        match msg {
            MockVRControlMsg::SetControllerPose(hand, position, orientation) => {
                self.frame.controller_mut(hand).pose = VRPose::new(position, orientation);
            }
            MockVRControlMsg::SetButtons(hand, buttons) => {
                let state = self.frame.controller_mut(hand);
                state.menu_button = buttons.menu_button;
                state.trackpad_x = buttons.trackpad[0];
                state.trackpad_y = buttons.trackpad[1];
                state.trackpad_button = buttons.trackpad_button;
                state.trigger = buttons.trigger.max(0.0).min(1.0);
                state.grip_button = buttons.grip_button;
            }
            MockVRControlMsg::SetHmdPose(position, orientation) => {
                self.frame.hmd = VRPose::new(position, orientation);
            }
            MockVRControlMsg::SetConnected(hand, connected) => {
                let state = self.frame.controller_mut(hand);
                if state.connected != connected {
                    state.connected = connected;
                    self.events.push(if connected {
                        VREvent::ControllerConnected(hand)
                    } else {
                        VREvent::ControllerDisconnected(hand)
                    });
                }
            }
            MockVRControlMsg::SetSessionState(state) => {
                if self.session_state != state {
                    self.session_state = state;
                    self.events.push(VREvent::SessionStateChanged(state));
                }
            }
        }
    }
}
