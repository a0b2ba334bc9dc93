mod device;
mod service;

use std::sync::mpsc::{channel, Sender};
use vr_bridge_api::{MockVRControlMsg, VRService, VRServiceCreator};

pub struct MockServiceCreator;

impl MockServiceCreator {
    pub fn new() -> Box<dyn VRServiceCreator> {
        Box::new(MockServiceCreator)
    }

    pub fn new_service_with_remote() -> (Box<dyn VRService>, Sender<MockVRControlMsg>) {
        let (send, rcv) = channel();
        let service = service::MockVRService::new_with_receiver(rcv);
        (Box::new(service), send)
    }
}

impl VRServiceCreator for MockServiceCreator {
    fn new_service(&self) -> Box<dyn VRService> {
        Box::new(service::MockVRService::new())
    }
}
