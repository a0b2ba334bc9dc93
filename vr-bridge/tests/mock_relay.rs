#![cfg(feature = "mock")]

use serde_json::Value;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use vr_bridge::api::MockServiceCreator;
use vr_bridge::{
    Backend, Bridge, BridgeConfig, BridgeMessage, FrameConversion, MockButtons, MockVRControlMsg, RetryPolicy,
    UdpRelay, VRControllerHand, VRServiceManager,
};

fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

fn consumer_config(consumer: &UdpRelay, frame: FrameConversion) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.backend = Backend::Mock;
    config.local_addr = loopback();
    config.target_addr = consumer.local_addr().unwrap();
    config.frame = frame;
    config
}

// Ticks the bridge until the consumer sees a message matching `done`.
fn relay_until<F>(bridge: &mut Bridge, consumer: &UdpRelay, mut done: F) -> BridgeMessage
where
    F: FnMut(&BridgeMessage) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        assert!(Instant::now() < deadline, "consumer never saw the expected message");
        bridge.tick().unwrap();
        if let Some((message, _)) = consumer.recv(Duration::from_millis(50)).unwrap() {
            if done(&message) {
                return message;
            }
        }
    }
}

#[test]
fn controller_input_reaches_the_consumer() {
    let consumer = UdpRelay::bind(loopback(), loopback()).unwrap();
    let (service, remote) = MockServiceCreator::new_service_with_remote();
    let mut manager = VRServiceManager::new();
    manager.register(service);
    manager.initialize_with_retry(RetryPolicy::once()).unwrap();

    let config = consumer_config(&consumer, FrameConversion::Stage);
    let mut bridge = Bridge::from_config(manager, &config).unwrap();

    remote
        .send(MockVRControlMsg::SetButtons(
            VRControllerHand::Right,
            MockButtons {
                trigger: 0.8,
                grip_button: true,
                ..Default::default()
            },
        ))
        .unwrap();
    remote
        .send(MockVRControlMsg::SetControllerPose(
            VRControllerHand::Right,
            [0.3, 1.1, -0.2],
            [0.0, 0.0, 0.0, 1.0],
        ))
        .unwrap();

    let message = relay_until(&mut bridge, &consumer, |m| m.right.button_pressed && m.right.pose[0][3] == 0.3);
    assert!((message.right.trigger - 0.8).abs() < 1e-6);
    assert_eq!(message.right.pose[1][3], 1.1);
    assert_eq!(message.right.pose[2][3], -0.2);
    assert!(!message.left.button_pressed);
    assert!(message.timestamp > 0.0);
}

#[test]
fn datagrams_are_plain_json_objects() {
    let consumer = UdpRelay::bind(loopback(), loopback()).unwrap();
    let raw = std::net::UdpSocket::bind(loopback()).unwrap();
    raw.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    let mut manager = VRServiceManager::new();
    manager.register_mock();
    manager.initialize_with_retry(RetryPolicy::once()).unwrap();

    let mut config = consumer_config(&consumer, FrameConversion::ZUp);
    config.target_addr = raw.local_addr().unwrap();
    let mut bridge = Bridge::from_config(manager, &config).unwrap();
    bridge.tick().unwrap();

    let mut buf = [0u8; 65_507];
    let (len, _) = raw.recv_from(&mut buf).unwrap();
    let json: Value = serde_json::from_slice(&buf[..len]).unwrap();
    for hand in ["left", "right"].iter() {
        let pose = json[*hand]["pose"].as_array().unwrap();
        assert_eq!(pose.len(), 4);
        assert!(pose.iter().all(|row| row.as_array().map(|r| r.len()) == Some(4)));
        assert!(json[*hand]["button_pressed"].is_boolean());
        assert!(json[*hand]["trigger"].is_number());
    }
    assert!(json["timestamp"].is_number());

    // The mock controllers sit 1m above the stage floor, which is +Z here.
    let left_height = json["left"]["pose"][2][3].as_f64().unwrap();
    assert!((left_height - 1.0).abs() < 1e-6);
}

#[test]
fn unreachable_consumer_does_not_stop_the_bridge() {
    let mut manager = VRServiceManager::new();
    manager.register_mock();
    manager.initialize_with_retry(RetryPolicy::once()).unwrap();

    let mut config = BridgeConfig::default();
    config.backend = Backend::Mock;
    config.local_addr = loopback();
    // Nobody listens on the discard port; ICMP errors may surface on later sends.
    config.target_addr = "127.0.0.1:9".parse().unwrap();
    let mut bridge = Bridge::from_config(manager, &config).unwrap();

    for _ in 0..5 {
        assert!(bridge.tick().is_ok());
    }
}
