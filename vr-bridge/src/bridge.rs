use crate::config::BridgeConfig;
use crate::message::{BridgeMessage, FrameConversion};
use crate::relay::UdpRelay;
use crate::vr_manager::VRServiceManager;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use vr_bridge_api::{VRControllerState, VRError, VRFrameData, VRResult};

/// Capture loop: samples the runtime, relays the controller states and
/// reports input changes on the log.
pub struct Bridge {
    manager: VRServiceManager,
    relay: Option<UdpRelay>,
    frame: FrameConversion,
    trigger_threshold: f32,
    tick_period: Option<Duration>,
    previous: Option<VRFrameData>,
}

impl Bridge {
    pub fn new(manager: VRServiceManager, relay: Option<UdpRelay>, config: &BridgeConfig) -> Bridge {
        Bridge {
            manager,
            relay,
            frame: config.frame,
            trigger_threshold: config.trigger_threshold,
            tick_period: config.tick_period(),
            previous: None,
        }
    }

    /// Binds the relay socket unless relaying is disabled.
    pub fn from_config(manager: VRServiceManager, config: &BridgeConfig) -> VRResult<Bridge> {
        let relay = if config.relay {
            Some(UdpRelay::bind(config.local_addr, config.target_addr)?)
        } else {
            info!("Relay disabled, reporting controller states on the console only");
            None
        };
        Ok(Bridge::new(manager, relay, config))
    }

    /// One capture/relay iteration.
    pub fn tick(&mut self) -> VRResult<VRFrameData> {
        let frame = self.manager.sync()?;
        for event in self.manager.poll_events() {
            debug!("VR event: {:?}", event);
        }

        if let Some(ref relay) = self.relay {
            let message = BridgeMessage::from_frame(&frame, self.frame);
            match relay.send(&message) {
                Ok(_) => {}
                Err(VRError::Io(ref e)) if e.kind() == io::ErrorKind::WouldBlock => {}
                // Nobody listening must not stop the capture.
                Err(e) => warn!("Failed to relay controller states: {}", e),
            }
        }

        self.report(&frame);
        self.previous = Some(frame.clone());
        Ok(frame)
    }

    /// Ticks until `stop` is set or the runtime ends the session.
    /// Returns the number of completed ticks.
    pub fn run(&mut self, stop: &AtomicBool) -> VRResult<u64> {
        let mut ticks = 0;
        while !stop.load(Ordering::Relaxed) {
            let started = Instant::now();
            match self.tick() {
                Ok(_) => ticks += 1,
                Err(VRError::Exited) => {
                    info!("VR session exited, stopping bridge");
                    break;
                }
                Err(e) => {
                    self.manager.shutdown();
                    return Err(e);
                }
            }

            if let Some(period) = self.tick_period {
                let elapsed = started.elapsed();
                if elapsed < period {
                    thread::sleep(period - elapsed);
                }
            }
        }
        self.manager.shutdown();
        Ok(ticks)
    }

    pub fn manager_mut(&mut self) -> &mut VRServiceManager {
        &mut self.manager
    }

    pub fn relay(&self) -> Option<&UdpRelay> {
        self.relay.as_ref()
    }

    fn report(&self, frame: &VRFrameData) {
        trace!("{}", status_line(frame));

        let changed = match self.previous {
            None => true,
            Some(ref previous) => {
                changed(&frame.left, &previous.left, self.trigger_threshold)
                    || changed(&frame.right, &previous.right, self.trigger_threshold)
            }
        };
        if changed {
            info!("{}", status_line(frame));
        }
    }
}

/// Console summary: seconds since the epoch, then grip and trigger of the
/// left and right controllers.
fn status_line(frame: &VRFrameData) -> String {
    format!(
        "{:.2} {} {:.3} {} {:.3}",
        frame.timestamp / 1000.0,
        frame.left.grip_button,
        frame.left.trigger,
        frame.right.grip_button,
        frame.right.trigger
    )
}

fn changed(current: &VRControllerState, previous: &VRControllerState, threshold: f32) -> bool {
    current.input_changed(previous, threshold)
}
