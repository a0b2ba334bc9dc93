#[cfg(all(unix, feature = "openxr"))]
extern crate libc;
#[macro_use]
extern crate log;
#[cfg(feature = "openxr")]
extern crate openxr;
#[macro_use]
extern crate serde_derive;
extern crate vr_bridge_api;
#[cfg(all(windows, feature = "openxr"))]
extern crate winapi;

pub mod api;
pub mod bridge;
pub mod config;
pub mod message;
pub mod relay;
mod vr_manager;

pub use bridge::Bridge;
pub use config::{Backend, BridgeConfig};
pub use message::{BridgeMessage, ControllerMessage, FrameConversion};
pub use relay::UdpRelay;
pub use vr_bridge_api::*;
pub use vr_manager::{RetryPolicy, VRServiceManager};
