mod clock;
mod controller;
mod service;

use ::openxr as xr;
use std::ptr;
use std::time::Duration;
use vr_bridge_api::{VRError, VRPose, VRService, VRServiceCreator};

pub use self::service::OpenXrService;

#[derive(Debug, Clone)]
pub struct OpenXrSettings {
    pub application_name: String,
    // How long initialization waits for a controller to report an active pose.
    pub warmup: Duration,
    // Sleep between event polls while the session is not running.
    pub idle_interval: Duration,
}

impl Default for OpenXrSettings {
    fn default() -> OpenXrSettings {
        OpenXrSettings {
            application_name: "vr_bridge".into(),
            warmup: Duration::from_secs(5),
            idle_interval: Duration::from_millis(10),
        }
    }
}

pub struct OpenXrServiceCreator {
    settings: OpenXrSettings,
}

impl OpenXrServiceCreator {
    pub fn new() -> Box<dyn VRServiceCreator> {
        Box::new(OpenXrServiceCreator {
            settings: OpenXrSettings::default(),
        })
    }

    pub fn with_settings(settings: OpenXrSettings) -> Box<dyn VRServiceCreator> {
        Box::new(OpenXrServiceCreator { settings })
    }
}

impl VRServiceCreator for OpenXrServiceCreator {
    fn new_service(&self) -> Box<dyn VRService> {
        Box::new(OpenXrService::new(self.settings.clone()))
    }
}

/// Session without a graphics binding, as permitted by `XR_MND_headless`.
/// Such sessions never create swapchains.
pub enum Headless {}

impl xr::Graphics for Headless {
    type Requirements = ();
    type SessionCreateInfo = ();
    type Format = i64;
    type SwapchainImage = ();

    fn raise_format(x: i64) -> i64 {
        x
    }

    fn lower_format(x: i64) -> i64 {
        x
    }

    fn requirements(_: &xr::Instance, _: xr::SystemId) -> xr::Result<()> {
        Ok(())
    }

    unsafe fn create_session(
        instance: &xr::Instance,
        system: xr::SystemId,
        _: &(),
    ) -> xr::Result<xr::sys::Session> {
        let info = xr::sys::SessionCreateInfo {
            ty: xr::sys::SessionCreateInfo::TYPE,
            next: ptr::null(),
            create_flags: Default::default(),
            system_id: system,
        };
        let mut out = xr::sys::Session::NULL;
        let result = (instance.fp().create_session)(instance.as_raw(), &info, &mut out);
        if result.into_raw() < 0 {
            return Err(result);
        }
        Ok(out)
    }

    fn enumerate_swapchain_images(_: &xr::Swapchain<Headless>) -> xr::Result<Vec<()>> {
        Ok(Vec::new())
    }
}

fn xr_err(call: &'static str) -> impl Fn(xr::sys::Result) -> VRError {
    move |result| VRError::Runtime(format!("{} failed: {:?}", call, result))
}

fn pose_from_xr(pose: &xr::Posef) -> VRPose {
    let p = pose.position;
    let o = pose.orientation;
    VRPose::new([p.x, p.y, p.z], [o.x, o.y, o.z, o.w])
}
