use super::xr_err;
use ::openxr as xr;
use std::io;
use vr_bridge_api::{VRError, VRResult};

// Headless sessions have no frame timing to borrow, so the current XrTime
// comes from converting the OS clock through a KHR time extension.
pub struct RuntimeClock {
    instance: xr::Instance,
}

impl RuntimeClock {
    pub fn new(instance: &xr::Instance) -> VRResult<RuntimeClock> {
        #[cfg(unix)]
        let enabled = instance.exts().khr_convert_timespec_time.is_some();
        #[cfg(windows)]
        let enabled = instance.exts().khr_win32_convert_performance_counter_time.is_some();

        if !enabled {
            return Err(VRError::Unavailable("time conversion extension not enabled".into()));
        }
        Ok(RuntimeClock {
            instance: instance.clone(),
        })
    }

    #[cfg(unix)]
    pub fn now(&self) -> VRResult<xr::Time> {
        let ext = self
            .instance
            .exts()
            .khr_convert_timespec_time
            .as_ref()
            .ok_or(VRError::NotInitialized)?;

        let mut timespec = libc::timespec { tv_sec: 0, tv_nsec: 0 };
        if unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut timespec) } != 0 {
            return Err(io::Error::last_os_error().into());
        }

        let mut time = xr::Time::from_nanos(0);
        let result = unsafe {
            (ext.convert_timespec_time_to_time)(
                self.instance.as_raw(),
                &timespec as *const libc::timespec as *const _,
                &mut time,
            )
        };
        check(result, "xrConvertTimespecTimeToTimeKHR")?;
        Ok(time)
    }

    #[cfg(windows)]
    pub fn now(&self) -> VRResult<xr::Time> {
        use std::mem;
        use winapi::shared::ntdef::LARGE_INTEGER;
        use winapi::um::profileapi::QueryPerformanceCounter;

        let ext = self
            .instance
            .exts()
            .khr_win32_convert_performance_counter_time
            .as_ref()
            .ok_or(VRError::NotInitialized)?;

        let mut counter: LARGE_INTEGER = unsafe { mem::zeroed() };
        if unsafe { QueryPerformanceCounter(&mut counter) } == 0 {
            return Err(io::Error::last_os_error().into());
        }

        let mut time = xr::Time::from_nanos(0);
        let result = unsafe {
            (ext.convert_win32_performance_counter_to_time)(
                self.instance.as_raw(),
                &counter as *const LARGE_INTEGER as *const _,
                &mut time,
            )
        };
        check(result, "xrConvertWin32PerformanceCounterToTimeKHR")?;
        Ok(time)
    }
}

fn check(result: xr::sys::Result, call: &'static str) -> VRResult<()> {
    if result.into_raw() < 0 {
        return Err(xr_err(call)(result));
    }
    Ok(())
}
