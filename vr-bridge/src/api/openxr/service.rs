use super::clock::RuntimeClock;
use super::controller::{ViveController, VIVE_CONTROLLER_PROFILE};
use super::{pose_from_xr, xr_err, Headless, OpenXrSettings};
use ::openxr as xr;
use std::mem;
use std::thread;
use std::time::Instant;
use vr_bridge_api::{
    utils, VRControllerHand, VREvent, VRError, VRFrameData, VRResult, VRService, VRSessionState,
};

// Handles owned while connected to the runtime
struct Runtime {
    controllers: Vec<ViveController>,
    view_space: xr::Space,
    stage_space: xr::Space,
    action_set: xr::ActionSet,
    frame_waiter: xr::FrameWaiter,
    frame_stream: xr::FrameStream<Headless>,
    session: xr::Session<Headless>,
    clock: RuntimeClock,
    instance: xr::Instance,
}

// Headless OpenXr Service implementation
pub struct OpenXrService {
    settings: OpenXrSettings,
    runtime: Option<Runtime>,
    session_state: VRSessionState,
    session_running: bool,
    exited: bool,
    events: Vec<VREvent>,
    last_frame: VRFrameData,
}

unsafe impl Send for OpenXrService {}

impl OpenXrService {
    pub fn new(settings: OpenXrSettings) -> OpenXrService {
        OpenXrService {
            settings,
            runtime: None,
            session_state: VRSessionState::Unknown,
            session_running: false,
            exited: false,
            events: Vec::new(),
            last_frame: VRFrameData::default(),
        }
    }

    // Keeps syncing until a controller reports an active pose. SteamVR needs
    // a moment after the session starts before the controllers show up.
    fn wait_for_controllers(&mut self) -> VRResult<()> {
        let deadline = Instant::now() + self.settings.warmup;
        loop {
            let frame = self.sync()?;
            if frame.left.connected || frame.right.connected {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(VRError::ControllersNotDetected);
            }
        }
    }

    fn pump_events(&mut self) -> VRResult<()> {
        let runtime = self.runtime.as_mut().ok_or(VRError::NotInitialized)?;
        let mut buffer = xr::EventDataBuffer::new();

        while let Some(event) = runtime
            .instance
            .poll_event(&mut buffer)
            .map_err(xr_err("xrPollEvent"))?
        {
            match event {
                xr::Event::SessionStateChanged(e) => {
                    let state = session_state_from_xr(e.state());
                    info!("OpenXR session state changed to {}", state);
                    self.session_state = state;
                    self.events.push(VREvent::SessionStateChanged(state));

                    match state {
                        VRSessionState::Ready => {
                            runtime
                                .session
                                .begin(xr::ViewConfigurationType::PRIMARY_MONO)
                                .map_err(xr_err("xrBeginSession"))?;
                            self.session_running = true;
                        }
                        VRSessionState::Stopping => {
                            runtime.session.end().map_err(xr_err("xrEndSession"))?;
                            self.session_running = false;
                        }
                        VRSessionState::Exiting | VRSessionState::LossPending => {
                            self.session_running = false;
                            self.exited = true;
                        }
                        _ => {}
                    }
                }
                xr::Event::InstanceLossPending(_) => {
                    warn!("OpenXR instance loss pending");
                    self.events.push(VREvent::InstanceLossPending);
                    self.session_running = false;
                    self.exited = true;
                }
                xr::Event::EventsLost(e) => {
                    warn!("Lost {} OpenXR events", e.lost_event_count());
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Runtime {
    fn create(settings: &OpenXrSettings) -> VRResult<Runtime> {
        let entry = unsafe { xr::Entry::load() }
            .map_err(|e| VRError::Unavailable(format!("OpenXR loader: {:?}", e)))?;

        let available = entry
            .enumerate_extensions()
            .map_err(xr_err("xrEnumerateInstanceExtensionProperties"))?;

        // Permits use without a graphics binding
        if !available.mnd_headless {
            return Err(VRError::Unavailable("runtime lacks XR_MND_headless".into()));
        }
        let mut exts = xr::ExtensionSet::default();
        exts.mnd_headless = true;

        #[cfg(unix)]
        {
            if !available.khr_convert_timespec_time {
                return Err(VRError::Unavailable("runtime lacks XR_KHR_convert_timespec_time".into()));
            }
            exts.khr_convert_timespec_time = true;
        }
        #[cfg(windows)]
        {
            if !available.khr_win32_convert_performance_counter_time {
                return Err(VRError::Unavailable(
                    "runtime lacks XR_KHR_win32_convert_performance_counter_time".into(),
                ));
            }
            exts.khr_win32_convert_performance_counter_time = true;
        }

        let app_info = xr::ApplicationInfo {
            application_name: &settings.application_name,
            ..Default::default()
        };
        let instance = entry
            .create_instance(&app_info, &exts, &[])
            .map_err(xr_err("xrCreateInstance"))?;

        if let Ok(props) = instance.properties() {
            let version = props.runtime_version;
            info!(
                "Connected to OpenXR runtime {} {}.{}.{}",
                props.runtime_name,
                version.major(),
                version.minor(),
                version.patch()
            );
        }

        let system = match instance.system(xr::FormFactor::HEAD_MOUNTED_DISPLAY) {
            Ok(system) => system,
            Err(e) if e == xr::sys::Result::ERROR_FORM_FACTOR_UNAVAILABLE => return Err(VRError::NoSystem),
            Err(e) => return Err(xr_err("xrGetSystem")(e)),
        };

        let (session, frame_waiter, frame_stream) = unsafe {
            instance.create_session::<Headless>(system, &())
        }
        .map_err(xr_err("xrCreateSession"))?;

        let clock = RuntimeClock::new(&instance)?;

        let action_set = instance
            .create_action_set("action_set", "Action Set", 0)
            .map_err(xr_err("xrCreateActionSet"))?;

        let mut controllers = VRControllerHand::ALL
            .iter()
            .map(|&hand| ViveController::new(&instance, &action_set, hand))
            .collect::<VRResult<Vec<_>>>()?;

        {
            let mut bindings = Vec::new();
            for controller in &controllers {
                bindings.extend(controller.bindings(&instance)?);
            }
            let profile = instance
                .string_to_path(VIVE_CONTROLLER_PROFILE)
                .map_err(xr_err("xrStringToPath"))?;
            instance
                .suggest_interaction_profile_bindings(profile, &bindings)
                .map_err(xr_err("xrSuggestInteractionProfileBindings"))?;
        }

        session
            .attach_action_sets(&[&action_set])
            .map_err(xr_err("xrAttachSessionActionSets"))?;

        let stage_space = session
            .create_reference_space(xr::ReferenceSpaceType::STAGE, xr::Posef::IDENTITY)
            .map_err(xr_err("xrCreateReferenceSpace"))?;
        let view_space = session
            .create_reference_space(xr::ReferenceSpaceType::VIEW, xr::Posef::IDENTITY)
            .map_err(xr_err("xrCreateReferenceSpace"))?;

        for controller in &mut controllers {
            controller.create_space(&session)?;
        }

        Ok(Runtime {
            controllers,
            view_space,
            stage_space,
            action_set,
            frame_waiter,
            frame_stream,
            session,
            clock,
            instance,
        })
    }

    // Empty frame loop, keeps the runtime pacing us and showing the app as active.
    fn pace_frame(&mut self) -> VRResult<()> {
        let state = self.frame_waiter.wait().map_err(xr_err("xrWaitFrame"))?;
        self.frame_stream.begin().map_err(xr_err("xrBeginFrame"))?;
        self.frame_stream
            .end(state.predicted_display_time, xr::EnvironmentBlendMode::OPAQUE, &[])
            .map_err(xr_err("xrEndFrame"))
    }
}

impl VRService for OpenXrService {
    fn initialize(&mut self) -> VRResult<()> {
        if self.runtime.is_some() {
            return Ok(());
        }

        self.session_state = VRSessionState::Unknown;
        self.session_running = false;
        self.exited = false;
        self.last_frame = VRFrameData::default();

        self.runtime = Some(Runtime::create(&self.settings)?);
        if let Err(e) = self.wait_for_controllers() {
            self.shutdown();
            return Err(e);
        }
        info!("OpenXR controllers detected");
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.runtime.is_some() && !self.exited
    }

    fn sync(&mut self) -> VRResult<VRFrameData> {
        if self.exited {
            return Err(VRError::Exited);
        }
        self.pump_events()?;
        if self.exited {
            return Err(VRError::Exited);
        }

        let runtime = self.runtime.as_mut().ok_or(VRError::NotInitialized)?;
        if !self.session_running {
            thread::sleep(self.settings.idle_interval);
            return Ok(self.last_frame.clone());
        }

        runtime.pace_frame()?;
        let time = runtime.clock.now()?;
        let timestamp = utils::timestamp();

        runtime
            .session
            .sync_actions(&[xr::ActiveActionSet::new(&runtime.action_set)])
            .map_err(xr_err("xrSyncActions"))?;

        let mut frame = self.last_frame.clone();
        frame.timestamp = timestamp;

        let hmd = runtime
            .view_space
            .locate(&runtime.stage_space, time)
            .map_err(xr_err("xrLocateSpace"))?;
        if hmd.location_flags.contains(xr::SpaceLocationFlags::POSITION_VALID) {
            frame.hmd = pose_from_xr(&hmd.pose);
        }

        for controller in &mut runtime.controllers {
            let was_connected = controller.state().connected;
            controller.update(&runtime.session, &runtime.stage_space, time, timestamp)?;

            let state = controller.state();
            if state.connected != was_connected {
                let hand = controller.hand();
                if state.connected {
                    info!("{} controller connected", hand);
                    self.events.push(VREvent::ControllerConnected(hand));
                } else {
                    warn!("{} controller lost", hand);
                    self.events.push(VREvent::ControllerDisconnected(hand));
                }
            }
            *frame.controller_mut(controller.hand()) = state.clone();
        }

        self.last_frame = frame.clone();
        Ok(frame)
    }

    fn poll_events(&mut self) -> Vec<VREvent> {
        mem::replace(&mut self.events, Vec::new())
    }

    fn session_state(&self) -> VRSessionState {
        self.session_state
    }

    fn shutdown(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            if self.session_running {
                if let Err(e) = runtime.session.request_exit() {
                    warn!("Error requesting OpenXR session exit: {:?}", e);
                }
            }
            debug!("Destroying OpenXR session and instance");
            drop(runtime);
        }
        self.session_running = false;
    }
}

impl Drop for OpenXrService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn session_state_from_xr(state: xr::SessionState) -> VRSessionState {
    match state {
        xr::SessionState::IDLE => VRSessionState::Idle,
        xr::SessionState::READY => VRSessionState::Ready,
        xr::SessionState::SYNCHRONIZED => VRSessionState::Synchronized,
        xr::SessionState::VISIBLE => VRSessionState::Visible,
        xr::SessionState::FOCUSED => VRSessionState::Focused,
        xr::SessionState::STOPPING => VRSessionState::Stopping,
        xr::SessionState::LOSS_PENDING => VRSessionState::LossPending,
        xr::SessionState::EXITING => VRSessionState::Exiting,
        _ => VRSessionState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn service() -> OpenXrService {
        OpenXrService::new(OpenXrSettings {
            warmup: Duration::from_millis(0),
            idle_interval: Duration::from_millis(0),
            ..Default::default()
        })
    }

    #[test]
    fn maps_every_session_state() {
        let cases = [
            (xr::SessionState::IDLE, VRSessionState::Idle),
            (xr::SessionState::READY, VRSessionState::Ready),
            (xr::SessionState::SYNCHRONIZED, VRSessionState::Synchronized),
            (xr::SessionState::VISIBLE, VRSessionState::Visible),
            (xr::SessionState::FOCUSED, VRSessionState::Focused),
            (xr::SessionState::STOPPING, VRSessionState::Stopping),
            (xr::SessionState::LOSS_PENDING, VRSessionState::LossPending),
            (xr::SessionState::EXITING, VRSessionState::Exiting),
            (xr::SessionState::UNKNOWN, VRSessionState::Unknown),
        ];
        for &(state, expected) in cases.iter() {
            assert_eq!(session_state_from_xr(state), expected, "{:?}", state);
        }
    }

    #[test]
    fn only_exit_states_are_terminal() {
        let terminal = [xr::SessionState::LOSS_PENDING, xr::SessionState::EXITING];
        let running = [
            xr::SessionState::SYNCHRONIZED,
            xr::SessionState::VISIBLE,
            xr::SessionState::FOCUSED,
        ];
        for &state in terminal.iter() {
            let mapped = session_state_from_xr(state);
            assert!(mapped.is_terminal() && !mapped.is_running(), "{:?}", state);
        }
        for &state in running.iter() {
            let mapped = session_state_from_xr(state);
            assert!(mapped.is_running() && !mapped.is_terminal(), "{:?}", state);
        }
        for &state in [xr::SessionState::IDLE, xr::SessionState::READY, xr::SessionState::STOPPING].iter() {
            let mapped = session_state_from_xr(state);
            assert!(!mapped.is_running() && !mapped.is_terminal(), "{:?}", state);
        }
    }

    #[test]
    fn unconnected_service_is_unavailable() {
        let mut service = service();
        assert!(!service.is_available());
        assert_eq!(service.session_state(), VRSessionState::Unknown);
        assert!(matches!(service.sync(), Err(VRError::NotInitialized)));
        assert!(matches!(service.wait_for_controllers(), Err(VRError::NotInitialized)));
        assert!(service.poll_events().is_empty());
        service.shutdown();
        service.shutdown();
    }

    #[test]
    fn exited_session_stays_exited() {
        let mut service = service();
        service.exited = true;
        assert!(matches!(service.sync(), Err(VRError::Exited)));
        assert!(matches!(service.sync(), Err(VRError::Exited)));
        assert!(!service.is_available());
    }
}
