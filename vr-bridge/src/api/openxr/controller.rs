use super::{pose_from_xr, xr_err, Headless};
use ::openxr as xr;
use vr_bridge_api::{VRControllerHand, VRControllerState, VRError, VRResult};

pub const VIVE_CONTROLLER_PROFILE: &str = "/interaction_profiles/htc/vive_controller";

/// A VIVE Controller (2018) bound through the OpenXR action system.
pub struct ViveController {
    hand: VRControllerHand,
    path: xr::Path,
    pose_action: xr::Action<xr::Posef>,
    menu_button_action: xr::Action<bool>,
    trackpad_x_action: xr::Action<f32>,
    trackpad_y_action: xr::Action<f32>,
    trackpad_button_action: xr::Action<bool>,
    trigger_action: xr::Action<f32>,
    grip_button_action: xr::Action<bool>,
    space: Option<xr::Space>,
    state: VRControllerState,
}

fn create_action<T: xr::ActionTy>(
    action_set: &xr::ActionSet,
    hand: VRControllerHand,
    suffix: &str,
    label: &str,
    path: xr::Path,
) -> VRResult<xr::Action<T>> {
    action_set
        .create_action::<T>(
            &format!("{}_{}", hand.name(), suffix),
            &format!("{} {}", hand.display_name(), label),
            &[path],
        )
        .map_err(xr_err("xrCreateAction"))
}

impl ViveController {
    pub fn new(
        instance: &xr::Instance,
        action_set: &xr::ActionSet,
        hand: VRControllerHand,
    ) -> VRResult<ViveController> {
        let path = instance
            .string_to_path(hand.user_path())
            .map_err(xr_err("xrStringToPath"))?;

        Ok(ViveController {
            hand,
            path,
            pose_action: create_action(action_set, hand, "pose", "Pose", path)?,
            menu_button_action: create_action(action_set, hand, "menu_button", "Menu Button", path)?,
            trackpad_x_action: create_action(action_set, hand, "trackpad_x", "Trackpad X", path)?,
            trackpad_y_action: create_action(action_set, hand, "trackpad_y", "Trackpad Y", path)?,
            trackpad_button_action: create_action(action_set, hand, "trackpad_button", "Trackpad Click", path)?,
            trigger_action: create_action(action_set, hand, "trigger", "Trigger", path)?,
            grip_button_action: create_action(action_set, hand, "grip_button", "Grip Button", path)?,
            space: None,
            state: VRControllerState::new(hand),
        })
    }

    /// Suggested bindings of this controller's actions for the Vive profile.
    pub fn bindings(&self, instance: &xr::Instance) -> VRResult<Vec<xr::Binding<'_>>> {
        let input = |component: &str| {
            instance
                .string_to_path(&self.hand.input_path(component))
                .map_err(xr_err("xrStringToPath"))
        };

        Ok(vec![
            xr::Binding::new(&self.pose_action, input("grip/pose")?),
            xr::Binding::new(&self.menu_button_action, input("menu/click")?),
            xr::Binding::new(&self.trackpad_x_action, input("trackpad/x")?),
            xr::Binding::new(&self.trackpad_y_action, input("trackpad/y")?),
            xr::Binding::new(&self.trackpad_button_action, input("trackpad/click")?),
            xr::Binding::new(&self.trigger_action, input("trigger/value")?),
            xr::Binding::new(&self.grip_button_action, input("squeeze/click")?),
        ])
    }

    /// Must be called once the action set is attached to the session.
    pub fn create_space(&mut self, session: &xr::Session<Headless>) -> VRResult<()> {
        let space = self
            .pose_action
            .create_space(session.clone(), self.path, xr::Posef::IDENTITY)
            .map_err(xr_err("xrCreateActionSpace"))?;
        self.space = Some(space);
        Ok(())
    }

    /// Samples pose and inputs at `time`. The previous pose is kept when the
    /// runtime does not report a valid position.
    pub fn update(
        &mut self,
        session: &xr::Session<Headless>,
        stage: &xr::Space,
        time: xr::Time,
        timestamp: f64,
    ) -> VRResult<()> {
        let space = self.space.as_ref().ok_or(VRError::NotInitialized)?;
        let location = space.locate(stage, time).map_err(xr_err("xrLocateSpace"))?;
        if location
            .location_flags
            .contains(xr::SpaceLocationFlags::POSITION_VALID)
        {
            self.state.pose = pose_from_xr(&location.pose);
        }

        let path = self.path;
        self.state.connected = self
            .pose_action
            .is_active(session, path)
            .map_err(xr_err("xrGetActionStatePose"))?;
        self.state.menu_button = self
            .menu_button_action
            .state(session, path)
            .map_err(xr_err("xrGetActionStateBoolean"))?
            .current_state;
        self.state.trackpad_x = self
            .trackpad_x_action
            .state(session, path)
            .map_err(xr_err("xrGetActionStateFloat"))?
            .current_state;
        self.state.trackpad_y = self
            .trackpad_y_action
            .state(session, path)
            .map_err(xr_err("xrGetActionStateFloat"))?
            .current_state;
        self.state.trackpad_button = self
            .trackpad_button_action
            .state(session, path)
            .map_err(xr_err("xrGetActionStateBoolean"))?
            .current_state;
        self.state.trigger = self
            .trigger_action
            .state(session, path)
            .map_err(xr_err("xrGetActionStateFloat"))?
            .current_state;
        self.state.grip_button = self
            .grip_button_action
            .state(session, path)
            .map_err(xr_err("xrGetActionStateBoolean"))?
            .current_state;
        self.state.timestamp = timestamp;

        Ok(())
    }

    pub fn hand(&self) -> VRControllerHand {
        self.hand
    }

    pub fn state(&self) -> &VRControllerState {
        &self.state
    }
}
