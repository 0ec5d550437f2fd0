use cgmath::{Quaternion, Rad, Rotation, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    config::{RotationPolicy, ZoneConfig},
    marker::{DestinationEvent, EmitterId, MarkerEvent, MarkerEventKind, SourceIndex},
    scheduler::TaskHandle,
    zone_log,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub(crate) u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneVisual {
    Default,
    Hover,
    Locked,
    Hidden,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneNotification {
    Locked,
    Unlocked,
    Hovered(SourceIndex),
    Unhovered(SourceIndex),
    Selected,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneNotice {
    pub zone: ZoneId,
    pub notification: ZoneNotification,
}

/// Side effects a zone asks its owner to carry out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoneEffect {
    SetProspective {
        position: Vector3<f32>,
        rotation: Option<Quaternion<f32>>,
    },
    ClearProspective,
    Confirm {
        position: Vector3<f32>,
        rotation: Option<Quaternion<f32>>,
    },
    Publish {
        emitter: EmitterId,
        kind: MarkerEventKind,
        payload: DestinationEvent,
    },
    PointerCursor {
        emitter: EmitterId,
        hidden: bool,
    },
}

/// Heading of `rotation` around world up, ignoring pitch and roll.
pub fn yaw_of(rotation: Quaternion<f32>) -> Quaternion<f32> {
    let forward = rotation * Vector3::new(0.0, 0.0, -1.0);
    Quaternion::from_angle_y(Rad((-forward.x).atan2(-forward.z)))
}

/// Landing pad that reacts to pointer events hitting its target.
#[derive(Clone, Debug)]
pub struct DestinationZone {
    id: ZoneId,
    config: ZoneConfig,
    pub(crate) emitter: Option<EmitterId>,
    pub(crate) pending_subscribe: Option<TaskHandle>,
    occupant: Option<SourceIndex>,
    hover_emitter: Option<EmitterId>,
    prospective_registered: bool,
    selected: bool,
    visual: ZoneVisual,
    previous_locked: Option<bool>,
}

impl DestinationZone {
    pub fn new(id: ZoneId, config: ZoneConfig) -> Self {
        Self {
            id,
            config,
            emitter: None,
            pending_subscribe: None,
            occupant: None,
            hover_emitter: None,
            prospective_registered: false,
            selected: false,
            visual: ZoneVisual::Default,
            previous_locked: None,
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.emitter.is_some()
    }

    pub fn emitter(&self) -> Option<EmitterId> {
        self.emitter
    }

    pub fn is_locked(&self) -> bool {
        !self.config.enable_teleport
    }

    pub fn is_snap_point(&self) -> bool {
        self.config.snap_to_point
    }

    pub fn occupant(&self) -> Option<SourceIndex> {
        self.occupant
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn visual(&self) -> ZoneVisual {
        self.visual
    }

    pub fn has_prospective_destination(&self) -> bool {
        self.prospective_registered
    }

    pub(crate) fn set_teleport_enabled(&mut self, enabled: bool) {
        self.config.enable_teleport = enabled;
    }

    pub fn resolve_rotation(&self, headset: Quaternion<f32>) -> Option<Quaternion<f32>> {
        let anchor = self.config.anchor_rotation();
        match self.config.rotation_policy {
            RotationPolicy::None => None,
            RotationPolicy::Absolute => Some(anchor),
            RotationPolicy::RelativeToSourceOrientation => {
                Some(anchor * yaw_of(headset).invert())
            }
        }
    }

    fn resting_visual(&self) -> ZoneVisual {
        if self.selected {
            ZoneVisual::Hidden
        } else if self.occupant.is_some() {
            ZoneVisual::Hover
        } else if self.is_locked() {
            ZoneVisual::Locked
        } else {
            ZoneVisual::Default
        }
    }

    pub(crate) fn enable(&mut self, emitter: EmitterId) {
        self.emitter = Some(emitter);
        self.previous_locked = None;
        self.visual = self.resting_visual();
    }

    /// Drop every transient state. Returns the effects needed to undo what the
    /// zone told the outside world.
    pub(crate) fn disable(&mut self) -> Vec<ZoneEffect> {
        let mut effects = Vec::new();
        if self.prospective_registered {
            effects.push(ZoneEffect::ClearProspective);
            self.prospective_registered = false;
        }
        if let Some(emitter) = self.hover_emitter.take() {
            if self.config.hide_pointer_cursor_on_hover {
                effects.push(ZoneEffect::PointerCursor {
                    emitter,
                    hidden: false,
                });
            }
        }
        self.occupant = None;
        self.selected = false;
        self.emitter = None;
        self.pending_subscribe = None;
        self.visual = ZoneVisual::Default;
        effects
    }

    pub(crate) fn on_enter(
        &mut self,
        event: &MarkerEvent,
        headset: Quaternion<f32>,
        notices: &mut Vec<ZoneNotice>,
    ) -> Vec<ZoneEffect> {
        let mut effects = Vec::new();
        if self.occupant.is_some() || !event.payload.hits(self.config.target) {
            return effects;
        }
        let source = event.payload.source_index;
        self.occupant = Some(source);
        self.hover_emitter = Some(event.emitter);
        self.visual = self.resting_visual();
        self.notify(notices, ZoneNotification::Hovered(source));

        if self.config.hide_pointer_cursor_on_hover {
            effects.push(ZoneEffect::PointerCursor {
                emitter: event.emitter,
                hidden: true,
            });
        }
        if !self.is_locked() && self.is_snap_point() {
            effects.push(ZoneEffect::SetProspective {
                position: self.config.anchor_position,
                rotation: self.resolve_rotation(headset),
            });
            self.prospective_registered = true;
        }
        effects
    }

    pub(crate) fn on_exit(
        &mut self,
        event: &MarkerEvent,
        notices: &mut Vec<ZoneNotice>,
    ) -> Vec<ZoneEffect> {
        let mut effects = Vec::new();
        if self.hover_emitter != Some(event.emitter) {
            return effects;
        }
        let source = self.occupant.take().unwrap_or(event.payload.source_index);
        self.hover_emitter = None;
        self.visual = self.resting_visual();
        self.notify(notices, ZoneNotification::Unhovered(source));

        if self.config.hide_pointer_cursor_on_hover {
            effects.push(ZoneEffect::PointerCursor {
                emitter: event.emitter,
                hidden: false,
            });
        }
        if self.prospective_registered {
            self.prospective_registered = false;
            effects.push(ZoneEffect::ClearProspective);
        }
        effects
    }

    /// Returns true when this zone became the selected zone.
    pub(crate) fn on_set(
        &mut self,
        event: &MarkerEvent,
        headset: Quaternion<f32>,
        notices: &mut Vec<ZoneNotice>,
        effects: &mut Vec<ZoneEffect>,
    ) -> bool {
        if !event.payload.hits(self.config.target) {
            if self.selected {
                self.reset(notices);
            }
            return false;
        }
        if self.is_locked() {
            zone_log!(DEBUG, "{:?} is locked, ignoring set", self.id);
            return false;
        }
        if !event.payload.allow_teleport {
            return false;
        }

        let rotation = self.resolve_rotation(headset);
        let position = if self.is_snap_point() {
            self.config.anchor_position
        } else {
            event.payload.destination_position
        };
        effects.push(ZoneEffect::Confirm { position, rotation });
        if self.is_snap_point() {
            if let Some(emitter) = self.emitter {
                effects.push(ZoneEffect::Publish {
                    emitter,
                    kind: MarkerEventKind::Set,
                    payload: event.payload.redirected(position, rotation),
                });
            }
        }
        self.prospective_registered = false;
        self.selected = true;
        self.visual = ZoneVisual::Hidden;
        self.notify(notices, ZoneNotification::Selected);
        true
    }

    pub(crate) fn reset(&mut self, notices: &mut Vec<ZoneNotice>) {
        self.selected = false;
        self.visual = self.resting_visual();
        self.notify(notices, ZoneNotification::Reset);
    }

    /// Compare the lock flag against last frame's value.
    pub(crate) fn check_lock(&mut self, notices: &mut Vec<ZoneNotice>) -> Vec<ZoneEffect> {
        let locked = self.is_locked();
        let previous = self.previous_locked.replace(locked);
        let mut effects = Vec::new();
        match (previous, locked) {
            (None, true) | (Some(false), true) => {
                self.notify(notices, ZoneNotification::Locked);
                if self.prospective_registered {
                    self.prospective_registered = false;
                    effects.push(ZoneEffect::ClearProspective);
                }
                self.selected = false;
                self.visual = self.resting_visual();
            }
            (Some(true), false) => {
                self.notify(notices, ZoneNotification::Unlocked);
                self.visual = self.resting_visual();
            }
            _ => {}
        }
        effects
    }

    fn notify(&self, notices: &mut Vec<ZoneNotice>, notification: ZoneNotification) {
        zone_log!(DEBUG, "{:?} {:?}", self.id, notification);
        notices.push(ZoneNotice {
            zone: self.id,
            notification,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        marker::{EmitterOwner, MarkerBus},
        pointer::PointerId,
        scene::{RaycastHit, TargetHandle},
    };
    use approx::assert_relative_eq;
    use cgmath::{vec3, Deg};

    fn event(emitter: EmitterId, kind: MarkerEventKind, target: u64) -> MarkerEvent {
        let hit = RaycastHit {
            point: vec3(1.0, 0.0, -3.0),
            normal: vec3(0.0, 1.0, 0.0),
            target: TargetHandle(target),
            distance: 3.0,
        };
        MarkerEvent {
            emitter,
            kind,
            payload: DestinationEvent::from_hit(&hit, hit.point, SourceIndex(0), true),
        }
    }

    fn pointer_emitter() -> EmitterId {
        MarkerBus::new().register_emitter(EmitterOwner::Pointer(PointerId(0)))
    }

    fn identity() -> Quaternion<f32> {
        Quaternion::new(1.0, 0.0, 0.0, 0.0)
    }

    #[test]
    fn test_snap_zone_enter_registers_anchor() {
        let mut zone = DestinationZone::new(ZoneId(0), ZoneConfig::new(TargetHandle(5), vec3(2.0, 0.0, -4.0)));
        let mut notices = Vec::new();
        let emitter = pointer_emitter();
        let effects = zone.on_enter(&event(emitter, MarkerEventKind::Enter, 5), identity(), &mut notices);
        assert_eq!(
            effects,
            vec![ZoneEffect::SetProspective {
                position: vec3(2.0, 0.0, -4.0),
                rotation: None
            }]
        );
        assert_eq!(zone.visual(), ZoneVisual::Hover);
        assert_eq!(zone.occupant(), Some(SourceIndex(0)));

        let effects = zone.on_exit(&event(emitter, MarkerEventKind::Exit, 5), &mut notices);
        assert_eq!(effects, vec![ZoneEffect::ClearProspective]);
        assert_eq!(zone.visual(), ZoneVisual::Default);
    }

    #[test]
    fn test_enter_for_other_target_is_ignored() {
        let mut zone = DestinationZone::new(ZoneId(0), ZoneConfig::new(TargetHandle(5), vec3(0.0, 0.0, 0.0)));
        let mut notices = Vec::new();
        let effects = zone.on_enter(&event(pointer_emitter(), MarkerEventKind::Enter, 6), identity(), &mut notices);
        assert!(effects.is_empty());
        assert!(notices.is_empty());
    }

    #[test]
    fn test_free_area_zone_confirms_at_raw_destination() {
        let mut zone = DestinationZone::new(
            ZoneId(0),
            ZoneConfig {
                snap_to_point: false,
                ..ZoneConfig::new(TargetHandle(5), vec3(9.0, 9.0, 9.0))
            },
        );
        let mut notices = Vec::new();
        let mut effects = Vec::new();
        let selected = zone.on_set(&event(pointer_emitter(), MarkerEventKind::Set, 5), identity(), &mut notices, &mut effects);
        assert!(selected);
        assert_eq!(
            effects,
            vec![ZoneEffect::Confirm {
                position: vec3(1.0, 0.0, -3.0),
                rotation: None
            }]
        );
        assert_eq!(zone.visual(), ZoneVisual::Hidden);
    }

    #[test]
    fn test_locked_zone_never_registers_or_confirms() {
        let mut zone = DestinationZone::new(
            ZoneId(0),
            ZoneConfig {
                enable_teleport: false,
                ..ZoneConfig::new(TargetHandle(5), vec3(0.0, 0.0, 0.0))
            },
        );
        let mut notices = Vec::new();
        let emitter = pointer_emitter();
        assert!(zone
            .on_enter(&event(emitter, MarkerEventKind::Enter, 5), identity(), &mut notices)
            .is_empty());
        let mut effects = Vec::new();
        assert!(!zone.on_set(&event(emitter, MarkerEventKind::Set, 5), identity(), &mut notices, &mut effects));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_lock_flips_notify_once_each() {
        let mut zone = DestinationZone::new(
            ZoneId(0),
            ZoneConfig {
                enable_teleport: false,
                ..ZoneConfig::default()
            },
        );
        let mut notices = Vec::new();
        zone.check_lock(&mut notices);
        zone.check_lock(&mut notices);
        zone.set_teleport_enabled(true);
        zone.check_lock(&mut notices);
        zone.check_lock(&mut notices);
        let notifications: Vec<_> = notices.iter().map(|n| n.notification).collect();
        assert_eq!(
            notifications,
            vec![ZoneNotification::Locked, ZoneNotification::Unlocked]
        );
        assert_eq!(zone.visual(), ZoneVisual::Default);
    }

    #[test]
    fn test_rotation_policies() {
        let mut config = ZoneConfig::new(TargetHandle(1), vec3(0.0, 0.0, 0.0));
        config.anchor_yaw_degrees = 90.0;
        let headset = Quaternion::from_angle_y(Deg(30.0)) * Quaternion::from_angle_x(Deg(20.0));

        config.rotation_policy = RotationPolicy::None;
        assert_eq!(DestinationZone::new(ZoneId(0), config.clone()).resolve_rotation(headset), None);

        config.rotation_policy = RotationPolicy::Absolute;
        let absolute = DestinationZone::new(ZoneId(0), config.clone())
            .resolve_rotation(headset)
            .expect("rotation");
        assert_relative_eq!(absolute, Quaternion::from_angle_y(Deg(90.0)), epsilon = 1e-5);

        config.rotation_policy = RotationPolicy::RelativeToSourceOrientation;
        let relative = DestinationZone::new(ZoneId(0), config)
            .resolve_rotation(headset)
            .expect("rotation");
        assert_relative_eq!(relative, Quaternion::from_angle_y(Deg(60.0)), epsilon = 1e-4);
    }
}
