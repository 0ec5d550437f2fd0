use std::collections::BTreeMap;

use cgmath::Quaternion;

use super::{DestinationZone, ZoneEffect, ZoneId, ZoneNotice};
use crate::{
    config::ZoneConfig,
    error::{Result, TargetingError},
    marker::{
        bus::DEFAULT_HISTORY_LIMIT, EmitterId, EmitterOwner, MarkerBus, MarkerEvent,
        MarkerEventKind, MarkerKinds, Subscriber,
    },
    scene::TargetHandle,
    scheduler::FrameScheduler,
    zone_log,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ZoneTask {
    Subscribe(ZoneId),
}

/// Owns every destination zone and the single "current" zone reference.
///
/// Zones subscribe to every other emitter one frame after they are enabled.
/// Event handling is driven from outside: whoever drains the marker bus calls
/// `handle_event` for each zone subscriber and applies the returned effects.
/// Notices are kept until taken, at most `history_limit` of the most recent.
#[derive(Debug)]
pub struct DestinationZoneRegistry {
    zones: BTreeMap<ZoneId, DestinationZone>,
    next_id: u32,
    current: Option<ZoneId>,
    scheduler: FrameScheduler<ZoneTask>,
    notices: Vec<ZoneNotice>,
    history_limit: usize,
}

impl Default for DestinationZoneRegistry {
    fn default() -> Self {
        Self {
            zones: BTreeMap::new(),
            next_id: 0,
            current: None,
            scheduler: FrameScheduler::new(),
            notices: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl DestinationZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_history_limit(&mut self, limit: usize) {
        self.history_limit = limit;
        self.trim_notices();
    }

    fn trim_notices(&mut self) {
        let excess = self.notices.len().saturating_sub(self.history_limit);
        self.notices.drain(..excess);
    }

    pub fn add_zone(&mut self, config: ZoneConfig) -> ZoneId {
        let id = ZoneId(self.next_id);
        self.next_id += 1;
        self.zones.insert(id, DestinationZone::new(id, config));
        id
    }

    pub fn zone(&self, id: ZoneId) -> Option<&DestinationZone> {
        self.zones.get(&id)
    }

    pub fn zones(&self) -> impl Iterator<Item = &DestinationZone> {
        self.zones.values()
    }

    pub fn current(&self) -> Option<ZoneId> {
        self.current
    }

    /// Whether an enabled zone owns this scene target.
    pub fn claims(&self, target: TargetHandle) -> bool {
        self.zones
            .values()
            .any(|zone| zone.is_enabled() && zone.config().target == target)
    }

    /// Register the zone's emitter now and schedule its subscriptions for `frame + 1`.
    pub fn enable(&mut self, id: ZoneId, bus: &mut MarkerBus, frame: u64) -> Result<()> {
        let zone = self.zones.get_mut(&id).ok_or(TargetingError::UnknownZone(id))?;
        if zone.is_enabled() {
            return Ok(());
        }
        let emitter = bus.register_emitter(EmitterOwner::Zone(id));
        zone.enable(emitter);
        zone.pending_subscribe = Some(self.scheduler.schedule(frame + 1, ZoneTask::Subscribe(id)));
        zone_log!(DEBUG, "{:?} enabled as {:?}", id, emitter);
        self.on_emitter_added(emitter, bus);
        Ok(())
    }

    /// Unsubscribe the zone from everything and everything from it.
    pub fn disable(&mut self, id: ZoneId, bus: &mut MarkerBus) -> Result<Vec<ZoneEffect>> {
        let zone = self.zones.get_mut(&id).ok_or(TargetingError::UnknownZone(id))?;
        if let Some(handle) = zone.pending_subscribe.take() {
            self.scheduler.cancel(handle);
        }
        let removed = bus.unsubscribe_all(Subscriber::Zone(id));
        if let Some(emitter) = zone.emitter {
            bus.remove_emitter(emitter);
        }
        let effects = zone.disable();
        if self.current == Some(id) {
            self.current = None;
        }
        zone_log!(DEBUG, "{:?} disabled, dropped {} subscriptions", id, removed);
        Ok(effects)
    }

    /// Subscribe already-listening zones to a freshly registered emitter.
    pub fn on_emitter_added(&mut self, emitter: EmitterId, bus: &mut MarkerBus) {
        for zone in self.zones.values() {
            if zone.is_enabled() && zone.pending_subscribe.is_none() && zone.emitter != Some(emitter) {
                bus.subscribe(Subscriber::Zone(zone.id()), emitter, MarkerKinds::all());
            }
        }
    }

    /// Run the subscription tasks due on `frame`.
    pub fn run_due(&mut self, frame: u64, bus: &mut MarkerBus) {
        for task in self.scheduler.take_due(frame) {
            match task {
                ZoneTask::Subscribe(id) => self.subscribe_zone(id, bus),
            }
        }
    }

    fn subscribe_zone(&mut self, id: ZoneId, bus: &mut MarkerBus) {
        let Some(zone) = self.zones.get_mut(&id) else {
            return;
        };
        zone.pending_subscribe = None;
        let own = zone.emitter;
        let others: Vec<EmitterId> = bus
            .emitters()
            .map(|(emitter, _)| emitter)
            .filter(|emitter| Some(*emitter) != own)
            .collect();
        for emitter in &others {
            bus.subscribe(Subscriber::Zone(id), *emitter, MarkerKinds::all());
        }
        zone_log!(DEBUG, "{:?} subscribed to {} emitters", id, others.len());
    }

    pub fn handle_event(
        &mut self,
        id: ZoneId,
        event: &MarkerEvent,
        headset: Quaternion<f32>,
    ) -> Vec<ZoneEffect> {
        // Snapped re-emits are for observers; selection already reset the other zones.
        if event.kind == MarkerEventKind::Set && self.is_zone_emitter(event.emitter) {
            return Vec::new();
        }
        let Some(zone) = self.zones.get_mut(&id) else {
            return Vec::new();
        };
        if !zone.is_enabled() {
            return Vec::new();
        }
        let effects = match event.kind {
            MarkerEventKind::Enter => zone.on_enter(event, headset, &mut self.notices),
            MarkerEventKind::Exit => zone.on_exit(event, &mut self.notices),
            MarkerEventKind::Set => {
                let mut effects = Vec::new();
                if zone.on_set(event, headset, &mut self.notices, &mut effects) {
                    self.select(id);
                } else if self.current == Some(id) && !zone.is_selected() {
                    self.current = None;
                }
                effects
            }
        };
        self.trim_notices();
        effects
    }

    fn is_zone_emitter(&self, emitter: EmitterId) -> bool {
        self.zones.values().any(|zone| zone.emitter == Some(emitter))
    }

    fn select(&mut self, id: ZoneId) {
        if let Some(previous) = self.current.replace(id) {
            if previous != id {
                if let Some(zone) = self.zones.get_mut(&previous) {
                    if zone.is_selected() {
                        zone.reset(&mut self.notices);
                    }
                }
            }
        }
    }

    pub fn set_teleport_enabled(&mut self, id: ZoneId, enabled: bool) -> Result<()> {
        self.zones
            .get_mut(&id)
            .ok_or(TargetingError::UnknownZone(id))?
            .set_teleport_enabled(enabled);
        Ok(())
    }

    /// Per-frame lock flag comparison for every enabled zone.
    pub fn check_locks(&mut self) -> Vec<ZoneEffect> {
        let mut effects = Vec::new();
        for zone in self.zones.values_mut().filter(|zone| zone.is_enabled()) {
            effects.extend(zone.check_lock(&mut self.notices));
            if self.current == Some(zone.id()) && !zone.is_selected() {
                self.current = None;
            }
        }
        self.trim_notices();
        effects
    }

    pub fn take_notices(&mut self) -> Vec<ZoneNotice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        marker::{DestinationEvent, SourceIndex},
        pointer::PointerId,
        scene::RaycastHit,
        zones::ZoneNotification,
    };
    use cgmath::vec3;

    fn identity() -> Quaternion<f32> {
        Quaternion::new(1.0, 0.0, 0.0, 0.0)
    }

    fn set_on(emitter: EmitterId, target: u64) -> MarkerEvent {
        let hit = RaycastHit {
            point: vec3(0.0, 0.0, -2.0),
            normal: vec3(0.0, 1.0, 0.0),
            target: TargetHandle(target),
            distance: 2.0,
        };
        MarkerEvent {
            emitter,
            kind: MarkerEventKind::Set,
            payload: DestinationEvent::from_hit(&hit, hit.point, SourceIndex(0), true),
        }
    }

    #[test]
    fn test_subscription_is_deferred_one_frame() {
        let mut bus = MarkerBus::new();
        let pointer = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let mut registry = DestinationZoneRegistry::new();
        let zone = registry.add_zone(ZoneConfig::new(TargetHandle(1), vec3(0.0, 0.0, 0.0)));

        registry.enable(zone, &mut bus, 0).expect("enable");
        assert!(!bus.is_subscribed(Subscriber::Zone(zone), pointer, MarkerEventKind::Enter));

        registry.run_due(1, &mut bus);
        assert!(bus.is_subscribed(Subscriber::Zone(zone), pointer, MarkerEventKind::Enter));
        assert!(bus.is_subscribed(Subscriber::Zone(zone), pointer, MarkerEventKind::Set));
    }

    #[test]
    fn test_zones_subscribe_to_each_other_but_not_themselves() {
        let mut bus = MarkerBus::new();
        let mut registry = DestinationZoneRegistry::new();
        let a = registry.add_zone(ZoneConfig::new(TargetHandle(1), vec3(0.0, 0.0, 0.0)));
        let b = registry.add_zone(ZoneConfig::new(TargetHandle(2), vec3(0.0, 0.0, 0.0)));

        registry.enable(a, &mut bus, 0).expect("enable a");
        registry.run_due(1, &mut bus);
        registry.enable(b, &mut bus, 1).expect("enable b");
        registry.run_due(2, &mut bus);

        let emitter_a = registry.zone(a).and_then(|z| z.emitter()).expect("a emitter");
        let emitter_b = registry.zone(b).and_then(|z| z.emitter()).expect("b emitter");
        assert!(bus.is_subscribed(Subscriber::Zone(a), emitter_b, MarkerEventKind::Set));
        assert!(bus.is_subscribed(Subscriber::Zone(b), emitter_a, MarkerEventKind::Set));
        assert!(!bus.is_subscribed(Subscriber::Zone(a), emitter_a, MarkerEventKind::Set));
    }

    #[test]
    fn test_disable_before_subscription_cancels_task() {
        let mut bus = MarkerBus::new();
        bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let mut registry = DestinationZoneRegistry::new();
        let zone = registry.add_zone(ZoneConfig::default());
        registry.enable(zone, &mut bus, 0).expect("enable");
        registry.disable(zone, &mut bus).expect("disable");
        registry.run_due(1, &mut bus);
        assert_eq!(bus.subscription_count(Subscriber::Zone(zone)), 0);
    }

    #[test]
    fn test_disable_twice_is_harmless() {
        let mut bus = MarkerBus::new();
        let mut registry = DestinationZoneRegistry::new();
        let zone = registry.add_zone(ZoneConfig::default());
        registry.enable(zone, &mut bus, 0).expect("enable");
        registry.run_due(1, &mut bus);
        assert!(registry.disable(zone, &mut bus).is_ok());
        assert!(registry.disable(zone, &mut bus).expect("second disable").is_empty());
    }

    #[test]
    fn test_only_one_current_zone() {
        let mut bus = MarkerBus::new();
        let pointer = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let mut registry = DestinationZoneRegistry::new();
        let a = registry.add_zone(ZoneConfig::new(TargetHandle(1), vec3(1.0, 0.0, 0.0)));
        let b = registry.add_zone(ZoneConfig::new(TargetHandle(2), vec3(2.0, 0.0, 0.0)));
        registry.enable(a, &mut bus, 0).expect("enable a");
        registry.enable(b, &mut bus, 0).expect("enable b");
        registry.run_due(1, &mut bus);

        for target in [1, 2, 1, 2, 2] {
            let event = set_on(pointer, target);
            for zone in [a, b] {
                registry.handle_event(zone, &event, identity());
            }
            let selected = registry.zones().filter(|z| z.is_selected()).count();
            assert_eq!(selected, 1);
        }
        assert_eq!(registry.current(), Some(b));
        assert!(registry
            .take_notices()
            .iter()
            .any(|n| n.zone == a && n.notification == ZoneNotification::Reset));
    }

    #[test]
    fn test_snapped_set_from_another_zone_keeps_selection() {
        let mut bus = MarkerBus::new();
        let pointer = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let mut registry = DestinationZoneRegistry::new();
        let a = registry.add_zone(ZoneConfig::new(TargetHandle(1), vec3(1.0, 0.0, 0.0)));
        let b = registry.add_zone(ZoneConfig::new(TargetHandle(2), vec3(2.0, 0.0, 0.0)));
        registry.enable(a, &mut bus, 0).expect("enable a");
        registry.enable(b, &mut bus, 0).expect("enable b");
        registry.run_due(1, &mut bus);

        let first = set_on(pointer, 1);
        for zone in [a, b] {
            registry.handle_event(zone, &first, identity());
        }
        let second = set_on(pointer, 2);
        for zone in [a, b] {
            registry.handle_event(zone, &second, identity());
        }
        assert_eq!(registry.current(), Some(b));

        // a's snapped re-emit of the first Set arrives late.
        let emitter_a = registry.zone(a).and_then(|z| z.emitter()).expect("a emitter");
        let effects = registry.handle_event(b, &set_on(emitter_a, 1), identity());
        assert!(effects.is_empty());
        assert_eq!(registry.current(), Some(b));
        assert!(registry.zone(b).expect("zone b").is_selected());
    }

    #[test]
    fn test_disabling_current_zone_clears_reference() {
        let mut bus = MarkerBus::new();
        let pointer = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let mut registry = DestinationZoneRegistry::new();
        let a = registry.add_zone(ZoneConfig::new(TargetHandle(1), vec3(0.0, 0.0, 0.0)));
        registry.enable(a, &mut bus, 0).expect("enable");
        registry.run_due(1, &mut bus);
        registry.handle_event(a, &set_on(pointer, 1), identity());
        assert_eq!(registry.current(), Some(a));

        registry.disable(a, &mut bus).expect("disable");
        assert_eq!(registry.current(), None);
        assert!(!registry.claims(TargetHandle(1)));
    }

    #[test]
    fn test_unknown_zone_is_an_error() {
        let mut bus = MarkerBus::new();
        let mut registry = DestinationZoneRegistry::new();
        assert!(matches!(
            registry.enable(ZoneId(9), &mut bus, 0),
            Err(TargetingError::UnknownZone(ZoneId(9)))
        ));
    }
}
