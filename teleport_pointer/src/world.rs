use std::collections::BTreeMap;

use crate::{
    beam::{BeamRenderer, PointerPose},
    config::{PointerConfig, TargetingConfig, ZoneConfig},
    error::{Result, TargetingError},
    marker::{
        EmitterOwner, MarkerBus, MarkerEvent, MarkerEventKind, MarkerKinds, SourceIndex,
        Subscriber,
    },
    pointer::{ActivationSignal, DestinationChecks, Pointer, PointerId, UseActionRegistry},
    pointer_log,
    scene::SceneGeometry,
    teleport::TeleportExecutor,
    time::Time,
    zones::{DestinationZoneRegistry, ZoneEffect, ZoneId, ZoneNotice},
};

/// Abstract input for one frame, already mapped from device buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputSignal {
    ActivateBeamOn(SourceIndex),
    ActivateBeamOff(SourceIndex),
    ConfirmDestination(SourceIndex),
}

impl InputSignal {
    pub fn source(&self) -> SourceIndex {
        match *self {
            InputSignal::ActivateBeamOn(source)
            | InputSignal::ActivateBeamOff(source)
            | InputSignal::ConfirmDestination(source) => source,
        }
    }

    fn activation(&self) -> ActivationSignal {
        match self {
            InputSignal::ActivateBeamOn(_) => ActivationSignal::On,
            InputSignal::ActivateBeamOff(_) => ActivationSignal::Off,
            InputSignal::ConfirmDestination(_) => ActivationSignal::Confirm,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameInput {
    pub time: Time,
    pub signals: Vec<InputSignal>,
    pub poses: BTreeMap<SourceIndex, PointerPose>,
}

impl FrameInput {
    pub fn new(time: Time) -> Self {
        Self {
            time,
            ..Default::default()
        }
    }

    pub fn with_signal(mut self, signal: InputSignal) -> Self {
        self.signals.push(signal);
        self
    }

    pub fn with_pose(mut self, source: SourceIndex, pose: PointerPose) -> Self {
        self.poses.insert(source, pose);
        self
    }
}

/// Owns the marker bus, pointers, zones, scene geometry and executor, and runs
/// them once per frame.
pub struct TargetingWorld<G: SceneGeometry, X: TeleportExecutor> {
    scene: G,
    executor: X,
    bus: MarkerBus,
    pointers: BTreeMap<PointerId, Pointer>,
    next_pointer: u32,
    zones: DestinationZoneRegistry,
    usables: UseActionRegistry,
    frame: u64,
    time: Time,
}

impl<G: SceneGeometry, X: TeleportExecutor> TargetingWorld<G, X> {
    pub fn new(scene: G, executor: X) -> Self {
        Self {
            scene,
            executor,
            bus: MarkerBus::new(),
            pointers: BTreeMap::new(),
            next_pointer: 0,
            zones: DestinationZoneRegistry::new(),
            usables: UseActionRegistry::new(),
            frame: 0,
            time: Time::default(),
        }
    }

    /// Build a world with every configured pointer added and every zone enabled.
    pub fn from_config(
        config: &TargetingConfig,
        scene: G,
        executor: X,
        mut renderer_for: impl FnMut(&PointerConfig) -> Box<dyn BeamRenderer>,
    ) -> Result<Self> {
        config.validate()?;
        let mut world = Self::new(scene, executor);
        for pointer in &config.pointers {
            world.add_pointer(pointer, renderer_for(pointer));
        }
        for zone in &config.zones {
            let id = world.add_zone(zone.clone());
            world.enable_zone(id)?;
        }
        Ok(world)
    }

    pub fn add_pointer(&mut self, config: &PointerConfig, renderer: Box<dyn BeamRenderer>) -> PointerId {
        let id = PointerId(self.next_pointer);
        self.next_pointer += 1;
        let emitter = self.bus.register_emitter(EmitterOwner::Pointer(id));
        self.bus
            .subscribe(Subscriber::TeleportRouter, emitter, MarkerKinds::SET);
        self.zones.on_emitter_added(emitter, &mut self.bus);

        if config.source_index.is_none() {
            let error = TargetingError::UnboundPointer { pointer: id };
            pointer_log!(ERROR, "{}", error);
        }
        self.pointers
            .insert(id, Pointer::new(id, emitter, config, renderer));
        id
    }

    /// Turn the pointer off (publishing its final Exit), deliver pending events,
    /// then drop it and all subscriptions to it.
    pub fn remove_pointer(&mut self, id: PointerId) -> Result<Pointer> {
        let pointer = self
            .pointers
            .get_mut(&id)
            .ok_or(TargetingError::UnknownPointer(id))?;
        pointer.deactivate(self.time.total, &mut self.bus, &mut self.usables);
        self.dispatch();

        let pointer = self
            .pointers
            .remove(&id)
            .ok_or(TargetingError::UnknownPointer(id))?;
        self.bus.remove_emitter(pointer.controller().emitter());
        pointer_log!(DEBUG, "{:?} removed", id);
        Ok(pointer)
    }

    pub fn pointer(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers.get(&id)
    }

    pub fn pointers(&self) -> impl Iterator<Item = &Pointer> {
        self.pointers.values()
    }

    pub fn set_pointer_checks(&mut self, id: PointerId, checks: DestinationChecks) -> Result<()> {
        self.pointers
            .get_mut(&id)
            .ok_or(TargetingError::UnknownPointer(id))?
            .set_checks(checks);
        Ok(())
    }

    /// One error per pointer that can never activate.
    pub fn binding_errors(&self) -> Vec<TargetingError> {
        self.pointers
            .values()
            .filter(|pointer| pointer.controller().source_index().is_none())
            .map(|pointer| TargetingError::UnboundPointer {
                pointer: pointer.id(),
            })
            .collect()
    }

    pub fn add_zone(&mut self, config: ZoneConfig) -> ZoneId {
        self.zones.add_zone(config)
    }

    pub fn enable_zone(&mut self, id: ZoneId) -> Result<()> {
        self.zones.enable(id, &mut self.bus, self.frame)
    }

    pub fn disable_zone(&mut self, id: ZoneId) -> Result<()> {
        let effects = self.zones.disable(id, &mut self.bus)?;
        self.apply_zone_effects(effects);
        Ok(())
    }

    pub fn set_zone_teleport_enabled(&mut self, id: ZoneId, enabled: bool) -> Result<()> {
        self.zones.set_teleport_enabled(id, enabled)
    }

    pub fn zones(&self) -> &DestinationZoneRegistry {
        &self.zones
    }

    pub fn usables_mut(&mut self) -> &mut UseActionRegistry {
        &mut self.usables
    }

    pub fn scene(&self) -> &G {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut G {
        &mut self.scene
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut X {
        &mut self.executor
    }

    pub fn bus(&self) -> &MarkerBus {
        &self.bus
    }

    /// Cap the recorded event and zone notice histories. 0 stops recording.
    pub fn set_history_limit(&mut self, limit: usize) {
        self.bus.set_history_limit(limit);
        self.zones.set_history_limit(limit);
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn tick(&mut self, input: FrameInput) {
        self.frame += 1;
        self.time = input.time;
        self.zones.run_due(self.frame, &mut self.bus);

        let now = self.time.total;
        for signal in &input.signals {
            let source = signal.source();
            for pointer in self
                .pointers
                .values_mut()
                .filter(|pointer| pointer.controller().source_index() == Some(source))
            {
                pointer.handle_signal(signal.activation(), now, &mut self.bus, &mut self.usables);
            }
        }

        for pointer in self.pointers.values_mut() {
            let pose = pointer
                .controller()
                .source_index()
                .and_then(|source| input.poses.get(&source));
            if let Some(pose) = pose {
                pointer.project(pose, &self.scene, now, &mut self.bus, &mut self.usables);
            }
        }

        self.dispatch();

        let effects = self.zones.check_locks();
        self.apply_zone_effects(effects);
    }

    /// Events delivered so far, in delivery order.
    pub fn take_dispatched(&mut self) -> Vec<MarkerEvent> {
        self.bus.take_dispatched()
    }

    pub fn take_zone_notices(&mut self) -> Vec<ZoneNotice> {
        self.zones.take_notices()
    }

    fn dispatch(&mut self) {
        while let Some((event, subscribers)) = self.bus.next_event() {
            for subscriber in subscribers {
                match subscriber {
                    Subscriber::Zone(zone) => {
                        let headset = self.executor.headset_rotation();
                        let effects = self.zones.handle_event(zone, &event, headset);
                        self.apply_zone_effects(effects);
                    }
                    Subscriber::TeleportRouter => self.route_teleport(&event),
                }
            }
        }
    }

    /// Pointer Sets that no zone claims teleport straight to the destination.
    fn route_teleport(&mut self, event: &MarkerEvent) {
        if event.kind != MarkerEventKind::Set || !event.payload.allow_teleport {
            return;
        }
        if !matches!(self.bus.owner(event.emitter), Some(EmitterOwner::Pointer(_))) {
            return;
        }
        if event
            .payload
            .target
            .map_or(false, |target| self.zones.claims(target))
        {
            return;
        }
        self.executor.confirm_teleport(
            event.payload.destination_position,
            event.payload.destination_rotation,
        );
    }

    fn apply_zone_effects(&mut self, effects: Vec<ZoneEffect>) {
        for effect in effects {
            match effect {
                ZoneEffect::SetProspective { position, rotation } => {
                    self.executor.set_prospective_destination(position, rotation)
                }
                ZoneEffect::ClearProspective => self.executor.clear_prospective_destination(),
                ZoneEffect::Confirm { position, rotation } => {
                    self.executor.confirm_teleport(position, rotation)
                }
                ZoneEffect::Publish {
                    emitter,
                    kind,
                    payload,
                } => self.bus.publish(emitter, kind, payload),
                ZoneEffect::PointerCursor { emitter, hidden } => {
                    if let Some(EmitterOwner::Pointer(id)) = self.bus.owner(emitter) {
                        if let Some(pointer) = self.pointers.get_mut(&id) {
                            pointer.set_cursor_hidden(hidden);
                        }
                    }
                }
            }
        }
    }
}
