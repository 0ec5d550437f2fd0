use std::time::Duration;

use cgmath::Vector3;

use super::{DestinationChecks, PointerId, UseActionRegistry};
use crate::{
    config::{ActivationConfig, ActivationMode},
    marker::{DestinationEvent, EmitterId, MarkerBus, MarkerEventKind, SourceIndex},
    pointer_log,
    scene::{RaycastHit, TargetHandle},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerState {
    Idle,
    Active,
}

/// Abstract input routed to one pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationSignal {
    On,
    Off,
    Confirm,
}

/// What the beam currently rests on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hover {
    pub hit: RaycastHit,
    pub destination_position: Vector3<f32>,
}

impl Hover {
    pub fn new(hit: RaycastHit) -> Self {
        Self {
            destination_position: hit.point,
            hit,
        }
    }

    pub fn target(&self) -> TargetHandle {
        self.hit.target
    }
}

/// Collaborators a controller needs for a single transition.
pub struct PointerContext<'a> {
    pub now: Duration,
    pub bus: &'a mut MarkerBus,
    pub usables: &'a mut UseActionRegistry,
    pub checks: &'a DestinationChecks,
}

/// Idle/active state machine of one pointer.
///
/// Owns the activation cooldown, the toggle counter, the hovered target and the
/// use action this pointer started. Every Enter/Exit/Set it produces is
/// published on the marker bus under its own emitter.
#[derive(Debug)]
pub struct PointerActivationController {
    pointer: PointerId,
    emitter: EmitterId,
    source_index: Option<SourceIndex>,
    config: ActivationConfig,
    state: PointerState,
    beam_enabled_state: u32,
    activate_deadline: Duration,
    hover: Option<Hover>,
    using: Option<TargetHandle>,
}

impl PointerActivationController {
    pub fn new(
        pointer: PointerId,
        emitter: EmitterId,
        source_index: Option<SourceIndex>,
        config: ActivationConfig,
    ) -> Self {
        Self {
            pointer,
            emitter,
            source_index,
            config,
            state: PointerState::Idle,
            beam_enabled_state: 0,
            activate_deadline: Duration::ZERO,
            hover: None,
            using: None,
        }
    }

    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    pub fn emitter(&self) -> EmitterId {
        self.emitter
    }

    pub fn source_index(&self) -> Option<SourceIndex> {
        self.source_index
    }

    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PointerState::Active
    }

    pub fn beam_enabled_state(&self) -> u32 {
        self.beam_enabled_state
    }

    pub fn hover(&self) -> Option<&Hover> {
        self.hover.as_ref()
    }

    pub fn using(&self) -> Option<TargetHandle> {
        self.using
    }

    pub fn activate_deadline(&self) -> Duration {
        self.activate_deadline
    }

    pub fn can_activate(&self, now: Duration) -> bool {
        now >= self.activate_deadline
    }

    /// True when an off request must be swallowed because the toggle button also
    /// confirms and more than one on request is still outstanding.
    pub fn invalid_constant_beam(&self) -> bool {
        self.config.mode == ActivationMode::Toggle
            && self.config.toggle_aliases_set
            && self.beam_enabled_state > 1
    }

    pub fn handle_signal(&mut self, signal: ActivationSignal, ctx: &mut PointerContext) -> bool {
        match signal {
            ActivationSignal::On => self.activate_on(ctx),
            ActivationSignal::Off => self.activate_off(ctx),
            ActivationSignal::Confirm => self.confirm(ctx),
        }
    }

    pub fn activate_on(&mut self, ctx: &mut PointerContext) -> bool {
        match (self.config.mode, self.state) {
            (ActivationMode::Toggle, PointerState::Active) if self.config.toggle_aliases_set => {
                self.beam_enabled_state += 1;
                pointer_log!(
                    DEBUG,
                    "{:?} toggle on request, {} outstanding",
                    self.pointer,
                    self.beam_enabled_state
                );
                true
            }
            (ActivationMode::Toggle, PointerState::Active) => self.turn_off(ctx),
            (ActivationMode::Toggle, PointerState::Idle) => {
                if self.turn_on(ctx.now) {
                    self.beam_enabled_state = 1;
                    true
                } else {
                    false
                }
            }
            (ActivationMode::Hold, _) => self.turn_on(ctx.now),
        }
    }

    pub fn activate_off(&mut self, ctx: &mut PointerContext) -> bool {
        if self.state == PointerState::Idle {
            return false;
        }
        if self.config.mode == ActivationMode::Toggle && !self.config.toggle_aliases_set {
            pointer_log!(TRACE, "{:?} toggle beam ignores release", self.pointer);
            return false;
        }
        if self.invalid_constant_beam() {
            self.beam_enabled_state -= 1;
            pointer_log!(
                DEBUG,
                "{:?} keeps beam on, {} outstanding",
                self.pointer,
                self.beam_enabled_state
            );
            return true;
        }
        self.turn_off(ctx)
    }

    /// Idle -> Active. Refused while unbound, already active, or cooling down.
    pub fn turn_on(&mut self, now: Duration) -> bool {
        if self.source_index.is_none() {
            pointer_log!(TRACE, "{:?} ignored activation: unbound", self.pointer);
            return false;
        }
        if self.state == PointerState::Active {
            return false;
        }
        if !self.can_activate(now) {
            pointer_log!(
                TRACE,
                "{:?} activation refused, cooling down until {:?}",
                self.pointer,
                self.activate_deadline
            );
            return false;
        }
        self.state = PointerState::Active;
        pointer_log!(DEBUG, "{:?} beam on", self.pointer);
        true
    }

    /// Active -> Idle. Does nothing, and keeps the deadline, when already idle.
    pub fn turn_off(&mut self, ctx: &mut PointerContext) -> bool {
        if self.state == PointerState::Idle {
            return false;
        }
        self.update_hover(None, ctx);
        self.stop_use_action(ctx.usables);
        self.state = PointerState::Idle;
        self.beam_enabled_state = 0;
        self.activate_deadline = ctx.now.saturating_add(self.config.activate_delay());
        pointer_log!(DEBUG, "{:?} beam off", self.pointer);
        true
    }

    /// Publish Set for the hovered destination when it may be teleported to.
    /// Always restarts the activation cooldown once processed.
    pub fn confirm(&mut self, ctx: &mut PointerContext) -> bool {
        if self.state != PointerState::Active || !self.can_activate(ctx.now) {
            return false;
        }
        self.activate_deadline = ctx.now.saturating_add(self.config.activate_delay());
        let Some(event) = self.destination_event(ctx.checks) else {
            pointer_log!(DEBUG, "{:?} confirm without a destination", self.pointer);
            return false;
        };
        if !event.allow_teleport {
            pointer_log!(DEBUG, "{:?} confirm on invalid destination", self.pointer);
            return false;
        }
        ctx.bus.publish(self.emitter, MarkerEventKind::Set, event);
        true
    }

    /// Apply this frame's projection result. Exit for the old target is always
    /// published before Enter for the new one; an unchanged target only refreshes
    /// the stored hit.
    pub fn update_hover(&mut self, next: Option<Hover>, ctx: &mut PointerContext) {
        let previous_target = self.hover.map(|hover| hover.target());
        let next_target = next.map(|hover| hover.target());

        if previous_target == next_target {
            self.hover = next;
            return;
        }

        if previous_target.is_some() {
            if let Some(event) = self.destination_event(ctx.checks) {
                ctx.bus.publish(self.emitter, MarkerEventKind::Exit, event);
            }
            self.stop_use_action(ctx.usables);
        }

        self.hover = next;

        if let Some(hover) = next {
            if let Some(event) = self.destination_event(ctx.checks) {
                ctx.bus.publish(self.emitter, MarkerEventKind::Enter, event);
            }
            self.start_use_action(hover.target(), ctx.usables);
        }
    }

    pub fn destination_event(&self, checks: &DestinationChecks) -> Option<DestinationEvent> {
        let hover = self.hover?;
        let source_index = self.source_index?;
        let allow_teleport =
            checks.allow_teleport(Some(hover.target()), hover.destination_position);
        Some(DestinationEvent::from_hit(
            &hover.hit,
            hover.destination_position,
            source_index,
            allow_teleport,
        ))
    }

    fn start_use_action(&mut self, target: TargetHandle, usables: &mut UseActionRegistry) {
        if !self.config.activate_use_on_contact {
            return;
        }
        let Some(source_index) = self.source_index else {
            return;
        };
        if let Some(usable) = usables.get_mut(target) {
            if usable.activates_on_pointer_contact() {
                usable.start_using(source_index);
                self.using = Some(target);
                pointer_log!(DEBUG, "{:?} started using {:?}", self.pointer, target);
            }
        }
    }

    fn stop_use_action(&mut self, usables: &mut UseActionRegistry) {
        let Some(target) = self.using.take() else {
            return;
        };
        if let (Some(usable), Some(source_index)) = (usables.get_mut(target), self.source_index) {
            usable.stop_using(source_index);
            pointer_log!(DEBUG, "{:?} stopped using {:?}", self.pointer, target);
        }
    }
}
