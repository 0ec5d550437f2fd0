//! A pointer is one hand's beam: activation state machine, beam projector,
//! renderer, and the validity checks consulted for its destinations.

pub mod activation;
pub mod use_action;
pub mod validity;

pub use activation::{
    ActivationSignal, Hover, PointerActivationController, PointerContext, PointerState,
};
pub use use_action::{UsableObject, UseActionRegistry, UseActionTarget};
pub use validity::{
    DestinationChecks, DestinationValidator, InvalidTargetList, NavArea, NavigationCheck,
    PlayAreaCollision,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    beam::{projector_for, BeamProjector, BeamRenderer, PointerPose},
    config::{BeamColors, PointerConfig},
    marker::{EmitterId, MarkerBus},
    scene::SceneGeometry,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PointerId(pub(crate) u32);

pub struct Pointer {
    id: PointerId,
    controller: PointerActivationController,
    projector: Box<dyn BeamProjector>,
    renderer: Box<dyn BeamRenderer>,
    checks: DestinationChecks,
    colors: BeamColors,
    cursor_hidden: bool,
}

impl Pointer {
    pub fn new(
        id: PointerId,
        emitter: EmitterId,
        config: &PointerConfig,
        renderer: Box<dyn BeamRenderer>,
    ) -> Self {
        Self::with_projector(id, emitter, config, projector_for(&config.beam), renderer)
    }

    pub fn with_projector(
        id: PointerId,
        emitter: EmitterId,
        config: &PointerConfig,
        projector: Box<dyn BeamProjector>,
        mut renderer: Box<dyn BeamRenderer>,
    ) -> Self {
        renderer.set_visible(false);
        Self {
            id,
            controller: PointerActivationController::new(
                id,
                emitter,
                config.source_index,
                config.activation.clone(),
            ),
            projector,
            renderer,
            checks: DestinationChecks::default(),
            colors: config.colors,
            cursor_hidden: false,
        }
    }

    pub fn with_checks(mut self, checks: DestinationChecks) -> Self {
        self.checks = checks;
        self
    }

    pub fn id(&self) -> PointerId {
        self.id
    }

    pub fn controller(&self) -> &PointerActivationController {
        &self.controller
    }

    pub fn checks(&self) -> &DestinationChecks {
        &self.checks
    }

    pub fn set_checks(&mut self, checks: DestinationChecks) {
        self.checks = checks;
    }

    pub fn is_cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    pub fn handle_signal(
        &mut self,
        signal: ActivationSignal,
        now: Duration,
        bus: &mut MarkerBus,
        usables: &mut UseActionRegistry,
    ) -> bool {
        let was_active = self.controller.is_active();
        let mut ctx = PointerContext {
            now,
            bus,
            usables,
            checks: &self.checks,
        };
        let handled = self.controller.handle_signal(signal, &mut ctx);
        self.sync_visibility(was_active);
        handled
    }

    /// Recompute the beam for this frame and hand the hover result to the controller.
    pub fn project(
        &mut self,
        pose: &PointerPose,
        scene: &dyn SceneGeometry,
        now: Duration,
        bus: &mut MarkerBus,
        usables: &mut UseActionRegistry,
    ) {
        if !self.controller.is_active() {
            return;
        }
        let projection = self.projector.project(pose, scene);
        let mut ctx = PointerContext {
            now,
            bus,
            usables,
            checks: &self.checks,
        };
        self.controller
            .update_hover(projection.destination.map(Hover::new), &mut ctx);

        let valid = self
            .controller
            .hover()
            .map_or(false, |hover| {
                self.checks
                    .allow_teleport(Some(hover.target()), hover.destination_position)
            });
        self.renderer.set_curve_points(&projection.curve);
        self.renderer
            .set_cursor_transform(projection.cursor.position, projection.cursor.rotation);
        self.renderer.set_beam_color(if valid {
            self.colors.valid
        } else {
            self.colors.invalid
        });
    }

    /// Force the beam off, publishing Exit for whatever it was hovering.
    pub fn deactivate(&mut self, now: Duration, bus: &mut MarkerBus, usables: &mut UseActionRegistry) {
        let was_active = self.controller.is_active();
        let mut ctx = PointerContext {
            now,
            bus,
            usables,
            checks: &self.checks,
        };
        self.controller.turn_off(&mut ctx);
        self.sync_visibility(was_active);
    }

    pub fn set_cursor_hidden(&mut self, hidden: bool) {
        if self.cursor_hidden != hidden {
            self.cursor_hidden = hidden;
            self.renderer.set_cursor_visible(!hidden);
        }
    }

    fn sync_visibility(&mut self, was_active: bool) {
        let active = self.controller.is_active();
        if active == was_active {
            return;
        }
        self.renderer.set_visible(active);
        if !active {
            self.projector.reset();
            self.set_cursor_hidden(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        beam::LineBeamRenderer,
        marker::{EmitterOwner, SourceIndex},
        scene::{PrimitiveScene, TargetHandle},
    };
    use cgmath::vec3;
    use std::{cell::RefCell, rc::Rc};

    #[test]
    fn test_pointer_renders_valid_beam_while_active() {
        let mut bus = MarkerBus::new();
        let mut usables = UseActionRegistry::new();
        let emitter = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let renderer = Rc::new(RefCell::new(LineBeamRenderer::default()));
        let config = PointerConfig::for_source(SourceIndex(0));
        let mut pointer = Pointer::new(PointerId(0), emitter, &config, Box::new(renderer.clone()));

        let mut scene = PrimitiveScene::new();
        scene.add_floor(TargetHandle(1), 0.0);
        let pose = PointerPose::looking(vec3(0.0, 1.5, 0.0), vec3(0.0, 0.0, -1.0));

        pointer.project(&pose, &scene, Duration::ZERO, &mut bus, &mut usables);
        assert!(!renderer.borrow().visible);

        pointer.handle_signal(ActivationSignal::On, Duration::ZERO, &mut bus, &mut usables);
        pointer.project(&pose, &scene, Duration::ZERO, &mut bus, &mut usables);
        {
            let rendered = renderer.borrow();
            assert!(rendered.visible);
            assert_eq!(rendered.color, config.colors.valid);
            assert_eq!(rendered.segments.len(), 9);
        }

        pointer.deactivate(Duration::ZERO, &mut bus, &mut usables);
        assert!(!renderer.borrow().visible);
        assert!(pointer.controller().hover().is_none());
    }

    #[test]
    fn test_invalid_destination_uses_invalid_color() {
        let mut bus = MarkerBus::new();
        let mut usables = UseActionRegistry::new();
        let emitter = bus.register_emitter(EmitterOwner::Pointer(PointerId(0)));
        let renderer = Rc::new(RefCell::new(LineBeamRenderer::default()));
        let config = PointerConfig::for_source(SourceIndex(0));
        let mut pointer = Pointer::new(PointerId(0), emitter, &config, Box::new(renderer.clone()))
            .with_checks(
                DestinationChecks::new().with_validator(InvalidTargetList::new([TargetHandle(1)])),
            );

        let mut scene = PrimitiveScene::new();
        scene.add_floor(TargetHandle(1), 0.0);
        let pose = PointerPose::looking(vec3(0.0, 1.5, 0.0), vec3(0.0, 0.0, -1.0));
        pointer.handle_signal(ActivationSignal::On, Duration::ZERO, &mut bus, &mut usables);
        pointer.project(&pose, &scene, Duration::ZERO, &mut bus, &mut usables);

        assert_eq!(renderer.borrow().color, config.colors.invalid);
    }
}
