//! Beam projection strategies and the rendering seam.
//!
//! A projector turns the pointer pose into a destination hit plus the points of
//! the beam to draw. The activation controller does not care which projector a
//! pointer uses.

pub mod curved;
pub mod render;
pub mod straight;

pub use curved::{height_limited_length, CurvedBeamProjector};
pub use render::{BeamRenderer, LineBeamRenderer, NullRenderer, RenderConfig};
pub use straight::StraightBeamProjector;

use cgmath::{vec3, InnerSpace, Quaternion, Vector3};

use crate::{
    config::BeamKind,
    scene::{RaycastHit, SceneGeometry},
};

/// Nudge applied to the forward cast result so the downward cast starts just
/// in front of, and above, the surface it hit.
pub const BEAM_ADJUST_OFFSET: f32 = 0.00001;

/// World-space pose of the pointing hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerPose {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl PointerPose {
    pub fn new(position: Vector3<f32>, rotation: Quaternion<f32>) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` whose forward axis points along `forward`.
    pub fn looking(position: Vector3<f32>, forward: Vector3<f32>) -> Self {
        let rotation = Quaternion::from_arc(vec3(0.0, 0.0, -1.0), forward.normalize(), None);
        Self { position, rotation }
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.rotation * vec3(0.0, 0.0, -1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorPose {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

/// Result of one projection frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub destination: Option<RaycastHit>,
    pub curve: Vec<Vector3<f32>>,
    pub cursor: CursorPose,
}

pub trait BeamProjector {
    fn project(&mut self, pose: &PointerPose, scene: &dyn SceneGeometry) -> Projection;

    /// Forget state carried between frames, called when the beam turns off.
    fn reset(&mut self) {}
}

pub fn projector_for(kind: &BeamKind) -> Box<dyn BeamProjector> {
    match kind {
        BeamKind::Straight(config) => Box::new(StraightBeamProjector::new(config.clone())),
        BeamKind::Curved(config) => Box::new(CurvedBeamProjector::new(config.clone())),
    }
}

pub(crate) fn identity_rotation() -> Quaternion<f32> {
    Quaternion::new(1.0, 0.0, 0.0, 0.0)
}
