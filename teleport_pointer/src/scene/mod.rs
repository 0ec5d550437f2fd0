//! Scene geometry queries consumed by the beam projectors.
//!
//! The core only ever asks "what does this ray hit first"; results are never
//! cached across frames.

pub mod primitive;
pub mod rapier;

use bitflags::bitflags;
use cgmath::Vector3;
use serde::{Deserialize, Serialize};

pub use primitive::{PrimitiveScene, PrimitiveShape};
pub use rapier::RapierScene;

/// Opaque reference to a scene node that a ray can hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetHandle(pub u64);

bitflags! {
    /// Layers a raycast is allowed to hit.
    pub struct LayerMask: u32 {
        const DEFAULT = 0b0001;
        const FLOOR = 0b0010;
        const DESTINATION_ZONE = 0b0100;
        const IGNORE_RAYCAST = 0b1000;
        const ALL = u32::MAX;
    }
}

impl LayerMask {
    /// Everything except the ignore-raycast layer.
    pub fn raycast_default() -> Self {
        LayerMask::ALL - LayerMask::IGNORE_RAYCAST
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::raycast_default()
    }
}

/// First surface hit by a ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    pub point: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub target: TargetHandle,
    pub distance: f32,
}

pub trait SceneGeometry {
    /// Cast a ray from `origin` along the normalized `direction`.
    ///
    /// `max_distance` may be `f32::INFINITY`. Returns the nearest hit on any
    /// layer in `layer_mask`.
    fn cast(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        layer_mask: LayerMask,
    ) -> Option<RaycastHit>;
}

impl<T: SceneGeometry + ?Sized> SceneGeometry for &T {
    fn cast(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        layer_mask: LayerMask,
    ) -> Option<RaycastHit> {
        (**self).cast(origin, direction, max_distance, layer_mask)
    }
}

impl<T: SceneGeometry + ?Sized> SceneGeometry for Box<T> {
    fn cast(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        layer_mask: LayerMask,
    ) -> Option<RaycastHit> {
        (**self).cast(origin, direction, max_distance, layer_mask)
    }
}
