use cgmath::InnerSpace;

use super::{identity_rotation, BeamProjector, CursorPose, PointerPose, Projection};
use crate::{beam_log, config::StraightBeamConfig, scene::SceneGeometry};

/// Single forward cast; the hit is the destination.
#[derive(Clone, Debug, Default)]
pub struct StraightBeamProjector {
    config: StraightBeamConfig,
}

impl StraightBeamProjector {
    pub fn new(config: StraightBeamConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StraightBeamConfig {
        &self.config
    }
}

impl BeamProjector for StraightBeamProjector {
    fn project(&mut self, pose: &PointerPose, scene: &dyn SceneGeometry) -> Projection {
        let origin = pose.position;
        let direction = pose.forward().normalize();
        let hit = scene.cast(
            origin,
            direction,
            self.config.maximum_length,
            self.config.layers(),
        );
        let end = hit
            .map(|hit| hit.point)
            .unwrap_or(origin + direction * self.config.maximum_length);
        beam_log!(TRACE, "straight beam end={:?} hit={:?}", end, hit.map(|h| h.target));

        Projection {
            destination: hit,
            curve: vec![origin, end],
            cursor: CursorPose {
                position: end,
                rotation: identity_rotation(),
            },
        }
    }
}
