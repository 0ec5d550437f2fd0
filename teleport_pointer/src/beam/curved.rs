use cgmath::{vec3, InnerSpace, Quaternion, Vector3};

use super::{
    identity_rotation, BeamProjector, CursorPose, PointerPose, Projection, BEAM_ADJUST_OFFSET,
};
use crate::{
    beam_log,
    config::CurvedBeamConfig,
    curve::{CurveControlPoints, CurveSampler},
    scene::{RaycastHit, SceneGeometry},
};

/// Height above an early-collision point the corrective downward cast starts from.
const EARLY_COLLISION_LIFT: f32 = 0.01;

/// Probes stop this short of the next sample so the floor contact itself is not
/// reported as an obstacle.
const SEGMENT_END_TOLERANCE: f32 = 0.001;

/// Forward cast length once the pointer is raised above the height limit.
///
/// `vertical_alignment` is the dot product of the pointer forward with world up
/// and `height_limit_angle` is a percentage in `[0, 100]`. Above the limit the
/// length falls off quadratically.
pub fn height_limited_length(
    maximum_length: f32,
    vertical_alignment: f32,
    height_limit_angle: f32,
) -> f32 {
    let limit = height_limit_angle.clamp(0.0, 100.0);
    if vertical_alignment * 100.0 <= limit {
        return maximum_length;
    }
    let offset = (1.0 - (vertical_alignment - limit / 100.0)).clamp(0.0, 1.0);
    maximum_length * offset * offset
}

/// Bezier beam that arcs forward and drops down onto the floor.
///
/// Each frame: a forward cast (shortened when aiming high), a downward cast from
/// its end, an optional early-collision scan along the resulting curve, then the
/// final sampled curve.
#[derive(Clone, Debug, Default)]
pub struct CurvedBeamProjector {
    config: CurvedBeamConfig,
    /// Forward direction from the last frame below the height limit.
    fixed_forward: Option<Vector3<f32>>,
}

impl CurvedBeamProjector {
    pub fn new(config: CurvedBeamConfig) -> Self {
        Self {
            config,
            fixed_forward: None,
        }
    }

    pub fn config(&self) -> &CurvedBeamConfig {
        &self.config
    }

    /// Direction and length of this frame's forward cast.
    pub fn forward_cast(&mut self, forward: Vector3<f32>) -> (Vector3<f32>, f32) {
        let forward = forward.normalize();
        let alignment = forward.dot(Vector3::unit_y());
        let maximum_length = self.config.maximum_length;
        let limit = self.config.height_limit();

        if alignment * 100.0 <= limit {
            self.fixed_forward = Some(forward);
            return (forward, maximum_length);
        }

        let frozen_y = self
            .fixed_forward
            .map(|fixed| fixed.y)
            .unwrap_or(limit / 100.0);
        let candidate = vec3(forward.x, frozen_y, forward.z);
        let direction = if candidate.magnitude2() > f32::EPSILON {
            candidate.normalize()
        } else {
            self.fixed_forward.unwrap_or(forward)
        };
        let length = height_limited_length(maximum_length, alignment, limit);
        (direction, length)
    }

    fn project_forward(&mut self, pose: &PointerPose, scene: &dyn SceneGeometry) -> Vector3<f32> {
        let origin = pose.position;
        let (direction, length) = self.forward_cast(pose.forward());
        let reached = scene
            .cast(origin, direction, length, self.config.layers())
            .map(|hit| hit.distance.min(length))
            .unwrap_or(length);
        origin + direction * (reached - BEAM_ADJUST_OFFSET) + Vector3::unit_y() * BEAM_ADJUST_OFFSET
    }

    fn project_down(&self, from: Vector3<f32>, scene: &dyn SceneGeometry) -> Option<RaycastHit> {
        scene.cast(
            from,
            -Vector3::unit_y(),
            f32::INFINITY,
            self.config.layers(),
        )
    }

    fn control_points(
        &self,
        origin: Vector3<f32>,
        joint: Vector3<f32>,
        floor: Vector3<f32>,
    ) -> CurveControlPoints {
        [
            origin,
            joint + Vector3::unit_y() * self.config.beam_curve_offset,
            floor,
            floor,
        ]
    }

    /// Walk the coarse curve and stop at the first obstacle between samples that
    /// has ground below it. Obstacles overhanging nothing are skipped.
    /// Returns the corrected joint and destination.
    fn early_collision(
        &self,
        origin: Vector3<f32>,
        joint: Vector3<f32>,
        floor: Vector3<f32>,
        scene: &dyn SceneGeometry,
    ) -> Option<(Vector3<f32>, RaycastHit)> {
        let checks = self
            .config
            .collision_check_frequency
            .min(self.config.pointer_density);
        if checks < 2 {
            return None;
        }

        let samples = CurveSampler::sample(&self.control_points(origin, joint, floor), checks).ok()?;
        for segment in samples.windows(2) {
            let (current, next) = (segment[0], segment[1]);
            let offset = next - current;
            let distance = offset.magnitude();
            if distance <= SEGMENT_END_TOLERANCE {
                continue;
            }

            let Some(probe) = scene.cast(
                current,
                offset / distance,
                distance - SEGMENT_END_TOLERANCE,
                self.config.layers(),
            ) else {
                continue;
            };

            let lifted = probe.point + Vector3::unit_y() * EARLY_COLLISION_LIFT;
            if let Some(down) = self.project_down(lifted, scene) {
                let corrected_joint = if down.point.y < joint.y {
                    vec3(down.point.x, joint.y, down.point.z)
                } else {
                    joint
                };
                beam_log!(
                    TRACE,
                    "early collision with {:?}, destination moved to {:?}",
                    probe.target,
                    down.point
                );
                return Some((corrected_joint, down));
            }
        }
        None
    }

    fn cursor_rotation(&self, destination: Option<&RaycastHit>) -> Quaternion<f32> {
        match destination {
            Some(hit) if self.config.cursor_matches_target_rotation => {
                Quaternion::from_arc(Vector3::unit_y(), hit.normal.normalize(), None)
            }
            _ => identity_rotation(),
        }
    }
}

impl BeamProjector for CurvedBeamProjector {
    fn project(&mut self, pose: &PointerPose, scene: &dyn SceneGeometry) -> Projection {
        let origin = pose.position;
        let mut joint = self.project_forward(pose, scene);
        let mut destination = self.project_down(joint, scene);
        let mut floor = destination.map(|hit| hit.point).unwrap_or(joint);

        if let Some((corrected_joint, hit)) = self.early_collision(origin, joint, floor, scene) {
            joint = corrected_joint;
            floor = hit.point;
            destination = Some(hit);
        }

        let points = self.control_points(origin, joint, floor);
        let curve = CurveSampler::sample(&points, self.config.pointer_density.max(2))
            .unwrap_or_else(|_| points.to_vec());
        beam_log!(
            TRACE,
            "curved beam joint={:?} floor={:?} target={:?}",
            joint,
            floor,
            destination.map(|hit| hit.target)
        );

        Projection {
            cursor: CursorPose {
                position: floor,
                rotation: self.cursor_rotation(destination.as_ref()),
            },
            destination,
            curve,
        }
    }

    fn reset(&mut self) {
        self.fixed_forward = None;
    }
}
