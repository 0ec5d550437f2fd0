use cgmath::{InnerSpace, Vector3};

use super::{LayerMask, RaycastHit, SceneGeometry, TargetHandle};

const PARALLEL_EPSILON: f32 = 1e-6;

/// Analytic shapes for scenes that don't need a physics world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PrimitiveShape {
    /// Infinite two-sided plane through `point`.
    Plane {
        point: Vector3<f32>,
        normal: Vector3<f32>,
    },
    /// Axis-aligned box. Rays starting inside the box don't hit it.
    Box { min: Vector3<f32>, max: Vector3<f32> },
}

impl PrimitiveShape {
    fn cast(&self, origin: Vector3<f32>, direction: Vector3<f32>) -> Option<(f32, Vector3<f32>)> {
        match *self {
            PrimitiveShape::Plane { point, normal } => {
                let normal = normal.normalize();
                let denom = normal.dot(direction);
                if denom.abs() < PARALLEL_EPSILON {
                    return None;
                }
                let distance = (point - origin).dot(normal) / denom;
                if distance < 0.0 {
                    return None;
                }
                let facing = if denom > 0.0 { -normal } else { normal };
                Some((distance, facing))
            }
            PrimitiveShape::Box { min, max } => {
                let mut near = f32::NEG_INFINITY;
                let mut far = f32::INFINITY;
                let mut near_axis = 0;

                for axis in 0..3 {
                    let (o, d) = (origin[axis], direction[axis]);
                    if d.abs() < PARALLEL_EPSILON {
                        if o < min[axis] || o > max[axis] {
                            return None;
                        }
                        continue;
                    }
                    let t1 = (min[axis] - o) / d;
                    let t2 = (max[axis] - o) / d;
                    let (t_enter, t_exit) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
                    if t_enter > near {
                        near = t_enter;
                        near_axis = axis;
                    }
                    far = far.min(t_exit);
                }

                if near < 0.0 || far < near {
                    return None;
                }

                let mut normal = Vector3::new(0.0, 0.0, 0.0);
                normal[near_axis] = -direction[near_axis].signum();
                Some((near, normal))
            }
        }
    }
}

#[derive(Clone, Debug)]
struct PrimitiveBody {
    shape: PrimitiveShape,
    target: TargetHandle,
    layers: LayerMask,
}

/// A list of primitive shapes, each tagged with the target handle it reports.
#[derive(Clone, Debug, Default)]
pub struct PrimitiveScene {
    bodies: Vec<PrimitiveBody>,
}

impl PrimitiveScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: TargetHandle, shape: PrimitiveShape, layers: LayerMask) {
        self.bodies.push(PrimitiveBody {
            shape,
            target,
            layers,
        });
    }

    /// Horizontal floor plane at `height`.
    pub fn add_floor(&mut self, target: TargetHandle, height: f32) {
        self.add(
            target,
            PrimitiveShape::Plane {
                point: Vector3::new(0.0, height, 0.0),
                normal: Vector3::unit_y(),
            },
            LayerMask::FLOOR,
        );
    }

    pub fn add_box(&mut self, target: TargetHandle, min: Vector3<f32>, max: Vector3<f32>) {
        self.add(target, PrimitiveShape::Box { min, max }, LayerMask::DEFAULT);
    }

    /// Remove every shape reporting `target`. Returns whether anything was removed.
    pub fn remove(&mut self, target: TargetHandle) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|body| body.target != target);
        self.bodies.len() != before
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl SceneGeometry for PrimitiveScene {
    fn cast(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        layer_mask: LayerMask,
    ) -> Option<RaycastHit> {
        if direction.magnitude2() < PARALLEL_EPSILON {
            return None;
        }
        let direction = direction.normalize();

        self.bodies
            .iter()
            .filter(|body| body.layers.intersects(layer_mask))
            .filter_map(|body| {
                body.shape
                    .cast(origin, direction)
                    .filter(|(distance, _)| *distance <= max_distance)
                    .map(|(distance, normal)| RaycastHit {
                        point: origin + direction * distance,
                        normal,
                        target: body.target,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
