use cgmath::{InnerSpace, Vector3};
use ordered_float::OrderedFloat;
use rapier3d::{
    parry::query::RayCast,
    prelude::{
        Collider, ColliderHandle, ColliderSet, IslandManager, Point, Ray, Real, RigidBodySet,
        Vector,
    },
};

use super::{LayerMask, RaycastHit, SceneGeometry, TargetHandle};

pub fn nvec_to_cgmath(vec: Vector<Real>) -> Vector3<f32> {
    Vector3 {
        x: vec.x,
        y: vec.y,
        z: vec.z,
    }
}

pub fn npoint_to_cgvec(point: Point<Real>) -> Vector3<f32> {
    Vector3 {
        x: point.x,
        y: point.y,
        z: point.z,
    }
}

pub fn vec_to_npoint(vec: Vector3<f32>) -> Point<Real> {
    Point::new(vec.x, vec.y, vec.z)
}

pub fn vec_to_nvec(vec: Vector3<f32>) -> Vector<Real> {
    Vector::new(vec.x, vec.y, vec.z)
}

/// Scene geometry backed by a rapier collider set.
///
/// Each collider carries its `TargetHandle` in `user_data`; a collider is
/// castable when its collision-group memberships intersect the layer mask.
pub struct RapierScene {
    colliders: ColliderSet,
    bodies: RigidBodySet,
    islands: IslandManager,
}

impl RapierScene {
    pub fn new() -> Self {
        Self {
            colliders: ColliderSet::new(),
            bodies: RigidBodySet::new(),
            islands: IslandManager::new(),
        }
    }

    pub fn insert(&mut self, mut collider: Collider, target: TargetHandle) -> ColliderHandle {
        collider.user_data = target.0 as u128;
        self.colliders.insert(collider)
    }

    pub fn remove(&mut self, handle: ColliderHandle) -> Option<TargetHandle> {
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, false)
            .map(|collider| TargetHandle(collider.user_data as u64))
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }
}

impl Default for RapierScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGeometry for RapierScene {
    fn cast(
        &self,
        origin: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        layer_mask: LayerMask,
    ) -> Option<RaycastHit> {
        if direction.magnitude2() <= f32::EPSILON {
            return None;
        }
        let direction = direction.normalize();
        let ray = Ray::new(vec_to_npoint(origin), vec_to_nvec(direction));
        let max_toi = if max_distance.is_finite() {
            max_distance
        } else {
            Real::MAX
        };

        self.colliders
            .iter()
            .filter(|(_, collider)| {
                collider.collision_groups().memberships.bits() & layer_mask.bits() != 0
            })
            .filter_map(|(_, collider)| {
                RayCast::cast_ray_and_get_normal(
                    collider.shape(),
                    collider.position(),
                    &ray,
                    max_toi,
                    true,
                )
                .map(|intersection| (collider, intersection))
            })
            .min_by_key(|(_, intersection)| OrderedFloat(intersection.time_of_impact))
            .map(|(collider, intersection)| RaycastHit {
                point: npoint_to_cgvec(ray.point_at(intersection.time_of_impact)),
                normal: nvec_to_cgmath(intersection.normal),
                target: TargetHandle(collider.user_data as u64),
                distance: intersection.time_of_impact,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::vec3;
    use rapier3d::prelude::{ColliderBuilder, Group, InteractionGroups};

    const FLOOR: TargetHandle = TargetHandle(10);
    const PAD: TargetHandle = TargetHandle(11);

    fn floor_collider(layer: u32) -> Collider {
        ColliderBuilder::cuboid(50.0, 0.1, 50.0)
            .translation(Vector::new(0.0, -0.1, 0.0))
            .collision_groups(InteractionGroups::new(
                Group::from_bits_truncate(layer),
                Group::ALL,
            ))
            .build()
    }

    #[test]
    fn test_cast_reports_target_from_user_data() {
        let mut scene = RapierScene::new();
        scene.insert(floor_collider(LayerMask::FLOOR.bits()), FLOOR);

        let hit = scene
            .cast(vec3(1.0, 2.0, 1.0), vec3(0.0, -1.0, 0.0), f32::INFINITY, LayerMask::ALL)
            .unwrap();

        assert_eq!(hit.target, FLOOR);
        assert_relative_eq!(hit.distance, 2.0, epsilon = 1e-4);
        assert_relative_eq!(hit.point, vec3(1.0, 0.0, 1.0), epsilon = 1e-4);
        assert_relative_eq!(hit.normal, vec3(0.0, 1.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_layer_mask_excludes_memberships() {
        let mut scene = RapierScene::new();
        scene.insert(floor_collider(LayerMask::FLOOR.bits()), FLOOR);

        let hit = scene.cast(
            vec3(0.0, 2.0, 0.0),
            vec3(0.0, -1.0, 0.0),
            f32::INFINITY,
            LayerMask::DESTINATION_ZONE,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_nearest_collider_wins_and_removal() {
        let mut scene = RapierScene::new();
        scene.insert(floor_collider(LayerMask::FLOOR.bits()), FLOOR);
        let pad = scene.insert(
            ColliderBuilder::cuboid(0.5, 0.05, 0.5)
                .translation(Vector::new(0.0, 0.05, -2.0))
                .collision_groups(InteractionGroups::new(
                    Group::from_bits_truncate(LayerMask::DESTINATION_ZONE.bits()),
                    Group::ALL,
                ))
                .build(),
            PAD,
        );

        let origin = vec3(0.0, 2.0, -2.0);
        let down = vec3(0.0, -1.0, 0.0);
        let hit = scene.cast(origin, down, 10.0, LayerMask::ALL).unwrap();
        assert_eq!(hit.target, PAD);

        assert_eq!(scene.remove(pad), Some(PAD));
        let hit = scene.cast(origin, down, 10.0, LayerMask::ALL).unwrap();
        assert_eq!(hit.target, FLOOR);
    }
}
