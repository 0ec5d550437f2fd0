use std::collections::HashSet;

use cgmath::{InnerSpace, Vector3};

use crate::scene::TargetHandle;

/// Decides whether a hovered position may be teleported to.
pub trait DestinationValidator {
    fn is_valid_destination(&self, target: Option<TargetHandle>, position: Vector3<f32>) -> bool;
}

/// Reports whether the play area would collide with something at the current destination.
pub trait PlayAreaCollision {
    fn is_colliding(&self) -> bool;
}

/// Targets that must never be teleported onto.
#[derive(Clone, Debug, Default)]
pub struct InvalidTargetList {
    targets: HashSet<TargetHandle>,
}

impl InvalidTargetList {
    pub fn new(targets: impl IntoIterator<Item = TargetHandle>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }
}

impl DestinationValidator for InvalidTargetList {
    fn is_valid_destination(&self, target: Option<TargetHandle>, _position: Vector3<f32>) -> bool {
        target.map_or(true, |target| !self.targets.contains(&target))
    }
}

/// Walkable region used by `NavigationCheck`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavArea {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl NavArea {
    fn distance_to(&self, position: Vector3<f32>) -> f32 {
        let closest = Vector3::new(
            position.x.clamp(self.min.x, self.max.x),
            position.y.clamp(self.min.y, self.max.y),
            position.z.clamp(self.min.z, self.max.z),
        );
        (position - closest).magnitude()
    }
}

/// Accepts positions within `max_distance` of any walkable area.
/// A `max_distance` of 0 disables the check.
#[derive(Clone, Debug, Default)]
pub struct NavigationCheck {
    pub areas: Vec<NavArea>,
    pub max_distance: f32,
}

impl DestinationValidator for NavigationCheck {
    fn is_valid_destination(&self, _target: Option<TargetHandle>, position: Vector3<f32>) -> bool {
        if self.max_distance <= 0.0 {
            return true;
        }
        self.areas
            .iter()
            .any(|area| area.distance_to(position) <= self.max_distance)
    }
}

/// The validity collaborators consulted by one pointer.
#[derive(Default)]
pub struct DestinationChecks {
    validators: Vec<Box<dyn DestinationValidator>>,
    play_area: Option<Box<dyn PlayAreaCollision>>,
}

impl DestinationChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(mut self, validator: impl DestinationValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn with_play_area(mut self, play_area: impl PlayAreaCollision + 'static) -> Self {
        self.play_area = Some(Box::new(play_area));
        self
    }

    pub fn is_valid(&self, target: Option<TargetHandle>, position: Vector3<f32>) -> bool {
        self.validators
            .iter()
            .all(|validator| validator.is_valid_destination(target, position))
    }

    pub fn is_play_area_colliding(&self) -> bool {
        self.play_area
            .as_ref()
            .map_or(false, |play_area| play_area.is_colliding())
    }

    pub fn allow_teleport(&self, target: Option<TargetHandle>, position: Vector3<f32>) -> bool {
        target.is_some() && self.is_valid(target, position) && !self.is_play_area_colliding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    struct Colliding(bool);

    impl PlayAreaCollision for Colliding {
        fn is_colliding(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_no_validators_allows_any_target() {
        let checks = DestinationChecks::new();
        assert!(checks.allow_teleport(Some(TargetHandle(1)), vec3(0.0, 0.0, 0.0)));
        assert!(!checks.allow_teleport(None, vec3(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_invalid_target_list_blocks_listed_targets() {
        let checks = DestinationChecks::new()
            .with_validator(InvalidTargetList::new([TargetHandle(4)]));
        assert!(!checks.allow_teleport(Some(TargetHandle(4)), vec3(0.0, 0.0, 0.0)));
        assert!(checks.allow_teleport(Some(TargetHandle(5)), vec3(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_navigation_check_distance() {
        let nav = NavigationCheck {
            areas: vec![NavArea {
                min: vec3(-1.0, 0.0, -1.0),
                max: vec3(1.0, 0.0, 1.0),
            }],
            max_distance: 0.5,
        };
        assert!(nav.is_valid_destination(None, vec3(0.0, 0.0, 0.0)));
        assert!(nav.is_valid_destination(None, vec3(1.4, 0.0, 0.0)));
        assert!(!nav.is_valid_destination(None, vec3(2.0, 0.0, 0.0)));

        let disabled = NavigationCheck {
            max_distance: 0.0,
            ..nav
        };
        assert!(disabled.is_valid_destination(None, vec3(50.0, 0.0, 0.0)));
    }

    #[test]
    fn test_play_area_collision_blocks_teleport() {
        let checks = DestinationChecks::new().with_play_area(Colliding(true));
        assert!(checks.is_valid(Some(TargetHandle(1)), vec3(0.0, 0.0, 0.0)));
        assert!(!checks.allow_teleport(Some(TargetHandle(1)), vec3(0.0, 0.0, 0.0)));
    }
}
