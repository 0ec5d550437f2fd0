use std::collections::VecDeque;

use cgmath::{Quaternion, Vector3};

use crate::{
    marker::bus::{push_bounded, DEFAULT_HISTORY_LIMIT},
    pointer_log,
};

/// Consumer of confirmed destinations; moves the player.
pub trait TeleportExecutor {
    /// A snap zone is hovered; the executor may preview its anchor.
    fn set_prospective_destination(
        &mut self,
        position: Vector3<f32>,
        rotation: Option<Quaternion<f32>>,
    );

    fn clear_prospective_destination(&mut self);

    fn confirm_teleport(&mut self, position: Vector3<f32>, rotation: Option<Quaternion<f32>>);

    /// Current headset orientation, used by zones that rotate relative to it.
    fn headset_rotation(&self) -> Quaternion<f32> {
        Quaternion::new(1.0, 0.0, 0.0, 0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TeleportEffect {
    SetPlayerPosition {
        position: Vector3<f32>,
        rotation: Option<Quaternion<f32>>,
        is_teleport: bool,
    },
}

/// Executor that keeps the player transform and records the movement effects
/// for the host to apply. Only the most recent effects are kept until taken.
#[derive(Clone, Debug)]
pub struct PlayerTeleporter {
    pub player_position: Vector3<f32>,
    pub player_rotation: Quaternion<f32>,
    pub headset_rotation: Quaternion<f32>,
    prospective: Option<(Vector3<f32>, Option<Quaternion<f32>>)>,
    effects: VecDeque<TeleportEffect>,
}

impl PlayerTeleporter {
    pub fn new(player_position: Vector3<f32>) -> Self {
        Self {
            player_position,
            player_rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            headset_rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            prospective: None,
            effects: VecDeque::new(),
        }
    }

    pub fn prospective(&self) -> Option<(Vector3<f32>, Option<Quaternion<f32>>)> {
        self.prospective
    }

    pub fn take_effects(&mut self) -> Vec<TeleportEffect> {
        self.effects.drain(..).collect()
    }
}

impl Default for PlayerTeleporter {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, 0.0))
    }
}

impl TeleportExecutor for PlayerTeleporter {
    fn set_prospective_destination(
        &mut self,
        position: Vector3<f32>,
        rotation: Option<Quaternion<f32>>,
    ) {
        self.prospective = Some((position, rotation));
    }

    fn clear_prospective_destination(&mut self) {
        self.prospective = None;
    }

    fn confirm_teleport(&mut self, position: Vector3<f32>, rotation: Option<Quaternion<f32>>) {
        pointer_log!(INFO, "teleporting player to {:?}", position);
        self.player_position = position;
        if let Some(rotation) = rotation {
            self.player_rotation = rotation;
        }
        self.prospective = None;
        push_bounded(
            &mut self.effects,
            TeleportEffect::SetPlayerPosition {
                position,
                rotation,
                is_teleport: true,
            },
            DEFAULT_HISTORY_LIMIT,
        );
    }

    fn headset_rotation(&self) -> Quaternion<f32> {
        self.headset_rotation
    }
}
