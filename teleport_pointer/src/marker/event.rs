use bitflags::bitflags;
use cgmath::{Quaternion, Vector3};
use serde::{Deserialize, Serialize};

use super::EmitterId;
use crate::scene::{RaycastHit, TargetHandle};

/// Identifies the input source (hand/controller) that raised an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceIndex(pub u8);

/// Raycast hit record carried by a destination event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    pub point: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub target: Option<TargetHandle>,
}

impl From<&RaycastHit> for SurfaceHit {
    fn from(hit: &RaycastHit) -> Self {
        Self {
            point: hit.point,
            normal: hit.normal,
            target: Some(hit.target),
        }
    }
}

/// Payload of every Enter/Exit/Set event. Built fresh whenever pointer state changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DestinationEvent {
    pub distance: f32,
    pub target: Option<TargetHandle>,
    pub hit: SurfaceHit,
    pub destination_position: Vector3<f32>,
    pub destination_rotation: Option<Quaternion<f32>>,
    pub source_index: SourceIndex,
    pub allow_teleport: bool,
}

impl DestinationEvent {
    pub fn from_hit(
        hit: &RaycastHit,
        destination_position: Vector3<f32>,
        source_index: SourceIndex,
        allow_teleport: bool,
    ) -> Self {
        Self {
            distance: hit.distance,
            target: Some(hit.target),
            hit: SurfaceHit::from(hit),
            destination_position,
            destination_rotation: None,
            source_index,
            allow_teleport,
        }
    }

    /// Copy of this event pointing at a different destination, as snap zones publish.
    pub fn redirected(
        &self,
        destination_position: Vector3<f32>,
        destination_rotation: Option<Quaternion<f32>>,
    ) -> Self {
        Self {
            destination_position,
            destination_rotation,
            ..*self
        }
    }

    pub fn hits(&self, target: TargetHandle) -> bool {
        self.hit.target == Some(target)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerEventKind {
    Enter,
    Exit,
    Set,
}

bitflags! {
    /// Event kinds a subscriber listens for on an emitter.
    pub struct MarkerKinds: u8 {
        const ENTER = 0b001;
        const EXIT = 0b010;
        const SET = 0b100;
    }
}

impl From<MarkerEventKind> for MarkerKinds {
    fn from(kind: MarkerEventKind) -> Self {
        match kind {
            MarkerEventKind::Enter => MarkerKinds::ENTER,
            MarkerEventKind::Exit => MarkerKinds::EXIT,
            MarkerEventKind::Set => MarkerKinds::SET,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerEvent {
    pub emitter: EmitterId,
    pub kind: MarkerEventKind,
    pub payload: DestinationEvent,
}
