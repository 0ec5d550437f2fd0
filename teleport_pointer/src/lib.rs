//! Teleport targeting core for room-scale VR.
//!
//! A pointer projects a beam (straight or curved) into the scene, destination
//! zones and the teleport router listen to its Enter/Exit/Set marker events, and
//! a teleport executor moves the player once a destination is confirmed.

pub mod beam;
pub mod config;
pub mod curve;
pub mod error;
pub mod logging;
pub mod marker;
pub mod pointer;
pub mod scene;
pub mod scheduler;
pub mod teleport;
pub mod time;
pub mod world;
pub mod zones;

pub use beam::{
    BeamProjector, BeamRenderer, CurvedBeamProjector, LineBeamRenderer, NullRenderer, PointerPose,
    Projection, StraightBeamProjector, BEAM_ADJUST_OFFSET,
};
pub use config::{
    ActivationConfig, ActivationMode, BeamColors, BeamKind, CurvedBeamConfig, PointerConfig,
    RotationPolicy, StraightBeamConfig, TargetingConfig, ZoneConfig,
};
pub use curve::{CurveControlPoints, CurveSampler};
pub use error::{Result, TargetingError};
pub use marker::{
    DestinationEvent, MarkerBus, MarkerEvent, MarkerEventKind, SourceIndex, SurfaceHit,
};
pub use pointer::{
    DestinationChecks, Pointer, PointerActivationController, PointerId, PointerState,
};
pub use scene::{LayerMask, PrimitiveScene, RapierScene, RaycastHit, SceneGeometry, TargetHandle};
pub use teleport::{PlayerTeleporter, TeleportEffect, TeleportExecutor};
pub use time::Time;
pub use world::{FrameInput, InputSignal, TargetingWorld};
pub use zones::{DestinationZoneRegistry, ZoneId, ZoneNotification, ZoneVisual};
