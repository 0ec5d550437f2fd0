//! Destination zones: landing pads that listen to every pointer (and to each
//! other) and agree on a single selected zone.

pub mod registry;
pub mod zone;

pub use registry::DestinationZoneRegistry;
pub use zone::{
    yaw_of, DestinationZone, ZoneEffect, ZoneId, ZoneNotice, ZoneNotification, ZoneVisual,
};
