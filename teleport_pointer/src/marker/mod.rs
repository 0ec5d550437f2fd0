//! Destination marker protocol.
//!
//! Anything that can identify a teleport destination (pointers, destination
//! zones) is an emitter on the `MarkerBus`; anything that reacts to
//! destinations subscribes to emitters for the event kinds it cares about.

pub mod bus;
pub mod event;

pub use bus::{EmitterId, EmitterOwner, MarkerBus, Subscriber};
pub use event::{
    DestinationEvent, MarkerEvent, MarkerEventKind, MarkerKinds, SourceIndex, SurfaceHit,
};
