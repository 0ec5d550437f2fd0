use std::io;

use thiserror::Error;

use crate::{pointer::PointerId, zones::ZoneId};

/// Errors raised by the targeting core.
///
/// Missing raycast hits are never errors; they are the normal "no destination" state.
#[derive(Debug, Error)]
pub enum TargetingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The pointer was created without an activation input source and stays idle.
    #[error("pointer {pointer:?} has no activation input source bound")]
    UnboundPointer { pointer: PointerId },

    #[error("no pointer registered with id {0:?}")]
    UnknownPointer(PointerId),

    #[error("no destination zone registered with id {0:?}")]
    UnknownZone(ZoneId),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error during '{operation}': {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TargetingError>;
