//! Error taxonomy shared by every topology operation.
//!
//! Precondition errors are raised before any array is touched, so a failed
//! call never leaves a partially mutated topology behind.

use thiserror::Error;

use super::topology::{DisplayId, ModeIndex};

/// Errors that can occur while reading or mutating a topology.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The display configuration service returned a non-success status.
    #[error("{operation} failed with native status {code}")]
    NativeApi { operation: &'static str, code: i32 },

    /// The service reported zero paths and zero modes, which happens when no
    /// interactive session owns the display hardware.
    #[error("no display paths available (headless or non-interactive session)")]
    NoDisplayPaths,

    /// A caller-supplied display id does not resolve through the catalog.
    #[error("display {0} does not exist")]
    UnknownDisplay(DisplayId),

    /// The operation needs an active display.
    #[error("display {0} is not active")]
    InactiveDisplay(DisplayId),

    /// A mode index is out of range or points at the wrong record variant.
    #[error("mode link {index} is invalid: expected a {expected} mode record")]
    ModeLinkIntegrity { index: usize, expected: &'static str },

    /// The two displays already share a desktop position.
    #[error("displays {0} and {1} belong to the same position group")]
    SameGroup(DisplayId, DisplayId),

    /// The display is the only one at the primary position.
    #[error("display {0} is the only primary display and cannot be disabled")]
    CannotDisablePrimary(DisplayId),

    /// A clone was requested without any destination displays.
    #[error("no destination displays given")]
    EmptyDestination,

    /// A display was asked to clone itself.
    #[error("display {0} cannot be cloned onto itself")]
    SelfClone(DisplayId),

    /// The same display id appears more than once across the inputs of a
    /// single operation.
    #[error("display {0} is listed more than once")]
    ConflictingDisplayIds(DisplayId),

    /// A fresh snapshot no longer contains a display the operation targeted.
    #[error("adapter layout changed while the operation was in progress")]
    AdapterLayoutChanged,

    /// Another position group already occupies the requested position.
    #[error("position ({x}, {y}) is already occupied by another display")]
    PositionOccupied { x: i32, y: i32 },

    /// A move or resize would take a desktop coordinate outside `i32`.
    #[error("desktop coordinate out of range")]
    CoordinateOverflow,
}

impl TopologyError {
    /// Returns the native status code for [`TopologyError::NativeApi`].
    pub fn native_code(&self) -> Option<i32> {
        match self {
            TopologyError::NativeApi { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub(crate) fn integrity(index: ModeIndex, expected: &'static str) -> TopologyError {
    TopologyError::ModeLinkIntegrity { index, expected }
}
