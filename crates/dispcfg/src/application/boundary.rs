//! The display configuration service as seen by the application layer.
//!
//! [`DisplayConfigApi`] mirrors the platform calls one-to-one: buffer-size
//! query, configuration query, apply, and the three device-info lookups.
//! Every failure comes back as [`TopologyError::NativeApi`] carrying the
//! platform status code untouched, so callers can match on it.

use std::fmt;
use std::ops::BitOr;

use dispcfg_core::{
    AdapterId, DeviceNameSource, ModeInfo, PathInfo, TargetDeviceName, TargetMode, TopologyError,
};

/// The operation completed successfully.
pub const ERROR_SUCCESS: i32 = 0;
/// A device attached to the system is not functioning.  Returned by apply
/// when the hardware cannot drive every requested output at once.
pub const ERROR_GEN_FAILURE: i32 = 31;
/// The parameter is incorrect.
pub const ERROR_INVALID_PARAMETER: i32 = 87;
/// The data area passed to a system call is too small.
pub const ERROR_INSUFFICIENT_BUFFER: i32 = 122;
/// The request is not supported.
pub const ERROR_NOT_SUPPORTED: i32 = 50;
/// Element not found.  Returned by device-info lookups for an unknown target.
pub const ERROR_NOT_FOUND: i32 = 1168;

/// Query flags (`QDC_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryFlags(pub u32);

impl QueryFlags {
    pub const ALL_PATHS: QueryFlags = QueryFlags(0x0000_0001);
    pub const ONLY_ACTIVE_PATHS: QueryFlags = QueryFlags(0x0000_0002);
    pub const VIRTUAL_MODE_AWARE: QueryFlags = QueryFlags(0x0000_0010);

    /// Flags for a snapshot, with or without inactive paths.
    pub fn snapshot(include_inactive_paths: bool) -> Self {
        let scope = if include_inactive_paths { Self::ALL_PATHS } else { Self::ONLY_ACTIVE_PATHS };
        scope | Self::VIRTUAL_MODE_AWARE
    }

    pub fn contains(self, other: QueryFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for QueryFlags {
    type Output = QueryFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        QueryFlags(self.0 | rhs.0)
    }
}

/// Apply flags (`SDC_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApplyFlags(pub u32);

impl ApplyFlags {
    pub const TOPOLOGY_SUPPLIED: ApplyFlags = ApplyFlags(0x0000_0010);
    pub const USE_SUPPLIED_DISPLAY_CONFIG: ApplyFlags = ApplyFlags(0x0000_0020);
    pub const VALIDATE: ApplyFlags = ApplyFlags(0x0000_0040);
    pub const APPLY: ApplyFlags = ApplyFlags(0x0000_0080);
    pub const SAVE_TO_DATABASE: ApplyFlags = ApplyFlags(0x0000_0200);
    pub const ALLOW_CHANGES: ApplyFlags = ApplyFlags(0x0000_0400);
    pub const ALLOW_PATH_ORDER_CHANGES: ApplyFlags = ApplyFlags(0x0000_2000);
    pub const VIRTUAL_MODE_AWARE: ApplyFlags = ApplyFlags(0x0000_8000);

    pub const fn empty() -> Self {
        ApplyFlags(0)
    }

    pub fn contains(self, other: ApplyFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ApplyFlags {
    type Output = ApplyFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ApplyFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for ApplyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Element counts reported by the buffer-size query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferSizes {
    pub paths: u32,
    pub modes: u32,
}

impl BufferSizes {
    pub fn is_empty(&self) -> bool {
        self.paths == 0 && self.modes == 0
    }
}

/// Arrays returned by one successful configuration query, trimmed to the
/// element counts the service actually wrote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueriedConfig {
    pub paths: Vec<PathInfo>,
    pub modes: Vec<ModeInfo>,
}

/// The monitor's preferred resolution and timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferredMode {
    pub width: u32,
    pub height: u32,
    pub target_mode: TargetMode,
}

/// Calls into the platform display configuration service.
#[cfg_attr(test, mockall::automock)]
pub trait DisplayConfigApi {
    /// Returns the array sizes a configuration query with `flags` needs.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NativeApi`] with the platform status.
    fn query_sizes(&self, flags: QueryFlags) -> Result<BufferSizes, TopologyError>;

    /// Queries the configuration into buffers of `sizes` elements.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NativeApi`]; code [`ERROR_INSUFFICIENT_BUFFER`] when the
    /// configuration grew since `sizes` was obtained.
    fn query_config(
        &self,
        flags: QueryFlags,
        sizes: BufferSizes,
    ) -> Result<QueriedConfig, TopologyError>;

    /// Submits a configuration.  `modes` is `None` when the service should
    /// pick every mode itself.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NativeApi`] with the platform status.
    fn apply_config(
        &self,
        paths: &[PathInfo],
        modes: Option<Vec<ModeInfo>>,
        flags: ApplyFlags,
    ) -> Result<(), TopologyError>;

    /// # Errors
    ///
    /// [`TopologyError::NativeApi`] with the platform status.
    fn preferred_mode(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<PreferredMode, TopologyError>;

    /// # Errors
    ///
    /// [`TopologyError::NativeApi`] with the platform status.
    fn target_device_name(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<TargetDeviceName, TopologyError>;

    /// # Errors
    ///
    /// [`TopologyError::NativeApi`] with the platform status.
    fn adapter_name(&self, adapter_id: AdapterId) -> Result<String, TopologyError>;
}

/// Lends a [`DisplayConfigApi`] to the catalog as its name source.
pub struct DeviceNames<'a, A: ?Sized>(pub &'a A);

impl<A: DisplayConfigApi + ?Sized> DeviceNameSource for DeviceNames<'_, A> {
    fn target_device_name(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<TargetDeviceName, TopologyError> {
        self.0.target_device_name(adapter_id, target_id)
    }

    fn adapter_name(&self, adapter_id: AdapterId) -> Result<String, TopologyError> {
        self.0.adapter_name(adapter_id)
    }
}
