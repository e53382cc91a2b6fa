//! Snapshot acquisition.
//!
//! The configuration can change between the size query and the data query
//! (a monitor is plugged in, a driver resets).  The service then reports
//! [`ERROR_INSUFFICIENT_BUFFER`] and the whole exchange starts over with
//! fresh sizes.

use dispcfg_core::{DisplayTopology, TopologyError};
use tracing::{debug, warn};

use super::boundary::{DeviceNames, DisplayConfigApi, QueriedConfig, QueryFlags, ERROR_INSUFFICIENT_BUFFER};

/// How snapshots are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Include paths that are not currently active.  Needed to enable
    /// displays that are off.
    pub include_inactive_paths: bool,
    /// Upper bound on size/data query rounds.
    pub max_attempts: u32,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self { include_inactive_paths: true, max_attempts: 8 }
    }
}

/// Queries the current path and mode arrays.
///
/// # Errors
///
/// - [`TopologyError::NoDisplayPaths`] if the service reports no paths and
///   no modes.
/// - [`TopologyError::NativeApi`] for any other failure, or the last
///   "buffer too small" status once `max_attempts` rounds are used up.
pub fn acquire<A: DisplayConfigApi + ?Sized>(
    api: &A,
    options: &SnapshotOptions,
) -> Result<QueriedConfig, TopologyError> {
    let flags = QueryFlags::snapshot(options.include_inactive_paths);
    let attempts = options.max_attempts.max(1);
    let mut last = TopologyError::NativeApi {
        operation: "QueryDisplayConfig",
        code: ERROR_INSUFFICIENT_BUFFER,
    };

    for attempt in 1..=attempts {
        let sizes = api.query_sizes(flags)?;
        if sizes.is_empty() {
            return Err(TopologyError::NoDisplayPaths);
        }

        match api.query_config(flags, sizes) {
            Ok(config) => {
                debug!(
                    paths = config.paths.len(),
                    modes = config.modes.len(),
                    attempt,
                    "display configuration queried"
                );
                return Ok(config);
            }
            Err(e) if e.native_code() == Some(ERROR_INSUFFICIENT_BUFFER) => {
                debug!(attempt, "configuration changed during query, retrying");
                last = e;
            }
            Err(e) => return Err(e),
        }
    }

    warn!(attempts, "display configuration kept changing, giving up");
    Err(last)
}

/// Queries the arrays and wraps them, with their catalog, in a topology.
///
/// # Errors
///
/// Everything [`acquire`] returns, plus catalog name lookup failures and
/// [`TopologyError::ModeLinkIntegrity`] for a malformed answer.
pub fn take_topology<A: DisplayConfigApi + ?Sized>(
    api: &A,
    options: &SnapshotOptions,
) -> Result<DisplayTopology, TopologyError> {
    let config = acquire(api, options)?;
    DisplayTopology::new(config.paths, config.modes, &DeviceNames(api))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
