//! Enable/disable submission with a single fallback retry.
//!
//! The first attempt hands the service paths only and lets it rebuild every
//! mode ("topology supplied").  Some drivers reject that with a generic
//! failure when asked to light up several outputs at once.  In that case the
//! change is recomputed against a fresh snapshot, reusing the source ids the
//! disabled displays freed, and submitted with the modes supplied.
//!
//! ```text
//!  Primary ──ok──► done
//!     │
//!     └─ recoverable code ─► Fallback ──ok──► done
//!                               │
//!  any other error ◄────────────┘
//! ```

use dispcfg_core::{
    DisplayTopology, EnableDisableRequest, ModeArena, PhysicalTarget, SourceIdStrategy,
    TopologyError,
};
use tracing::{debug, info, warn};

use super::boundary::{ApplyFlags, DisplayConfigApi, ERROR_GEN_FAILURE};
use super::snapshot::{self, SnapshotOptions};

/// Which strategy is being (or was) attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyState {
    Primary,
    Fallback,
}

impl ApplyState {
    /// Flags submitted in this state.
    pub fn flags(self) -> ApplyFlags {
        match self {
            ApplyState::Primary => {
                ApplyFlags::TOPOLOGY_SUPPLIED
                    | ApplyFlags::ALLOW_PATH_ORDER_CHANGES
                    | ApplyFlags::APPLY
                    | ApplyFlags::VIRTUAL_MODE_AWARE
            }
            ApplyState::Fallback => {
                ApplyFlags::USE_SUPPLIED_DISPLAY_CONFIG
                    | ApplyFlags::SAVE_TO_DATABASE
                    | ApplyFlags::ALLOW_CHANGES
                    | ApplyFlags::APPLY
                    | ApplyFlags::VIRTUAL_MODE_AWARE
            }
        }
    }

    /// Source-id strategy used to plan the change in this state.
    pub fn strategy(self) -> SourceIdStrategy {
        match self {
            ApplyState::Primary => SourceIdStrategy::Renumber,
            ApplyState::Fallback => SourceIdStrategy::RecycleFreed,
        }
    }
}

/// When the fallback is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub fallback_enabled: bool,
    /// Native status that moves `Primary` to `Fallback`.
    pub recoverable_code: i32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { fallback_enabled: true, recoverable_code: ERROR_GEN_FAILURE }
    }
}

impl RetryPolicy {
    fn is_recoverable(&self, error: &TopologyError) -> bool {
        self.fallback_enabled && error.native_code() == Some(self.recoverable_code)
    }
}

/// Runs one enable/disable request to completion.
pub struct ApplyOrchestrator<'a, A: ?Sized> {
    api: &'a A,
    snapshot: SnapshotOptions,
    policy: RetryPolicy,
}

impl<'a, A: DisplayConfigApi + ?Sized> ApplyOrchestrator<'a, A> {
    pub fn new(api: &'a A, snapshot: SnapshotOptions, policy: RetryPolicy) -> Self {
        Self { api, snapshot, policy }
    }

    /// Submits `request` against `topology`, returning the state that
    /// succeeded.
    ///
    /// # Errors
    ///
    /// - Planning errors from [`DisplayTopology::plan_enable_disable`], raised
    ///   before anything is submitted.
    /// - [`TopologyError::AdapterLayoutChanged`] if the fresh snapshot taken
    ///   for the fallback no longer has one of the requested displays.
    /// - Any native error other than the recoverable one, unchanged.
    pub fn run(
        &self,
        topology: &DisplayTopology,
        request: &EnableDisableRequest,
    ) -> Result<ApplyState, TopologyError> {
        request.validate()?;
        let enable = topology.physical_targets(&request.enable)?;
        let disable = topology.physical_targets(&request.disable)?;

        let mut state = ApplyState::Primary;
        loop {
            let outcome = match state {
                ApplyState::Primary => self.submit_primary(topology, request),
                ApplyState::Fallback => self.submit_fallback(&enable, &disable, request.as_clone),
            };

            match outcome {
                Ok(()) => {
                    info!(?state, "enable/disable applied");
                    return Ok(state);
                }
                Err(e) if state == ApplyState::Primary && self.policy.is_recoverable(&e) => {
                    warn!(error = %e, "primary apply failed, retrying with supplied modes");
                    state = ApplyState::Fallback;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn submit_primary(
        &self,
        topology: &DisplayTopology,
        request: &EnableDisableRequest,
    ) -> Result<(), TopologyError> {
        let state = ApplyState::Primary;
        let plan = topology.plan_enable_disable(request, state.strategy())?;
        debug!(flags = %state.flags(), "submitting topology");
        self.api.apply_config(&plan.paths, None, state.flags())
    }

    fn submit_fallback(
        &self,
        enable: &[PhysicalTarget],
        disable: &[PhysicalTarget],
        as_clone: bool,
    ) -> Result<(), TopologyError> {
        let state = ApplyState::Fallback;
        let fresh = snapshot::take_topology(self.api, &self.snapshot)?;
        let request = EnableDisableRequest {
            enable: fresh.resolve_targets(enable)?,
            disable: fresh.resolve_targets(disable)?,
            as_clone,
        };
        let plan = fresh.plan_enable_disable(&request, state.strategy())?;
        let modes = plan.modes.map(ModeArena::into_vec).unwrap_or_default();
        debug!(flags = %state.flags(), modes = modes.len(), "submitting supplied configuration");
        self.api.apply_config(&plan.paths, Some(modes), state.flags())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
