//! One caller session against the display configuration service.
//!
//! A [`DisplaySession`] holds the boundary and the topology from the most
//! recent snapshot.  Layout and property edits run against that topology
//! through [`DisplaySession::edit`], which submits the whole array pair and
//! re-reads the result.  Enabling and disabling displays goes through the
//! [`ApplyOrchestrator`] instead, because the service has to pick modes for
//! newly lit outputs.

use dispcfg_core::{
    DisplayId, DisplayTopology, EnableDisableRequest, Rational, RelativePosition, Rotation, Scaling,
    TopologyError,
};
use tracing::{debug, info, warn};

use super::apply_retry::{ApplyOrchestrator, ApplyState, RetryPolicy};
use super::boundary::{ApplyFlags, DisplayConfigApi, PreferredMode};
use super::display_info::DisplayInfo;
use super::snapshot::{self, SnapshotOptions};

/// Tunables for a session.  Built from the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub snapshot: SnapshotOptions,
    pub retry: RetryPolicy,
    /// Persist committed layouts so they survive a reboot.
    pub save_to_database: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            snapshot: SnapshotOptions::default(),
            retry: RetryPolicy::default(),
            save_to_database: true,
        }
    }
}

impl SessionOptions {
    /// Flags used by [`DisplaySession::commit`].
    pub fn commit_flags(&self) -> ApplyFlags {
        let flags = ApplyFlags::USE_SUPPLIED_DISPLAY_CONFIG
            | ApplyFlags::APPLY
            | ApplyFlags::ALLOW_CHANGES
            | ApplyFlags::VIRTUAL_MODE_AWARE;
        if self.save_to_database {
            flags | ApplyFlags::SAVE_TO_DATABASE
        } else {
            flags
        }
    }
}

pub struct DisplaySession<A: DisplayConfigApi> {
    api: A,
    options: SessionOptions,
    topology: DisplayTopology,
}

impl<A: DisplayConfigApi> DisplaySession<A> {
    /// Takes the first snapshot.
    ///
    /// # Errors
    ///
    /// Snapshot errors, see [`snapshot::take_topology`].
    pub fn open(api: A, options: SessionOptions) -> Result<Self, TopologyError> {
        let topology = snapshot::take_topology(&api, &options.snapshot)?;
        info!(displays = topology.catalog().len(), "display session opened");
        Ok(Self { api, options, topology })
    }

    /// Replaces the topology with a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Snapshot errors; the old topology is kept on failure.
    pub fn refresh(&mut self) -> Result<(), TopologyError> {
        self.topology = snapshot::take_topology(&self.api, &self.options.snapshot)?;
        debug!(displays = self.topology.catalog().len(), "topology refreshed");
        Ok(())
    }

    pub fn topology(&self) -> &DisplayTopology {
        &self.topology
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Summaries of every catalog display, in id order.
    pub fn displays(&self) -> Result<Vec<DisplayInfo>, TopologyError> {
        self.topology
            .catalog()
            .ids()
            .map(|id| DisplayInfo::from_topology(&self.topology, id))
            .collect()
    }

    pub fn display_info(&self, id: DisplayId) -> Result<DisplayInfo, TopologyError> {
        DisplayInfo::from_topology(&self.topology, id)
    }

    /// Asks the service for the monitor's preferred mode.
    ///
    /// # Errors
    ///
    /// [`TopologyError::UnknownDisplay`] or the native lookup failure.
    pub fn preferred_mode(&self, id: DisplayId) -> Result<PreferredMode, TopologyError> {
        let target = self.topology.path(id)?.physical_target();
        self.api.preferred_mode(target.adapter_id, target.target_id)
    }

    /// Applies `op` to a copy of the topology, commits the copy, then
    /// refreshes.  Nothing is submitted if `op` fails.
    ///
    /// ```ignore
    /// session.edit(|t| t.set_primary(DisplayId(2)))?;
    /// ```
    ///
    /// # Errors
    ///
    /// The error from `op`, or the commit/refresh failure.
    pub fn edit<F>(&mut self, op: F) -> Result<(), TopologyError>
    where
        F: FnOnce(&mut DisplayTopology) -> Result<(), TopologyError>,
    {
        let mut draft = self.topology.clone();
        op(&mut draft)?;
        self.commit_topology(&draft)?;
        self.refresh()
    }

    /// Submits the current topology unchanged and refreshes.
    ///
    /// # Errors
    ///
    /// The native apply failure, or snapshot errors on refresh.
    pub fn commit(&mut self) -> Result<(), TopologyError> {
        self.commit_topology(&self.topology)?;
        self.refresh()
    }

    // ── Edits by display id ───────────────────────────────────────────────────
    //
    // Each of these is `edit` around the topology operation of the same name.

    pub fn set_primary(&mut self, id: DisplayId) -> Result<(), TopologyError> {
        self.edit(|t| t.set_primary(id))
    }

    pub fn disable(&mut self, id: DisplayId) -> Result<(), TopologyError> {
        self.edit(|t| t.disable(id))
    }

    pub fn clone_display(
        &mut self,
        source: DisplayId,
        destinations: &[DisplayId],
    ) -> Result<(), TopologyError> {
        self.edit(|t| t.clone_display(source, destinations))
    }

    pub fn set_resolution(&mut self, id: DisplayId, width: u32, height: u32) -> Result<(), TopologyError> {
        self.edit(|t| t.set_resolution(id, width, height))
    }

    pub fn set_refresh_rate(&mut self, id: DisplayId, rate: Rational) -> Result<(), TopologyError> {
        self.edit(|t| t.set_refresh_rate(id, rate))
    }

    pub fn set_rotation(&mut self, id: DisplayId, rotation: Rotation) -> Result<(), TopologyError> {
        self.edit(|t| t.set_rotation(id, rotation))
    }

    pub fn set_scaling(&mut self, id: DisplayId, scaling: Scaling) -> Result<(), TopologyError> {
        self.edit(|t| t.set_scaling(id, scaling))
    }

    pub fn set_position(
        &mut self,
        id: DisplayId,
        x: Option<i32>,
        y: Option<i32>,
    ) -> Result<(), TopologyError> {
        self.edit(|t| t.set_position(id, x, y))
    }

    pub fn move_by(&mut self, id: DisplayId, dx: i32, dy: i32) -> Result<(), TopologyError> {
        self.edit(|t| t.move_by(id, dx, dy))
    }

    pub fn move_relative_to(
        &mut self,
        id: DisplayId,
        anchor: DisplayId,
        edge: RelativePosition,
    ) -> Result<(), TopologyError> {
        self.edit(|t| t.move_relative_to(id, anchor, edge))
    }

    pub fn swap(&mut self, first: DisplayId, second: DisplayId) -> Result<(), TopologyError> {
        self.edit(|t| t.swap(first, second))
    }

    pub fn arrange_left_to_right(&mut self, ids: &[DisplayId]) -> Result<(), TopologyError> {
        self.edit(|t| t.arrange_left_to_right(ids))
    }

    /// Turns displays on and off in one submission, with the fallback
    /// retry, and refreshes.
    ///
    /// # Errors
    ///
    /// See [`ApplyOrchestrator::run`].
    pub fn enable_disable(
        &mut self,
        request: &EnableDisableRequest,
    ) -> Result<ApplyState, TopologyError> {
        let orchestrator =
            ApplyOrchestrator::new(&self.api, self.options.snapshot, self.options.retry);
        let state = orchestrator.run(&self.topology, request)?;
        self.refresh()?;
        Ok(state)
    }

    /// Enables every known display in `ids`.  Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// See [`DisplaySession::enable_disable`].
    pub fn enable(&mut self, ids: &[DisplayId], as_clone: bool) -> Result<ApplyState, TopologyError> {
        let enable = self.known(ids);
        self.enable_disable(&EnableDisableRequest { enable, disable: Vec::new(), as_clone })
    }

    /// Disables every known display in `ids`.  Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// See [`DisplaySession::enable_disable`].
    pub fn disable_many(&mut self, ids: &[DisplayId]) -> Result<ApplyState, TopologyError> {
        let disable = self.known(ids);
        self.enable_disable(&EnableDisableRequest { enable: Vec::new(), disable, as_clone: false })
    }

    fn known(&self, ids: &[DisplayId]) -> Vec<DisplayId> {
        ids.iter()
            .copied()
            .filter(|&id| match self.topology.catalog().path_index(id) {
                Ok(_) => true,
                Err(e) => {
                    warn!(display = %id, error = %e, "skipping unknown display");
                    false
                }
            })
            .collect()
    }

    fn commit_topology(&self, topology: &DisplayTopology) -> Result<(), TopologyError> {
        let flags = self.options.commit_flags();
        debug!(%flags, "committing display configuration");
        self.api.apply_config(
            topology.paths(),
            Some(topology.modes().as_slice().to_vec()),
            flags,
        )?;
        info!("display configuration committed");
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
