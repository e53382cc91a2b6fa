//! The path/mode array pair and its catalog, owned as one value.
//!
//! [`DisplayTopology`] is the unit every operation in [`super::layout`] and
//! [`super::mutation`] works on.  Multi-step operations run on a draft copy
//! (see [`DisplayTopology::transact`]) so a failure part-way through leaves
//! the installed arrays exactly as they were.

use std::collections::BTreeMap;

use super::catalog::{DeviceNameSource, DisplayCatalog};
use super::error::TopologyError;
use super::mode_arena::ModeArena;
use super::topology::{DisplayId, ModeIndex, ModeInfo, PathInfo, Point, SourceMode};

/// Positions of the active desktops, each with the paths that show it.
///
/// Paths sharing a key form a clone group.
pub type DesktopMap = BTreeMap<Point, Vec<usize>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTopology {
    pub(crate) paths: Vec<PathInfo>,
    pub(crate) modes: ModeArena,
    pub(crate) catalog: DisplayCatalog,
}

impl DisplayTopology {
    /// Wraps a freshly queried array pair and builds its catalog.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ModeLinkIntegrity`] if any path links to a
    /// missing or mismatched record, or a name lookup error from `names`.
    pub fn new(
        paths: Vec<PathInfo>,
        modes: Vec<ModeInfo>,
        names: &dyn DeviceNameSource,
    ) -> Result<Self, TopologyError> {
        let catalog = DisplayCatalog::build(&paths, names)?;
        Self::with_catalog(paths, ModeArena::new(modes), catalog)
    }

    /// Assembles a topology from parts that were already derived.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ModeLinkIntegrity`] for a bad link.
    pub fn with_catalog(
        paths: Vec<PathInfo>,
        modes: ModeArena,
        catalog: DisplayCatalog,
    ) -> Result<Self, TopologyError> {
        let topology = Self { paths, modes, catalog };
        topology.validate()?;
        Ok(topology)
    }

    pub fn paths(&self) -> &[PathInfo] {
        &self.paths
    }

    pub fn modes(&self) -> &ModeArena {
        &self.modes
    }

    pub fn catalog(&self) -> &DisplayCatalog {
        &self.catalog
    }

    pub fn into_parts(self) -> (Vec<PathInfo>, ModeArena, DisplayCatalog) {
        (self.paths, self.modes, self.catalog)
    }

    /// Checks that every path links only to records of the expected variant.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ModeLinkIntegrity`] for the first bad link.
    pub fn validate(&self) -> Result<(), TopologyError> {
        self.paths.iter().try_for_each(|path| self.modes.validate_links(path))
    }

    // ── Display-level reads ───────────────────────────────────────────────────

    pub fn path(&self, id: DisplayId) -> Result<&PathInfo, TopologyError> {
        let index = self.catalog.path_index(id)?;
        Ok(&self.paths[index])
    }

    pub fn is_active(&self, id: DisplayId) -> Result<bool, TopologyError> {
        Ok(self.path(id)?.is_active())
    }

    pub fn source_mode(&self, id: DisplayId) -> Result<&SourceMode, TopologyError> {
        let index = self.active_path_index(id)?;
        self.source_mode_of_path(index)
    }

    pub fn position(&self, id: DisplayId) -> Result<Point, TopologyError> {
        Ok(self.source_mode(id)?.position)
    }

    /// Returns `true` if the display's desktop starts at the origin.
    pub fn is_primary(&self, id: DisplayId) -> Result<bool, TopologyError> {
        Ok(self.is_active(id)? && self.source_mode(id)?.is_primary())
    }

    /// The lowest display id sitting at the origin, if any.
    pub fn primary_display(&self) -> Option<DisplayId> {
        self.catalog.ids().find(|&id| self.is_primary(id).unwrap_or(false))
    }

    /// Active display ids in catalog order.
    pub fn active_displays(&self) -> Vec<DisplayId> {
        self.catalog
            .ids()
            .filter(|&id| self.is_active(id).unwrap_or(false))
            .collect()
    }

    /// Other displays sharing this display's desktop position.
    pub fn clone_peers(&self, id: DisplayId) -> Result<Vec<DisplayId>, TopologyError> {
        let index = self.active_path_index(id)?;
        let position = self.source_mode_of_path(index)?.position;
        let map = self.desktop_map()?;
        Ok(map
            .get(&position)
            .into_iter()
            .flatten()
            .filter(|&&member| member != index)
            .filter_map(|&member| self.catalog.display_id(member))
            .collect())
    }

    /// Groups active paths by the position of their source mode.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ModeLinkIntegrity`] if an active path's source
    /// link does not point at a source record.
    pub fn desktop_map(&self) -> Result<DesktopMap, TopologyError> {
        let mut map = DesktopMap::new();
        for (index, path) in self.paths.iter().enumerate() {
            if !path.is_active() {
                continue;
            }
            let Some(mode_idx) = path.source.mode_idx else {
                continue;
            };
            let position = self.modes.source(mode_idx)?.position;
            map.entry(position).or_default().push(index);
        }
        Ok(map)
    }

    // ── Crate-internal helpers ────────────────────────────────────────────────

    /// Runs `op` on a draft copy and installs the draft only on success.
    pub(crate) fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut DisplayTopology) -> Result<T, TopologyError>,
    ) -> Result<T, TopologyError> {
        let mut draft = self.clone();
        let value = op(&mut draft)?;
        *self = draft;
        Ok(value)
    }

    /// Best-effort display id for error messages about a path index.
    pub(crate) fn display_of(&self, path_index: usize) -> DisplayId {
        self.catalog.display_id(path_index).unwrap_or(DisplayId(0))
    }

    pub(crate) fn active_path_index(&self, id: DisplayId) -> Result<usize, TopologyError> {
        let index = self.catalog.path_index(id)?;
        let path = &self.paths[index];
        if !path.is_active() || path.source.mode_idx.is_none() {
            return Err(TopologyError::InactiveDisplay(id));
        }
        Ok(index)
    }

    pub(crate) fn source_index(&self, path_index: usize) -> Result<ModeIndex, TopologyError> {
        self.paths
            .get(path_index)
            .and_then(|p| p.source.mode_idx)
            .ok_or_else(|| TopologyError::InactiveDisplay(self.display_of(path_index)))
    }

    pub(crate) fn source_mode_of_path(&self, path_index: usize) -> Result<&SourceMode, TopologyError> {
        self.modes.source(self.source_index(path_index)?)
    }

    /// Position of `path_index` and every path in its clone group.
    pub(crate) fn group_of(&self, path_index: usize) -> Result<(Point, Vec<usize>), TopologyError> {
        let position = self.source_mode_of_path(path_index)?.position;
        let members = self.desktop_map()?.remove(&position).unwrap_or_default();
        Ok((position, members))
    }

    /// Source record indexes of `members`, without duplicates.
    pub(crate) fn group_source_indexes(
        &self,
        members: &[usize],
    ) -> Result<Vec<ModeIndex>, TopologyError> {
        let mut indexes = Vec::with_capacity(members.len());
        for &member in members {
            let index = self.source_index(member)?;
            self.modes.source(index)?;
            if !indexes.contains(&index) {
                indexes.push(index);
            }
        }
        Ok(indexes)
    }

    /// Replaces both arrays wholesale.  The catalog is kept: it depends only
    /// on the physical set of paths, which callers never reorder.
    pub(crate) fn install(&mut self, paths: Vec<PathInfo>, modes: ModeArena) {
        self.paths = paths;
        self.modes = modes;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
