//! The mode array and the operations that keep path→mode links valid.
//!
//! Paths refer to mode records by index.  Appending never moves existing
//! records.  Removing records is done by [`ModeArena::compact`], which builds
//! a brand-new array together with a rewritten copy of the path array; the
//! old pair stays untouched until the caller installs the new one.

use std::collections::HashMap;

use super::error::{integrity, TopologyError};
use super::topology::{
    DesktopImageInfo, ModeIndex, ModeInfo, ModeKind, PathInfo, SourceMode, TargetMode,
};

/// Which variant a mode link is expected to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Source,
    Target,
    DesktopImage,
}

impl Slot {
    fn name(self) -> &'static str {
        match self {
            Slot::Source => "source",
            Slot::Target => "target",
            Slot::DesktopImage => "desktop-image",
        }
    }

    fn matches(self, kind: &ModeKind) -> bool {
        matches!(
            (self, kind),
            (Slot::Source, ModeKind::Source(_))
                | (Slot::Target, ModeKind::Target(_))
                | (Slot::DesktopImage, ModeKind::DesktopImage(_))
        )
    }
}

/// Flat array of mode records with typed, index-checked access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeArena {
    modes: Vec<ModeInfo>,
}

impl ModeArena {
    pub fn new(modes: Vec<ModeInfo>) -> Self {
        Self { modes }
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn as_slice(&self) -> &[ModeInfo] {
        &self.modes
    }

    pub fn into_vec(self) -> Vec<ModeInfo> {
        self.modes
    }

    pub fn get(&self, index: ModeIndex) -> Option<&ModeInfo> {
        self.modes.get(index)
    }

    /// Appends a record and returns its index.
    pub fn append(&mut self, mode: ModeInfo) -> ModeIndex {
        self.modes.push(mode);
        self.modes.len() - 1
    }

    /// Returns the source mode stored at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ModeLinkIntegrity`] if `index` is out of range
    /// or holds another variant.
    pub fn source(&self, index: ModeIndex) -> Result<&SourceMode, TopologyError> {
        match self.modes.get(index).map(|m| &m.kind) {
            Some(ModeKind::Source(mode)) => Ok(mode),
            _ => Err(integrity(index, Slot::Source.name())),
        }
    }

    pub fn source_mut(&mut self, index: ModeIndex) -> Result<&mut SourceMode, TopologyError> {
        match self.modes.get_mut(index).map(|m| &mut m.kind) {
            Some(ModeKind::Source(mode)) => Ok(mode),
            _ => Err(integrity(index, Slot::Source.name())),
        }
    }

    pub fn target(&self, index: ModeIndex) -> Result<&TargetMode, TopologyError> {
        match self.modes.get(index).map(|m| &m.kind) {
            Some(ModeKind::Target(mode)) => Ok(mode),
            _ => Err(integrity(index, Slot::Target.name())),
        }
    }

    pub fn target_mut(&mut self, index: ModeIndex) -> Result<&mut TargetMode, TopologyError> {
        match self.modes.get_mut(index).map(|m| &mut m.kind) {
            Some(ModeKind::Target(mode)) => Ok(mode),
            _ => Err(integrity(index, Slot::Target.name())),
        }
    }

    pub fn desktop_image(&self, index: ModeIndex) -> Result<&DesktopImageInfo, TopologyError> {
        match self.modes.get(index).map(|m| &m.kind) {
            Some(ModeKind::DesktopImage(info)) => Ok(info),
            _ => Err(integrity(index, Slot::DesktopImage.name())),
        }
    }

    pub fn desktop_image_mut(
        &mut self,
        index: ModeIndex,
    ) -> Result<&mut DesktopImageInfo, TopologyError> {
        match self.modes.get_mut(index).map(|m| &mut m.kind) {
            Some(ModeKind::DesktopImage(info)) => Ok(info),
            _ => Err(integrity(index, Slot::DesktopImage.name())),
        }
    }

    /// Iterates over every source mode record, referenced or not.
    pub fn source_modes(&self) -> impl Iterator<Item = &SourceMode> {
        self.modes.iter().filter_map(|m| match &m.kind {
            ModeKind::Source(mode) => Some(mode),
            _ => None,
        })
    }

    /// Mutable counterpart of [`ModeArena::source_modes`].
    pub fn source_modes_mut(&mut self) -> impl Iterator<Item = &mut SourceMode> {
        self.modes.iter_mut().filter_map(|m| match &mut m.kind {
            ModeKind::Source(mode) => Some(mode),
            _ => None,
        })
    }

    /// Checks that every link of `path` points at a record of the right variant.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ModeLinkIntegrity`] for the first bad link.
    pub fn validate_links(&self, path: &PathInfo) -> Result<(), TopologyError> {
        self.check(path.source.mode_idx, Slot::Source)?;
        self.check(path.target.mode_idx, Slot::Target)?;
        self.check(path.target.desktop_mode_idx, Slot::DesktopImage)?;
        Ok(())
    }

    /// Builds a new arena holding only the records still referenced by paths
    /// other than `removed`, and a copy of `paths` with every link rewritten.
    ///
    /// Paths are visited in `order` (the catalog order) first, then any
    /// remaining path in raw order.  For each path the target, source and
    /// desktop-image records are appended in that order.  A record shared by
    /// several paths is appended once.  The removed path comes back with all
    /// three links cleared; its flags are left for the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ModeLinkIntegrity`] if a surviving path links
    /// to a missing record or a record of the wrong variant.  `self` is never
    /// modified.
    pub fn compact(
        &self,
        paths: &[PathInfo],
        order: &[usize],
        removed: usize,
    ) -> Result<(ModeArena, Vec<PathInfo>), TopologyError> {
        let mut new_paths = paths.to_vec();
        if let Some(path) = new_paths.get_mut(removed) {
            path.clear_mode_links();
        }

        let mut arena = ModeArena::default();
        let mut remap: HashMap<ModeIndex, ModeIndex> = HashMap::new();
        let mut visited = vec![false; paths.len()];

        let visit_order = order.iter().copied().chain(0..paths.len());
        for path_index in visit_order {
            if path_index >= paths.len() || path_index == removed || visited[path_index] {
                continue;
            }
            visited[path_index] = true;

            let path = &mut new_paths[path_index];
            path.target.mode_idx =
                self.carry(path.target.mode_idx, Slot::Target, &mut arena, &mut remap)?;
            path.source.mode_idx =
                self.carry(path.source.mode_idx, Slot::Source, &mut arena, &mut remap)?;
            path.target.desktop_mode_idx = self.carry(
                path.target.desktop_mode_idx,
                Slot::DesktopImage,
                &mut arena,
                &mut remap,
            )?;
        }

        Ok((arena, new_paths))
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn check(&self, link: Option<ModeIndex>, slot: Slot) -> Result<(), TopologyError> {
        match link {
            None => Ok(()),
            Some(index) => match self.modes.get(index) {
                Some(mode) if slot.matches(&mode.kind) => Ok(()),
                _ => Err(integrity(index, slot.name())),
            },
        }
    }

    /// Copies the record behind `link` into `arena` (once) and returns its new index.
    fn carry(
        &self,
        link: Option<ModeIndex>,
        slot: Slot,
        arena: &mut ModeArena,
        remap: &mut HashMap<ModeIndex, ModeIndex>,
    ) -> Result<Option<ModeIndex>, TopologyError> {
        let Some(old) = link else {
            return Ok(None);
        };
        self.check(link, slot)?;
        if let Some(&new) = remap.get(&old) {
            return Ok(Some(new));
        }
        let new = arena.append(self.modes[old].clone());
        remap.insert(old, new);
        Ok(Some(new))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
