//! Display catalog: the stable, 1-based display numbering callers see.
//!
//! The raw path array contains one path per possible source→target
//! combination, so the same monitor usually shows up several times.  The
//! catalog keeps the first path seen for every connected physical target and
//! orders the survivors the way the platform's display settings page tends
//! to number them.
//!
//! # Ordering heuristic
//!
//! The platform does not document its numbering.  The order used here is an
//! approximation and must not be treated as a contract:
//!
//! 1. adapter name, lexicographic;
//! 2. output technology band (internal panel first, HDMI last);
//! 3. connector instance within a band.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::error::TopologyError;
use super::topology::{AdapterId, DisplayId, OutputTechnology, PathInfo, PhysicalTarget};

/// Device-name metadata for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDeviceName {
    pub monitor_friendly_name: String,
    pub monitor_device_path: String,
    pub output_technology: OutputTechnology,
    pub connector_instance: u32,
}

/// Source of the name metadata the catalog orders by.
///
/// Implemented by the native boundary in production and by
/// [`crate::builder::StaticDeviceNames`] in tests.
pub trait DeviceNameSource {
    /// Returns the name metadata of `target_id` on `adapter_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NativeApi`] if the lookup fails.
    fn target_device_name(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<TargetDeviceName, TopologyError>;

    /// Returns the device path of the adapter.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NativeApi`] if the lookup fails.
    fn adapter_name(&self, adapter_id: AdapterId) -> Result<String, TopologyError>;
}

/// One catalog slot: a path index plus the metadata used to order it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub path_index: usize,
    pub target: PhysicalTarget,
    pub adapter_name: String,
    pub output_technology: OutputTechnology,
    pub connector_instance: u32,
    pub monitor_friendly_name: String,
}

impl CatalogEntry {
    fn rank(&self) -> u32 {
        technology_priority(self.output_technology).saturating_add(self.connector_instance)
    }
}

/// Priority band of an output technology.  Lower sorts first.
pub fn technology_priority(technology: OutputTechnology) -> u32 {
    match technology {
        OutputTechnology::Internal => 50,
        OutputTechnology::DisplayPortEmbedded | OutputTechnology::UdiEmbedded => 100,
        OutputTechnology::Dvi => 150,
        OutputTechnology::DisplayPortExternal => 200,
        OutputTechnology::Hdmi => 250,
        _ => 300,
    }
}

/// Returns the raw-order indexes of paths that can drive a connected monitor,
/// keeping only the first path per physical target.
pub fn available_indexes(paths: &[PathInfo]) -> Vec<usize> {
    let mut seen: HashSet<PhysicalTarget> = HashSet::new();
    paths
        .iter()
        .enumerate()
        .filter(|(_, path)| path.target.available)
        .filter(|(_, path)| seen.insert(path.physical_target()))
        .map(|(index, _)| index)
        .collect()
}

/// Orders `indexes` by adapter name, technology band and connector instance.
///
/// The sort is stable, so paths that compare equal keep their raw order.
///
/// # Errors
///
/// Propagates name lookup failures from `names`.
pub fn sort_indexes(
    paths: &[PathInfo],
    indexes: &[usize],
    names: &dyn DeviceNameSource,
) -> Result<DisplayCatalog, TopologyError> {
    let mut adapter_names: HashMap<AdapterId, String> = HashMap::new();
    let mut entries = Vec::with_capacity(indexes.len());

    for &path_index in indexes {
        let Some(path) = paths.get(path_index) else {
            continue;
        };
        let target = path.physical_target();
        let adapter_name = match adapter_names.get(&target.adapter_id) {
            Some(name) => name.clone(),
            None => {
                let name = names.adapter_name(target.adapter_id)?;
                adapter_names.insert(target.adapter_id, name.clone());
                name
            }
        };
        let device = names.target_device_name(target.adapter_id, target.target_id)?;
        entries.push(CatalogEntry {
            path_index,
            target,
            adapter_name,
            output_technology: device.output_technology,
            connector_instance: device.connector_instance,
            monitor_friendly_name: device.monitor_friendly_name,
        });
    }

    entries.sort_by(|a, b| {
        a.adapter_name
            .cmp(&b.adapter_name)
            .then_with(|| a.rank().cmp(&b.rank()))
    });

    debug!(displays = entries.len(), "display catalog built");
    Ok(DisplayCatalog { entries })
}

/// Ordered list of display slots.  Display id `n` is entry `n - 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayCatalog {
    entries: Vec<CatalogEntry>,
}

impl DisplayCatalog {
    /// Builds the catalog for `paths`.
    ///
    /// # Errors
    ///
    /// Propagates name lookup failures from `names`.
    pub fn build(paths: &[PathInfo], names: &dyn DeviceNameSource) -> Result<Self, TopologyError> {
        sort_indexes(paths, &available_indexes(paths), names)
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Path indexes in catalog order.
    pub fn path_indexes(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.path_index).collect()
    }

    /// Every display id, ascending.
    pub fn ids(&self) -> impl Iterator<Item = DisplayId> + '_ {
        (1..=self.entries.len() as u32).map(DisplayId)
    }

    pub fn entry(&self, id: DisplayId) -> Result<&CatalogEntry, TopologyError> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or(TopologyError::UnknownDisplay(id))
    }

    /// Translates a display id into a path-array index.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownDisplay`] if `id` is 0 or past the end.
    pub fn path_index(&self, id: DisplayId) -> Result<usize, TopologyError> {
        self.entry(id).map(|e| e.path_index)
    }

    /// Translates a path-array index back into a display id.
    pub fn display_id(&self, path_index: usize) -> Option<DisplayId> {
        self.entries
            .iter()
            .position(|e| e.path_index == path_index)
            .map(|i| DisplayId(i as u32 + 1))
    }

    /// Finds the display driving `target`.
    pub fn display_for_target(&self, target: PhysicalTarget) -> Option<DisplayId> {
        self.entries
            .iter()
            .position(|e| e.target == target)
            .map(|i| DisplayId(i as u32 + 1))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
