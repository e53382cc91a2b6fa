//! Read-only summary of one catalog display.

use std::fmt;

use dispcfg_core::{
    DisplayId, DisplayTopology, OutputTechnology, PhysicalTarget, Point, Rational, Rotation,
    Scaling, TopologyError,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayInfo {
    pub id: DisplayId,
    pub target: PhysicalTarget,
    pub adapter_name: String,
    pub friendly_name: String,
    pub output_technology: OutputTechnology,
    pub connector_instance: u32,
    pub active: bool,
    pub primary: bool,
    /// Desktop position and size, for active displays.
    pub position: Option<Point>,
    pub resolution: Option<(u32, u32)>,
    pub refresh_rate: Rational,
    pub rotation: Rotation,
    pub scaling: Scaling,
    pub clone_peers: Vec<DisplayId>,
}

impl DisplayInfo {
    /// Collects the summary of `id` from `topology`.
    ///
    /// # Errors
    ///
    /// [`TopologyError::UnknownDisplay`] if `id` is not in the catalog.
    pub fn from_topology(topology: &DisplayTopology, id: DisplayId) -> Result<Self, TopologyError> {
        let entry = topology.catalog().entry(id)?;
        let path = topology.path(id)?;
        let active = path.is_active();
        let source = if active { Some(topology.source_mode(id)?) } else { None };

        Ok(Self {
            id,
            target: entry.target,
            adapter_name: entry.adapter_name.clone(),
            friendly_name: entry.monitor_friendly_name.clone(),
            output_technology: entry.output_technology,
            connector_instance: entry.connector_instance,
            active,
            primary: source.is_some_and(|m| m.is_primary()),
            position: source.map(|m| m.position),
            resolution: source.map(|m| (m.width, m.height)),
            refresh_rate: path.target.refresh_rate,
            rotation: path.target.rotation,
            scaling: path.target.scaling,
            clone_peers: if active { topology.clone_peers(id)? } else { Vec::new() },
        })
    }
}

impl fmt::Display for DisplayInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.friendly_name)?;
        match (self.position, self.resolution) {
            (Some(p), Some((w, h))) => {
                write!(f, " {w}x{h}@{:.2}Hz at ({}, {})", self.refresh_rate.as_hz(), p.x, p.y)?
            }
            _ => write!(f, " (inactive)")?,
        }
        if self.primary {
            write!(f, " [primary]")?;
        }
        if !self.clone_peers.is_empty() {
            let peers: Vec<String> = self.clone_peers.iter().map(ToString::to_string).collect();
            write!(f, " cloned with {}", peers.join(", "))?;
        }
        Ok(())
    }
}
