//! Programmatic construction of path/mode array pairs.
//!
//! Used by tests, benchmarks and the in-memory display service.  Each
//! [`DisplaySpec`] becomes one path; active specs also get a target record, a
//! source record and optionally a desktop-image record.
//!
//! ```
//! use dispcfg_core::builder::{DisplaySpec, TopologyBuilder};
//! use dispcfg_core::{AdapterId, Region};
//!
//! let gpu = AdapterId::new(1, 0);
//! let mut builder = TopologyBuilder::new();
//! builder
//!     .push(DisplaySpec::active(gpu, 1, Region::new(0, 0, 1920, 1080)))
//!     .push(DisplaySpec::inactive(gpu, 2));
//! let topology = builder.build().into_topology().unwrap();
//! assert_eq!(topology.catalog().len(), 2);
//! ```

use std::collections::HashMap;

use crate::domain::catalog::{DeviceNameSource, TargetDeviceName};
use crate::domain::display_topology::DisplayTopology;
use crate::domain::error::TopologyError;
use crate::domain::topology::{
    AdapterId, DesktopImageInfo, ModeInfo, ModeKind, OutputTechnology, PathFlags, PathInfo,
    PathSourceInfo, PathTargetInfo, PhysicalTarget, PixelFormat, Point, Rational, Region,
    Rotation, Scaling, ScanlineOrdering, Size, SourceMode, TargetMode, VideoSignalInfo,
};

/// Status returned by the name lookup for a target the builder never saw.
const ERROR_NOT_FOUND: i32 = 1168;

/// Description of one path to build.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySpec {
    adapter_id: AdapterId,
    target_id: u32,
    placement: Option<Region>,
    technology: OutputTechnology,
    connector_instance: u32,
    available: bool,
    desktop_image: bool,
    refresh_rate: Rational,
    rotation: Rotation,
    friendly_name: Option<String>,
}

impl DisplaySpec {
    /// An active display showing a desktop at `region`.
    pub fn active(adapter_id: AdapterId, target_id: u32, region: Region) -> Self {
        Self { placement: Some(region), ..Self::inactive(adapter_id, target_id) }
    }

    /// A connected display that is currently off.
    pub fn inactive(adapter_id: AdapterId, target_id: u32) -> Self {
        Self {
            adapter_id,
            target_id,
            placement: None,
            technology: OutputTechnology::Hdmi,
            connector_instance: 0,
            available: true,
            desktop_image: false,
            refresh_rate: Rational::new(60_000, 1000),
            rotation: Rotation::Identity,
            friendly_name: None,
        }
    }

    pub fn technology(mut self, technology: OutputTechnology) -> Self {
        self.technology = technology;
        self
    }

    pub fn connector(mut self, instance: u32) -> Self {
        self.connector_instance = instance;
        self
    }

    /// Marks the target as disconnected.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Gives an active display a desktop-image record covering its source.
    pub fn with_desktop_image(mut self) -> Self {
        self.desktop_image = true;
        self
    }

    pub fn refresh_rate(mut self, rate: Rational) -> Self {
        self.refresh_rate = rate;
        self
    }

    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }
}

/// Name metadata held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticDeviceNames {
    adapters: HashMap<AdapterId, String>,
    targets: HashMap<PhysicalTarget, TargetDeviceName>,
}

impl StaticDeviceNames {
    pub fn insert_adapter(&mut self, adapter_id: AdapterId, name: impl Into<String>) {
        self.adapters.insert(adapter_id, name.into());
    }

    pub fn insert_target(&mut self, target: PhysicalTarget, name: TargetDeviceName) {
        self.targets.insert(target, name);
    }
}

impl DeviceNameSource for StaticDeviceNames {
    fn target_device_name(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<TargetDeviceName, TopologyError> {
        self.targets
            .get(&PhysicalTarget { adapter_id, target_id })
            .cloned()
            .ok_or(TopologyError::NativeApi {
                operation: "DisplayConfigGetDeviceInfo",
                code: ERROR_NOT_FOUND,
            })
    }

    fn adapter_name(&self, adapter_id: AdapterId) -> Result<String, TopologyError> {
        Ok(self
            .adapters
            .get(&adapter_id)
            .cloned()
            .unwrap_or_else(|| default_adapter_name(adapter_id)))
    }
}

fn default_adapter_name(adapter_id: AdapterId) -> String {
    format!(r"\\?\PCI#DISPLAY#{adapter_id}")
}

/// Output of [`TopologyBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTopology {
    pub paths: Vec<PathInfo>,
    pub modes: Vec<ModeInfo>,
    pub names: StaticDeviceNames,
}

impl BuiltTopology {
    /// # Errors
    ///
    /// Propagates link validation and name lookup errors.
    pub fn into_topology(self) -> Result<DisplayTopology, TopologyError> {
        DisplayTopology::new(self.paths, self.modes, &self.names)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    specs: Vec<DisplaySpec>,
    adapter_names: HashMap<AdapterId, String>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adapter_name(&mut self, adapter_id: AdapterId, name: &str) -> &mut Self {
        self.adapter_names.insert(adapter_id, name.to_string());
        self
    }

    pub fn push(&mut self, spec: DisplaySpec) -> &mut Self {
        self.specs.push(spec);
        self
    }

    /// Lays out the arrays.  Active displays sharing a position share a
    /// clone group id; source ids are handed out per adapter in push order.
    pub fn build(&self) -> BuiltTopology {
        let mut paths = Vec::with_capacity(self.specs.len());
        let mut modes = Vec::new();
        let mut names = StaticDeviceNames::default();
        let mut next_source_id: HashMap<AdapterId, u32> = HashMap::new();
        let mut groups: HashMap<Point, u32> = HashMap::new();

        for (adapter_id, name) in &self.adapter_names {
            names.insert_adapter(*adapter_id, name.clone());
        }

        for spec in &self.specs {
            let target = PhysicalTarget { adapter_id: spec.adapter_id, target_id: spec.target_id };
            names.targets.entry(target).or_insert_with(|| TargetDeviceName {
                monitor_friendly_name: spec
                    .friendly_name
                    .clone()
                    .unwrap_or_else(|| format!("Monitor {}", spec.target_id)),
                monitor_device_path: format!(r"\\?\DISPLAY#{}#{}", spec.adapter_id, spec.target_id),
                output_technology: spec.technology,
                connector_instance: spec.connector_instance,
            });

            let mut path = PathInfo {
                source: PathSourceInfo {
                    adapter_id: spec.adapter_id,
                    id: 0,
                    mode_idx: None,
                    clone_group_id: None,
                    status_flags: 0,
                },
                target: PathTargetInfo {
                    adapter_id: spec.adapter_id,
                    id: spec.target_id,
                    mode_idx: None,
                    desktop_mode_idx: None,
                    output_technology: spec.technology,
                    rotation: spec.rotation,
                    scaling: Scaling::Preferred,
                    refresh_rate: spec.refresh_rate,
                    scanline_ordering: ScanlineOrdering::Progressive,
                    available: spec.available,
                    status_flags: 0,
                },
                flags: PathFlags(PathFlags::SUPPORT_VIRTUAL_MODE),
            };

            if let Some(region) = spec.placement {
                let source_id = next_source_id.entry(spec.adapter_id).or_insert(0);
                path.source.id = *source_id;
                *source_id += 1;

                let next_group = groups.len() as u32;
                path.source.clone_group_id =
                    Some(*groups.entry(region.origin()).or_insert(next_group));
                path.flags.set_active(true);

                path.target.mode_idx = Some(modes.len());
                modes.push(ModeInfo {
                    adapter_id: spec.adapter_id,
                    id: spec.target_id,
                    kind: ModeKind::Target(target_mode(region, spec.refresh_rate)),
                });

                path.source.mode_idx = Some(modes.len());
                modes.push(ModeInfo {
                    adapter_id: spec.adapter_id,
                    id: path.source.id,
                    kind: ModeKind::Source(SourceMode {
                        width: region.width,
                        height: region.height,
                        pixel_format: PixelFormat::Bpp32,
                        position: region.origin(),
                    }),
                });

                if spec.desktop_image {
                    let full = Region::new(0, 0, region.width, region.height);
                    path.target.desktop_mode_idx = Some(modes.len());
                    modes.push(ModeInfo {
                        adapter_id: spec.adapter_id,
                        id: spec.target_id,
                        kind: ModeKind::DesktopImage(DesktopImageInfo {
                            path_source_size: Point::new(region.width as i32, region.height as i32),
                            image_region: full,
                            image_clip: full,
                        }),
                    });
                }
            }

            paths.push(path);
        }

        BuiltTopology { paths, modes, names }
    }
}

/// A plausible signal timing for a `region`-sized mode at `refresh_rate`.
pub fn target_mode(region: Region, refresh_rate: Rational) -> TargetMode {
    let total = Size::new(region.width + region.width / 8, region.height + region.height / 24);
    let v_sync = refresh_rate;
    let pixel_rate = (u64::from(total.width) * u64::from(total.height))
        .saturating_mul(u64::from(v_sync.numerator))
        / u64::from(v_sync.denominator.max(1));
    TargetMode {
        signal: VideoSignalInfo {
            pixel_rate,
            h_sync_freq: Rational::new(
                total.height.saturating_mul(v_sync.numerator),
                v_sync.denominator,
            ),
            v_sync_freq: v_sync,
            active_size: Size::new(region.width, region.height),
            total_size: total,
            video_standard: 255,
            scanline_ordering: ScanlineOrdering::Progressive,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GPU: AdapterId = AdapterId::new(7, 0);

    #[test]
    fn test_build_assigns_source_ids_per_adapter_in_push_order() {
        let other = AdapterId::new(8, 0);
        let mut builder = TopologyBuilder::new();
        builder
            .push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)))
            .push(DisplaySpec::active(other, 1, Region::new(1920, 0, 1920, 1080)))
            .push(DisplaySpec::active(GPU, 2, Region::new(3840, 0, 1920, 1080)));

        let built = builder.build();

        let ids: Vec<u32> = built.paths.iter().map(|p| p.source.id).collect();
        assert_eq!(ids, vec![0, 0, 1]);
    }

    #[test]
    fn test_build_shares_clone_group_for_same_position() {
        let mut builder = TopologyBuilder::new();
        builder
            .push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)))
            .push(DisplaySpec::active(GPU, 2, Region::new(0, 0, 1920, 1080)))
            .push(DisplaySpec::active(GPU, 3, Region::new(1920, 0, 1920, 1080)));

        let built = builder.build();

        let groups: Vec<Option<u32>> = built.paths.iter().map(|p| p.source.clone_group_id).collect();
        assert_eq!(groups, vec![Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn test_inactive_spec_has_no_mode_links() {
        let mut builder = TopologyBuilder::new();
        builder.push(DisplaySpec::inactive(GPU, 4));

        let built = builder.build();

        assert!(built.modes.is_empty());
        assert!(!built.paths[0].is_active());
        assert_eq!(built.paths[0].source.mode_idx, None);
    }

    #[test]
    fn test_desktop_image_is_linked_when_requested() {
        let mut builder = TopologyBuilder::new();
        builder.push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 800, 600)).with_desktop_image());

        let built = builder.build();

        assert_eq!(built.modes.len(), 3);
        assert_eq!(built.paths[0].target.desktop_mode_idx, Some(2));
    }

    #[test]
    fn test_static_names_report_unknown_target_as_native_error() {
        let names = StaticDeviceNames::default();

        let result = names.target_device_name(GPU, 9);

        assert_eq!(result.unwrap_err().native_code(), Some(ERROR_NOT_FOUND));
        assert_eq!(names.adapter_name(GPU).unwrap(), default_adapter_name(GPU));
    }
}
