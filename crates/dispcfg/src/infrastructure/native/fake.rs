//! In-memory display configuration service.
//!
//! Holds a path/mode array pair and answers queries from it.  Applying a
//! configuration replaces the pair, after filling in the modes the real
//! service would choose itself: active paths without a source or target
//! record get the record they had before (matched by physical target), or a
//! 1920x1080 desktop placed to the right of everything else.
//!
//! Failures can be scripted with [`FakeDisplayConfigApi::fail_next_apply`]
//! and [`FakeDisplayConfigApi::report_insufficient_buffer`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dispcfg_core::builder::{self, BuiltTopology, DisplaySpec, StaticDeviceNames, TopologyBuilder};
use dispcfg_core::{
    AdapterId, DeviceNameSource, ModeArena, ModeIndex, ModeInfo, ModeKind, OutputTechnology,
    PathInfo, PhysicalTarget, PixelFormat, Point, Rational, Region, SourceMode, TargetDeviceName,
    TargetMode, TopologyError,
};
use tracing::debug;

use crate::application::boundary::{
    ApplyFlags, BufferSizes, DisplayConfigApi, PreferredMode, QueriedConfig, QueryFlags,
    ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_PARAMETER, ERROR_NOT_FOUND,
};

const DEFAULT_WIDTH: u32 = 1920;
const DEFAULT_HEIGHT: u32 = 1080;

/// One call to [`DisplayConfigApi::apply_config`], successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedConfig {
    pub paths: Vec<PathInfo>,
    pub modes: Option<Vec<ModeInfo>>,
    pub flags: ApplyFlags,
}

#[derive(Debug, Default)]
struct FakeState {
    paths: Vec<PathInfo>,
    modes: Vec<ModeInfo>,
    names: StaticDeviceNames,
    preferred: HashMap<PhysicalTarget, PreferredMode>,
    apply_failures: VecDeque<i32>,
    insufficient_rounds: u32,
    submissions: Vec<AppliedConfig>,
}

pub struct FakeDisplayConfigApi {
    state: Mutex<FakeState>,
}

impl FakeDisplayConfigApi {
    pub fn new(built: BuiltTopology) -> Self {
        Self {
            state: Mutex::new(FakeState {
                paths: built.paths,
                modes: built.modes,
                names: built.names,
                ..FakeState::default()
            }),
        }
    }

    /// A laptop panel with one external monitor beside it and a second one
    /// connected but switched off.
    pub fn demo() -> Self {
        let gpu = AdapterId::new(0x0001_2345, 0);
        let mut builder = TopologyBuilder::new();
        builder
            .adapter_name(gpu, r"\\?\PCI#VEN_10DE&DEV_2484#4&1a2b3c4d&0&0019")
            .push(
                DisplaySpec::active(gpu, 0x1100, Region::new(0, 0, 2560, 1600))
                    .technology(OutputTechnology::Internal)
                    .friendly_name("Built-in Display")
                    .with_desktop_image(),
            )
            .push(
                DisplaySpec::active(gpu, 0x1101, Region::new(2560, 0, 1920, 1080))
                    .friendly_name("DELL U2720Q"),
            )
            .push(
                DisplaySpec::inactive(gpu, 0x1102)
                    .technology(OutputTechnology::DisplayPortExternal)
                    .friendly_name("LG 27UL850"),
            );
        Self::new(builder.build())
    }

    /// Makes the next apply fail with `code`.  Calls queue up.
    pub fn fail_next_apply(&self, code: i32) {
        self.state().apply_failures.push_back(code);
    }

    /// Makes the next `rounds` configuration queries report a buffer that
    /// is too small.
    pub fn report_insufficient_buffer(&self, rounds: u32) {
        self.state().insufficient_rounds = rounds;
    }

    pub fn set_preferred_mode(&self, target: PhysicalTarget, mode: PreferredMode) {
        self.state().preferred.insert(target, mode);
    }

    /// Every apply call so far, oldest first.
    pub fn submissions(&self) -> Vec<AppliedConfig> {
        self.state().submissions.clone()
    }

    /// The arrays as they are now, inactive paths included.
    pub fn current(&self) -> QueriedConfig {
        let state = self.state();
        QueriedConfig { paths: state.paths.clone(), modes: state.modes.clone() }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FakeState {
    fn visible_paths(&self, flags: QueryFlags) -> Vec<PathInfo> {
        let only_active = flags.contains(QueryFlags::ONLY_ACTIVE_PATHS);
        self.paths.iter().filter(|p| !only_active || p.is_active()).cloned().collect()
    }
}

impl DisplayConfigApi for FakeDisplayConfigApi {
    fn query_sizes(&self, flags: QueryFlags) -> Result<BufferSizes, TopologyError> {
        let state = self.state();
        Ok(BufferSizes {
            paths: state.visible_paths(flags).len() as u32,
            modes: state.modes.len() as u32,
        })
    }

    fn query_config(
        &self,
        flags: QueryFlags,
        sizes: BufferSizes,
    ) -> Result<QueriedConfig, TopologyError> {
        let mut state = self.state();
        if state.insufficient_rounds > 0 {
            state.insufficient_rounds -= 1;
            return Err(query_error(ERROR_INSUFFICIENT_BUFFER));
        }

        let paths = state.visible_paths(flags);
        if (sizes.paths as usize) < paths.len() || (sizes.modes as usize) < state.modes.len() {
            return Err(query_error(ERROR_INSUFFICIENT_BUFFER));
        }
        Ok(QueriedConfig { paths, modes: state.modes.clone() })
    }

    fn apply_config(
        &self,
        paths: &[PathInfo],
        modes: Option<Vec<ModeInfo>>,
        flags: ApplyFlags,
    ) -> Result<(), TopologyError> {
        let mut state = self.state();
        state.submissions.push(AppliedConfig { paths: paths.to_vec(), modes: modes.clone(), flags });

        if let Some(code) = state.apply_failures.pop_front() {
            debug!(code, "scripted apply failure");
            return Err(apply_error(code));
        }
        if paths.is_empty() {
            return Err(apply_error(ERROR_INVALID_PARAMETER));
        }

        let mut paths = paths.to_vec();
        let modes = match (flags.contains(ApplyFlags::TOPOLOGY_SUPPLIED), modes) {
            (true, None) => {
                paths.iter_mut().for_each(PathInfo::clear_mode_links);
                Vec::new()
            }
            (false, Some(modes)) => modes,
            _ => return Err(apply_error(ERROR_INVALID_PARAMETER)),
        };

        let arena = ModeArena::new(modes);
        for path in &paths {
            if let Err(e) = arena.validate_links(path) {
                debug!(error = %e, "rejecting submitted configuration");
                return Err(apply_error(ERROR_INVALID_PARAMETER));
            }
        }
        if !flags.contains(ApplyFlags::APPLY) {
            return Ok(());
        }

        let prior = PriorModes::collect(&state.paths, &state.modes);
        let (mut paths, modes) = settle(paths, arena, &prior);

        let submitted: HashSet<PhysicalTarget> =
            paths.iter().map(PathInfo::physical_target).collect();
        for path in &state.paths {
            if !submitted.contains(&path.physical_target()) {
                let mut kept = path.clone();
                kept.deactivate();
                kept.source.clone_group_id = None;
                paths.push(kept);
            }
        }

        debug!(paths = paths.len(), modes = modes.len(), %flags, "fake configuration applied");
        state.paths = paths;
        state.modes = modes;
        Ok(())
    }

    fn preferred_mode(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<PreferredMode, TopologyError> {
        let state = self.state();
        let target = PhysicalTarget { adapter_id, target_id };
        if let Some(mode) = state.preferred.get(&target) {
            return Ok(mode.clone());
        }
        if !state.paths.iter().any(|p| p.physical_target() == target) {
            return Err(TopologyError::NativeApi {
                operation: "DisplayConfigGetDeviceInfo",
                code: ERROR_NOT_FOUND,
            });
        }
        let region = Region::new(0, 0, DEFAULT_WIDTH, DEFAULT_HEIGHT);
        Ok(PreferredMode {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            target_mode: builder::target_mode(region, Rational::new(60_000, 1000)),
        })
    }

    fn target_device_name(
        &self,
        adapter_id: AdapterId,
        target_id: u32,
    ) -> Result<TargetDeviceName, TopologyError> {
        self.state().names.target_device_name(adapter_id, target_id)
    }

    fn adapter_name(&self, adapter_id: AdapterId) -> Result<String, TopologyError> {
        self.state().names.adapter_name(adapter_id)
    }
}

fn query_error(code: i32) -> TopologyError {
    TopologyError::NativeApi { operation: "QueryDisplayConfig", code }
}

fn apply_error(code: i32) -> TopologyError {
    TopologyError::NativeApi { operation: "SetDisplayConfig", code }
}

// ── Mode selection ────────────────────────────────────────────────────────────

/// Source and target records of the previously active paths.
#[derive(Default)]
struct PriorModes {
    sources: HashMap<PhysicalTarget, SourceMode>,
    targets: HashMap<PhysicalTarget, TargetMode>,
}

impl PriorModes {
    fn collect(paths: &[PathInfo], modes: &[ModeInfo]) -> Self {
        let arena = ModeArena::new(modes.to_vec());
        let mut prior = PriorModes::default();
        for path in paths.iter().filter(|p| p.is_active()) {
            let target = path.physical_target();
            if let Some(mode) = path.source.mode_idx.and_then(|i| arena.source(i).ok()) {
                prior.sources.insert(target, mode.clone());
            }
            if let Some(mode) = path.target.mode_idx.and_then(|i| arena.target(i).ok()) {
                prior.targets.insert(target, mode.clone());
            }
        }
        prior
    }
}

/// Gives every active path a source and a target record.
///
/// Paths that were active before are handled first so that new desktops are
/// placed after them.  Members of one clone group share a source record.
fn settle(
    mut paths: Vec<PathInfo>,
    mut arena: ModeArena,
    prior: &PriorModes,
) -> (Vec<PathInfo>, Vec<ModeInfo>) {
    let mut placed: HashMap<u32, ModeIndex> = HashMap::new();
    for path in paths.iter().filter(|p| p.is_active()) {
        if let (Some(index), Some(group)) = (path.source.mode_idx, path.source.clone_group_id) {
            placed.entry(group).or_insert(index);
        }
    }

    let unlinked: Vec<usize> = (0..paths.len())
        .filter(|&i| paths[i].is_active() && paths[i].source.mode_idx.is_none())
        .collect();
    let (known, fresh): (Vec<usize>, Vec<usize>) = unlinked
        .into_iter()
        .partition(|&i| prior.sources.contains_key(&paths[i].physical_target()));

    for i in known.into_iter().chain(fresh) {
        let group = paths[i].source.clone_group_id;
        let index = match group.and_then(|g| placed.get(&g).copied()) {
            Some(index) => index,
            None => {
                let mode = prior
                    .sources
                    .get(&paths[i].physical_target())
                    .cloned()
                    .unwrap_or_else(|| SourceMode {
                        width: DEFAULT_WIDTH,
                        height: DEFAULT_HEIGHT,
                        pixel_format: PixelFormat::Bpp32,
                        position: Point::new(right_edge(&paths, &arena), 0),
                    });
                let index = arena.append(ModeInfo {
                    adapter_id: paths[i].source.adapter_id,
                    id: paths[i].source.id,
                    kind: ModeKind::Source(mode),
                });
                if let Some(g) = group {
                    placed.insert(g, index);
                }
                index
            }
        };
        paths[i].source.mode_idx = Some(index);
    }

    for path in paths.iter_mut().filter(|p| p.is_active() && p.target.mode_idx.is_none()) {
        let target = path.physical_target();
        let mode = match prior.targets.get(&target) {
            Some(mode) => mode.clone(),
            None => {
                let (width, height) = path
                    .source
                    .mode_idx
                    .and_then(|i| arena.source(i).ok())
                    .map_or((DEFAULT_WIDTH, DEFAULT_HEIGHT), |m| (m.width, m.height));
                builder::target_mode(Region::new(0, 0, width, height), path.target.refresh_rate)
            }
        };
        path.target.mode_idx = Some(arena.append(ModeInfo {
            adapter_id: target.adapter_id,
            id: target.target_id,
            kind: ModeKind::Target(mode),
        }));
    }

    keep_primary_at_origin(&paths, &mut arena);
    (paths, arena.into_vec())
}

fn right_edge(paths: &[PathInfo], arena: &ModeArena) -> i32 {
    paths
        .iter()
        .filter_map(|p| p.source.mode_idx)
        .filter_map(|i| arena.source(i).ok())
        .map(|m| m.region().right())
        .max()
        .unwrap_or(0)
}

fn keep_primary_at_origin(paths: &[PathInfo], arena: &mut ModeArena) {
    let positions: Vec<Point> = paths
        .iter()
        .filter(|p| p.is_active())
        .filter_map(|p| p.source.mode_idx)
        .filter_map(|i| arena.source(i).ok())
        .map(|m| m.position)
        .collect();
    if positions.contains(&Point::ORIGIN) {
        return;
    }
    if let Some(anchor) = positions.first().copied() {
        for mode in arena.source_modes_mut() {
            mode.position = Point::new(
                mode.position.x.saturating_sub(anchor.x),
                mode.position.y.saturating_sub(anchor.y),
            );
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn source_position(config: &QueriedConfig, path: usize) -> Point {
        let arena = ModeArena::new(config.modes.clone());
        let index = config.paths[path].source.mode_idx.expect("source link");
        arena.source(index).expect("source record").position
    }

    #[test]
    fn test_only_active_query_hides_inactive_paths() {
        let api = FakeDisplayConfigApi::demo();

        let all = api.query_sizes(QueryFlags::snapshot(true)).unwrap();
        let active = api.query_sizes(QueryFlags::snapshot(false)).unwrap();

        assert_eq!(all.paths, 3);
        assert_eq!(active.paths, 2);
    }

    #[test]
    fn test_insufficient_buffer_is_reported_for_scripted_rounds() {
        // Arrange
        let api = FakeDisplayConfigApi::demo();
        api.report_insufficient_buffer(2);
        let flags = QueryFlags::snapshot(true);
        let sizes = api.query_sizes(flags).unwrap();

        // Act
        let first = api.query_config(flags, sizes);
        let second = api.query_config(flags, sizes);
        let third = api.query_config(flags, sizes);

        // Assert
        assert_eq!(first.unwrap_err().native_code(), Some(ERROR_INSUFFICIENT_BUFFER));
        assert_eq!(second.unwrap_err().native_code(), Some(ERROR_INSUFFICIENT_BUFFER));
        assert_eq!(third.unwrap().paths.len(), 3);
    }

    #[test]
    fn test_undersized_buffers_are_rejected() {
        let api = FakeDisplayConfigApi::demo();

        let result = api.query_config(QueryFlags::snapshot(true), BufferSizes { paths: 1, modes: 1 });

        assert_eq!(result.unwrap_err().native_code(), Some(ERROR_INSUFFICIENT_BUFFER));
    }

    #[test]
    fn test_topology_supplied_apply_places_new_desktop_after_survivors() {
        // Arrange
        let api = FakeDisplayConfigApi::demo();
        let mut paths = api.current().paths;
        paths[1].deactivate();
        paths[2].flags.set_active(true);
        let flags = ApplyFlags::TOPOLOGY_SUPPLIED | ApplyFlags::APPLY;

        // Act
        api.apply_config(&paths, None, flags).unwrap();

        // Assert
        let config = api.current();
        assert!(config.paths[2].is_active());
        assert!(!config.paths[1].is_active());
        assert_eq!(source_position(&config, 0), Point::ORIGIN);
        assert_eq!(source_position(&config, 2), Point::new(2560, 0));
    }

    #[test]
    fn test_supplied_modes_with_broken_link_are_rejected() {
        let api = FakeDisplayConfigApi::demo();
        let before = api.current();
        let mut paths = before.paths.clone();
        paths[0].source.mode_idx = Some(99);

        let result = api.apply_config(
            &paths,
            Some(before.modes.clone()),
            ApplyFlags::USE_SUPPLIED_DISPLAY_CONFIG | ApplyFlags::APPLY,
        );

        assert_eq!(result.unwrap_err().native_code(), Some(ERROR_INVALID_PARAMETER));
        assert_eq!(api.current(), before);
    }

    #[test]
    fn test_validate_only_leaves_configuration_untouched() {
        let api = FakeDisplayConfigApi::demo();
        let before = api.current();
        let mut paths = before.paths.clone();
        paths[1].deactivate();

        let result = api.apply_config(
            &paths,
            Some(before.modes.clone()),
            ApplyFlags::USE_SUPPLIED_DISPLAY_CONFIG | ApplyFlags::VALIDATE,
        );

        assert!(result.is_ok());
        assert_eq!(api.current(), before);
    }

    #[test]
    fn test_scripted_failure_is_returned_once_and_logged() {
        let api = FakeDisplayConfigApi::demo();
        api.fail_next_apply(31);
        let config = api.current();
        let flags = ApplyFlags::USE_SUPPLIED_DISPLAY_CONFIG | ApplyFlags::APPLY;

        let first = api.apply_config(&config.paths, Some(config.modes.clone()), flags);
        let second = api.apply_config(&config.paths, Some(config.modes.clone()), flags);

        assert_eq!(first.unwrap_err().native_code(), Some(31));
        assert!(second.is_ok());
        assert_eq!(api.submissions().len(), 2);
    }

    #[test]
    fn test_primary_is_moved_to_origin_when_missing() {
        let api = FakeDisplayConfigApi::demo();
        let mut paths = api.current().paths;
        paths[0].deactivate();

        api.apply_config(&paths, None, ApplyFlags::TOPOLOGY_SUPPLIED | ApplyFlags::APPLY)
            .unwrap();

        assert_eq!(source_position(&api.current(), 1), Point::ORIGIN);
    }

    #[test]
    fn test_preferred_mode_for_unknown_target_is_not_found() {
        let api = FakeDisplayConfigApi::demo();

        let result = api.preferred_mode(AdapterId::new(9, 9), 1);

        assert_eq!(result.unwrap_err().native_code(), Some(ERROR_NOT_FOUND));
    }
}
