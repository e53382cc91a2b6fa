//! Topology transitions: primary selection, disable, clone and the
//! enable/disable planner.
//!
//! `disable` and `clone_display` edit the arrays in place and keep them
//! ready to submit with supplied modes.  Enabling cannot be done that way:
//! a newly enabled display needs modes only the display service can pick.
//! [`DisplayTopology::plan_enable_disable`] therefore produces a path array
//! for the service to complete, see [`SourceIdStrategy`].

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::display_topology::DisplayTopology;
use super::error::TopologyError;
use super::layout::{ensure_distinct, shifted_for_removal};
use super::mode_arena::ModeArena;
use super::topology::{
    AdapterId, DisplayId, ModeInfo, ModeKind, PathInfo, PhysicalTarget, Point, SourceMode,
};

impl DisplayTopology {
    /// Makes `id`'s group the primary one by moving it to the origin.  Every
    /// other group shifts by the same vector, so relative layout is kept.
    ///
    /// # Errors
    ///
    /// [`TopologyError::UnknownDisplay`] or [`TopologyError::InactiveDisplay`].
    pub fn set_primary(&mut self, id: DisplayId) -> Result<(), TopologyError> {
        let index = self.active_path_index(id)?;
        self.set_primary_path(index)?;
        info!(display = %id, "primary display set");
        Ok(())
    }

    /// Turns a display off.
    ///
    /// The path loses its mode links and active bit, records nothing else
    /// uses are dropped from the mode array, and if the display was alone at
    /// its position the desktops beyond it slide in to close the gap.
    /// Disabling an inactive display does nothing.
    ///
    /// # Errors
    ///
    /// [`TopologyError::CannotDisablePrimary`] if the display is the only one
    /// at the origin.
    pub fn disable(&mut self, id: DisplayId) -> Result<(), TopologyError> {
        let index = self.catalog.path_index(id)?;
        if !self.paths[index].is_active() {
            debug!(display = %id, "display already inactive");
            return Ok(());
        }

        let removed = self.source_mode_of_path(index)?.clone();
        let (_, members) = self.group_of(index)?;
        let alone = members.len() <= 1;
        if removed.is_primary() && alone {
            return Err(TopologyError::CannotDisablePrimary(id));
        }

        let (modes, mut paths) =
            self.modes.compact(&self.paths, &self.catalog.path_indexes(), index)?;
        paths[index].deactivate();
        paths[index].source.clone_group_id = None;
        self.install(paths, modes);

        if alone {
            self.close_gap_after_removal(&removed);
        }
        info!(display = %id, "display disabled");
        Ok(())
    }

    /// Makes every destination show `source`'s desktop.
    ///
    /// Destinations take the source's position, size, clone group and
    /// desktop-image clip.  A destination whose source record is shared with
    /// a display outside the clone gets a record of its own.  Positions the
    /// destinations leave empty are closed up; if one of them was the
    /// origin, `source` becomes primary.
    ///
    /// # Errors
    ///
    /// [`TopologyError::EmptyDestination`], [`TopologyError::SelfClone`],
    /// [`TopologyError::ConflictingDisplayIds`], or
    /// [`TopologyError::InactiveDisplay`] for any inactive participant.
    pub fn clone_display(
        &mut self,
        source: DisplayId,
        destinations: &[DisplayId],
    ) -> Result<(), TopologyError> {
        if destinations.is_empty() {
            return Err(TopologyError::EmptyDestination);
        }
        if destinations.contains(&source) {
            return Err(TopologyError::SelfClone(source));
        }
        ensure_distinct(destinations)?;

        let source_index = self.active_path_index(source)?;
        let destination_indexes = destinations
            .iter()
            .map(|&id| self.active_path_index(id))
            .collect::<Result<Vec<_>, _>>()?;

        self.transact(|draft| {
            let template = draft.source_mode_of_path(source_index)?.clone();
            let clone_group = draft.paths[source_index].source.clone_group_id;
            let image = match draft.paths[source_index].target.desktop_mode_idx {
                Some(i) => Some(draft.modes.desktop_image(i)?.clone()),
                None => None,
            };

            let mut left_behind: Vec<SourceMode> = Vec::new();
            for &dest in &destination_indexes {
                let old_index = draft.source_index(dest)?;
                let old = draft.modes.source(old_index)?.clone();
                if old.position != template.position
                    && !left_behind.iter().any(|m| m.position == old.position)
                {
                    left_behind.push(old);
                }

                let shared = draft.paths.iter().enumerate().any(|(i, p)| {
                    i != dest
                        && p.is_active()
                        && p.source.mode_idx == Some(old_index)
                        && !destination_indexes.contains(&i)
                });
                let copy = template.clone();
                if shared {
                    let path = &draft.paths[dest];
                    let fresh = ModeInfo {
                        adapter_id: path.source.adapter_id,
                        id: path.source.id,
                        kind: ModeKind::Source(copy),
                    };
                    let new_index = draft.modes.append(fresh);
                    draft.paths[dest].source.mode_idx = Some(new_index);
                } else {
                    *draft.modes.source_mut(old_index)? = copy;
                }
                draft.paths[dest].source.clone_group_id = clone_group;

                if let Some(image) = &image {
                    match draft.paths[dest].target.desktop_mode_idx {
                        Some(i) => {
                            let own = draft.modes.desktop_image_mut(i)?;
                            own.path_source_size = image.path_source_size;
                            own.image_clip = image.image_clip;
                        }
                        None => {
                            let target = &draft.paths[dest].target;
                            let fresh = ModeInfo {
                                adapter_id: target.adapter_id,
                                id: target.id,
                                kind: ModeKind::DesktopImage(image.clone()),
                            };
                            let new_index = draft.modes.append(fresh);
                            draft.paths[dest].target.desktop_mode_idx = Some(new_index);
                        }
                    }
                } else if let Some(i) = draft.paths[dest].target.desktop_mode_idx {
                    let clip = &mut draft.modes.desktop_image_mut(i)?.image_clip;
                    clip.width = template.width;
                    clip.height = template.height;
                }
            }

            let occupied = draft.desktop_map()?;
            let mut vacated: Vec<SourceMode> = left_behind
                .into_iter()
                .filter(|m| !occupied.contains_key(&m.position))
                .collect();
            let origin_vacated = vacated.iter().any(SourceMode::is_primary);
            vacated.retain(|m| !m.is_primary());

            while !vacated.is_empty() {
                let removed = vacated.remove(0);
                draft.close_gap_after_removal(&removed);
                for pending in &mut vacated {
                    pending.position = shifted_for_removal(pending.position, &removed);
                }
            }

            if origin_vacated {
                draft.set_primary_path(source_index)?;
            }
            info!(source = %source, destinations = destinations.len(), "displays cloned");
            Ok(())
        })
    }

    /// Builds the path array for an enable/disable request.
    ///
    /// Disabled paths are deactivated.  Enabled paths are activated, each in
    /// a fresh clone group or all in one shared group when `as_clone` is set.
    /// Surviving active paths keep one clone group per desktop position.
    /// Source ids are then assigned per `strategy`.
    ///
    /// # Errors
    ///
    /// [`TopologyError::ConflictingDisplayIds`] if an id is repeated or
    /// listed for both enabling and disabling, and
    /// [`TopologyError::UnknownDisplay`] for an id outside the catalog.
    pub fn plan_enable_disable(
        &self,
        request: &EnableDisableRequest,
        strategy: SourceIdStrategy,
    ) -> Result<EnableDisablePlan, TopologyError> {
        request.validate()?;
        let enabled = request
            .enable
            .iter()
            .map(|&id| self.catalog.path_index(id))
            .collect::<Result<Vec<_>, _>>()?;
        let disabled = request
            .disable
            .iter()
            .map(|&id| self.catalog.path_index(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut paths = self.paths.clone();
        let mut groups: HashMap<Point, u32> = HashMap::new();
        let mut survivors = Vec::new();

        for (index, path) in self.paths.iter().enumerate() {
            if !path.is_active() || enabled.contains(&index) || disabled.contains(&index) {
                continue;
            }
            let position = self.source_mode_of_path(index)?.position;
            let next = groups.len() as u32;
            paths[index].source.clone_group_id = Some(*groups.entry(position).or_insert(next));
            survivors.push(index);
        }

        let mut next_group = groups.len() as u32;
        let shared_group = request.as_clone.then(|| {
            next_group += 1;
            next_group - 1
        });
        for &index in &enabled {
            let group = shared_group.unwrap_or_else(|| {
                next_group += 1;
                next_group - 1
            });
            let path = &mut paths[index];
            path.flags.set_active(true);
            path.clear_mode_links();
            path.source.clone_group_id = Some(group);
        }

        let mut freed: HashMap<AdapterId, Vec<u32>> = HashMap::new();
        for &index in &disabled {
            let path = &mut paths[index];
            if path.is_active() {
                freed.entry(path.source.adapter_id).or_default().push(path.source.id);
            }
            path.deactivate();
            path.source.clone_group_id = None;
        }

        let modes = match strategy {
            SourceIdStrategy::Renumber => {
                renumber_source_ids(&mut paths);
                paths.iter_mut().for_each(PathInfo::clear_mode_links);
                None
            }
            SourceIdStrategy::RecycleFreed => {
                recycle_source_ids(&mut paths, &survivors, &enabled, freed);
                let mut arena = self.modes.clone();
                let order = self.catalog.path_indexes();
                for &index in &disabled {
                    let (compacted, rewritten) = arena.compact(&paths, &order, index)?;
                    arena = compacted;
                    paths = rewritten;
                }
                Some(arena)
            }
        };

        debug!(
            enabled = enabled.len(),
            disabled = disabled.len(),
            ?strategy,
            "enable/disable planned"
        );
        Ok(EnableDisablePlan {
            paths,
            modes,
            enabled: enabled.iter().map(|&i| self.paths[i].physical_target()).collect(),
            disabled: disabled.iter().map(|&i| self.paths[i].physical_target()).collect(),
        })
    }

    /// Physical targets of `ids`, for re-resolving them in a later snapshot.
    ///
    /// # Errors
    ///
    /// [`TopologyError::UnknownDisplay`] for an id outside the catalog.
    pub fn physical_targets(&self, ids: &[DisplayId]) -> Result<Vec<PhysicalTarget>, TopologyError> {
        ids.iter().map(|&id| self.path(id).map(|p| p.physical_target())).collect()
    }

    /// Display ids of `targets` in this topology.
    ///
    /// # Errors
    ///
    /// [`TopologyError::AdapterLayoutChanged`] if any target has gone.
    pub fn resolve_targets(&self, targets: &[PhysicalTarget]) -> Result<Vec<DisplayId>, TopologyError> {
        targets
            .iter()
            .map(|&t| {
                self.catalog
                    .display_for_target(t)
                    .ok_or(TopologyError::AdapterLayoutChanged)
            })
            .collect()
    }
}

/// Displays to turn on and off in one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnableDisableRequest {
    pub enable: Vec<DisplayId>,
    pub disable: Vec<DisplayId>,
    /// Put every enabled display in one shared clone group.
    pub as_clone: bool,
}

impl EnableDisableRequest {
    /// # Errors
    ///
    /// [`TopologyError::ConflictingDisplayIds`] if any id appears twice
    /// across both lists.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let all: Vec<DisplayId> = self.enable.iter().chain(&self.disable).copied().collect();
        ensure_distinct(&all)
    }
}

/// How source ids are handed out when a plan is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceIdStrategy {
    /// Number every active path densely from 0 per adapter and leave all
    /// mode links for the display service to rebuild.
    Renumber,
    /// Keep surviving ids and links.  Enabled paths take the ids freed by
    /// disabled paths on their adapter first, lowest first, then the lowest
    /// id not in use.  Records of disabled paths are compacted away.
    RecycleFreed,
}

/// Result of [`DisplayTopology::plan_enable_disable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableDisablePlan {
    pub paths: Vec<PathInfo>,
    /// Mode array to submit alongside `paths`, if the strategy keeps one.
    pub modes: Option<ModeArena>,
    pub enabled: Vec<PhysicalTarget>,
    pub disabled: Vec<PhysicalTarget>,
}

fn renumber_source_ids(paths: &mut [PathInfo]) {
    let mut next: HashMap<AdapterId, u32> = HashMap::new();
    for path in paths.iter_mut().filter(|p| p.is_active()) {
        let id = next.entry(path.source.adapter_id).or_insert(0);
        path.source.id = *id;
        *id += 1;
    }
}

fn recycle_source_ids(
    paths: &mut [PathInfo],
    survivors: &[usize],
    enabled: &[usize],
    mut freed: HashMap<AdapterId, Vec<u32>>,
) {
    let mut used: HashMap<AdapterId, BTreeSet<u32>> = HashMap::new();
    for &index in survivors {
        let source = &paths[index].source;
        used.entry(source.adapter_id).or_default().insert(source.id);
    }
    for ids in freed.values_mut() {
        ids.sort_unstable();
        ids.dedup();
        ids.reverse();
    }

    for &index in enabled {
        let adapter = paths[index].source.adapter_id;
        let taken = used.entry(adapter).or_default();
        let recycled = freed.get_mut(&adapter).and_then(|ids| {
            while let Some(id) = ids.pop() {
                if !taken.contains(&id) {
                    return Some(id);
                }
            }
            None
        });
        let id = recycled.unwrap_or_else(|| (0..).find(|n| !taken.contains(n)).unwrap_or(0));
        taken.insert(id);
        paths[index].source.id = id;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{DisplaySpec, TopologyBuilder};
    use crate::domain::topology::Region;

    const GPU: AdapterId = AdapterId::new(1, 0);

    fn topology(specs: Vec<DisplaySpec>) -> DisplayTopology {
        let mut builder = TopologyBuilder::new();
        for spec in specs {
            builder.push(spec);
        }
        builder.build().into_topology().expect("topology")
    }

    fn row_of_three() -> DisplayTopology {
        topology(vec![
            DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)),
            DisplaySpec::active(GPU, 2, Region::new(1920, 0, 1920, 1080)),
            DisplaySpec::active(GPU, 3, Region::new(3840, 0, 1920, 1080)),
        ])
    }

    fn request(enable: &[u32], disable: &[u32]) -> EnableDisableRequest {
        EnableDisableRequest {
            enable: enable.iter().copied().map(DisplayId).collect(),
            disable: disable.iter().copied().map(DisplayId).collect(),
            as_clone: false,
        }
    }

    #[test]
    fn test_set_primary_moves_group_to_origin_and_shifts_others() {
        let mut topology = row_of_three();

        topology.set_primary(DisplayId(2)).unwrap();

        assert_eq!(topology.position(DisplayId(1)).unwrap(), Point::new(-1920, 0));
        assert_eq!(topology.position(DisplayId(2)).unwrap(), Point::ORIGIN);
        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 0));
    }

    #[test]
    fn test_set_primary_that_would_overflow_a_coordinate_moves_nothing() {
        let mut topology = topology(vec![
            DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)),
            DisplaySpec::active(GPU, 2, Region::new(-1920, 0, 1920, 1080)),
            DisplaySpec::active(GPU, 3, Region::new(i32::MAX - 100, 0, 100, 1080)),
        ]);
        let before = topology.clone();

        let result = topology.set_primary(DisplayId(2));

        assert_eq!(result, Err(TopologyError::CoordinateOverflow));
        assert_eq!(topology, before);
    }

    #[test]
    fn test_disable_middle_display_closes_gap_and_compacts_modes() {
        let mut topology = row_of_three();

        topology.disable(DisplayId(2)).unwrap();

        assert!(!topology.is_active(DisplayId(2)).unwrap());
        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 0));
        assert_eq!(topology.modes().len(), 4);
        assert!(topology.validate().is_ok());
    }

    #[test]
    fn test_disable_inactive_display_is_a_no_op() {
        let mut topology = topology(vec![
            DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)),
            DisplaySpec::inactive(GPU, 2),
        ]);
        let before = topology.clone();

        topology.disable(DisplayId(2)).unwrap();

        assert_eq!(topology, before);
    }

    #[test]
    fn test_disable_sole_primary_is_rejected() {
        let mut topology = row_of_three();

        let result = topology.disable(DisplayId(1));

        assert_eq!(result, Err(TopologyError::CannotDisablePrimary(DisplayId(1))));
    }

    #[test]
    fn test_disable_one_of_cloned_primaries_keeps_layout() {
        let mut topology = topology(vec![
            DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)),
            DisplaySpec::active(GPU, 2, Region::new(0, 0, 1920, 1080)),
            DisplaySpec::active(GPU, 3, Region::new(1920, 0, 1920, 1080)),
        ]);

        topology.disable(DisplayId(1)).unwrap();

        assert_eq!(topology.position(DisplayId(2)).unwrap(), Point::ORIGIN);
        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 0));
    }

    #[test]
    fn test_clone_moves_destination_and_closes_its_gap() {
        let mut topology = row_of_three();

        topology.clone_display(DisplayId(1), &[DisplayId(2)]).unwrap();

        assert_eq!(topology.position(DisplayId(2)).unwrap(), Point::ORIGIN);
        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 0));
        let groups: Vec<_> = topology.paths().iter().map(|p| p.source.clone_group_id).collect();
        assert_eq!(groups[0], groups[1]);
    }

    #[test]
    fn test_clone_from_secondary_onto_primary_makes_source_primary() {
        let mut topology = row_of_three();

        topology.clone_display(DisplayId(3), &[DisplayId(1)]).unwrap();

        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::ORIGIN);
        assert_eq!(topology.position(DisplayId(1)).unwrap(), Point::ORIGIN);
        assert_eq!(topology.position(DisplayId(2)).unwrap(), Point::new(-1920, 0));
    }

    #[test]
    fn test_clone_gives_destination_its_own_record_when_shared() {
        let mut built = {
            let mut builder = TopologyBuilder::new();
            builder
                .push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)))
                .push(DisplaySpec::active(GPU, 2, Region::new(1920, 0, 1280, 1024)))
                .push(DisplaySpec::active(GPU, 3, Region::new(1920, 0, 1280, 1024)));
            builder.build()
        };
        // Path 2 reuses path 1's source record.
        built.paths[2].source.mode_idx = built.paths[1].source.mode_idx;
        let mut topology = built.into_topology().unwrap();

        topology.clone_display(DisplayId(1), &[DisplayId(2)]).unwrap();

        assert_eq!(topology.position(DisplayId(2)).unwrap(), Point::ORIGIN);
        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 0));
        assert_eq!(topology.source_mode(DisplayId(2)).unwrap().width, 1920);
        assert_eq!(topology.source_mode(DisplayId(3)).unwrap().width, 1280);
    }

    #[test]
    fn test_clone_copies_desktop_image_to_destination() {
        let mut topology = topology(vec![
            DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)).with_desktop_image(),
            DisplaySpec::active(GPU, 2, Region::new(1920, 0, 1280, 1024)),
        ]);

        topology.clone_display(DisplayId(1), &[DisplayId(2)]).unwrap();

        let path = topology.path(DisplayId(2)).unwrap();
        let image = topology.modes().desktop_image(path.target.desktop_mode_idx.unwrap()).unwrap();
        assert_eq!(image.image_clip, Region::new(0, 0, 1920, 1080));
    }

    #[test]
    fn test_clone_resizes_destination_clip_when_source_has_no_image() {
        let mut topology = topology(vec![
            DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)),
            DisplaySpec::active(GPU, 2, Region::new(1920, 0, 1280, 1024)).with_desktop_image(),
        ]);

        topology.clone_display(DisplayId(1), &[DisplayId(2)]).unwrap();

        let path = topology.path(DisplayId(2)).unwrap();
        let image = topology.modes().desktop_image(path.target.desktop_mode_idx.unwrap()).unwrap();
        assert_eq!((image.image_clip.width, image.image_clip.height), (1920, 1080));
        assert_eq!(topology.position(DisplayId(2)).unwrap(), Point::ORIGIN);
    }

    #[test]
    fn test_clone_preconditions() {
        let mut topology = row_of_three();

        assert_eq!(topology.clone_display(DisplayId(1), &[]), Err(TopologyError::EmptyDestination));
        assert_eq!(
            topology.clone_display(DisplayId(1), &[DisplayId(1)]),
            Err(TopologyError::SelfClone(DisplayId(1)))
        );
        assert_eq!(
            topology.clone_display(DisplayId(1), &[DisplayId(2), DisplayId(2)]),
            Err(TopologyError::ConflictingDisplayIds(DisplayId(2)))
        );
    }

    #[test]
    fn test_plan_rejects_id_in_both_lists() {
        let topology = row_of_three();

        let result = topology.plan_enable_disable(&request(&[2], &[2]), SourceIdStrategy::Renumber);

        assert_eq!(result, Err(TopologyError::ConflictingDisplayIds(DisplayId(2))));
    }

    #[test]
    fn test_plan_renumber_assigns_dense_ids_and_clears_links() {
        let topology = topology(vec![
            DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)),
            DisplaySpec::active(GPU, 2, Region::new(1920, 0, 1920, 1080)),
            DisplaySpec::inactive(GPU, 3),
        ]);

        let plan = topology
            .plan_enable_disable(&request(&[3], &[2]), SourceIdStrategy::Renumber)
            .unwrap();

        let active: Vec<u32> =
            plan.paths.iter().filter(|p| p.is_active()).map(|p| p.source.id).collect();
        assert_eq!(active, vec![0, 1]);
        assert!(plan.paths.iter().all(|p| p.source.mode_idx.is_none()));
        assert!(plan.modes.is_none());
    }

    #[test]
    fn test_plan_recycle_reuses_freed_source_id() {
        let topology = topology(vec![
            DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)),
            DisplaySpec::active(GPU, 2, Region::new(1920, 0, 1920, 1080)),
            DisplaySpec::inactive(GPU, 3),
        ]);

        let plan = topology
            .plan_enable_disable(&request(&[3], &[2]), SourceIdStrategy::RecycleFreed)
            .unwrap();

        assert_eq!(plan.paths[0].source.id, 0);
        assert_eq!(plan.paths[2].source.id, 1);
        assert!(!plan.paths[1].is_active());
        let modes = plan.modes.expect("modes kept");
        assert_eq!(modes.len(), 2);
        assert!(plan.paths.iter().all(|p| modes.validate_links(p).is_ok()));
    }

    #[test]
    fn test_plan_as_clone_puts_enabled_displays_in_one_group() {
        let topology = topology(vec![
            DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)),
            DisplaySpec::inactive(GPU, 2),
            DisplaySpec::inactive(GPU, 3),
        ]);
        let mut req = request(&[2, 3], &[]);
        req.as_clone = true;

        let plan = topology.plan_enable_disable(&req, SourceIdStrategy::Renumber).unwrap();

        assert_eq!(plan.paths[0].source.clone_group_id, Some(0));
        assert_eq!(plan.paths[1].source.clone_group_id, Some(1));
        assert_eq!(plan.paths[2].source.clone_group_id, Some(1));
    }

    #[test]
    fn test_resolve_targets_reports_missing_target() {
        let topology = row_of_three();
        let gone = PhysicalTarget { adapter_id: AdapterId::new(9, 0), target_id: 1 };

        assert_eq!(topology.resolve_targets(&[gone]), Err(TopologyError::AdapterLayoutChanged));
    }
}
