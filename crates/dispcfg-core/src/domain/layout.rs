//! Desktop layout: where each position group sits on the virtual desktop.
//!
//! A position group (clone group) is every active path whose source mode has
//! the same top-left corner.  Groups move as a unit: each operation here
//! writes the new position into every source record the group links to.
//!
//! The primary display is the group at the origin.  Moving the primary
//! group therefore means moving everything else the opposite way.
//!
//! Operations validate their inputs before touching the arrays.  Those that
//! take more than one step run on a draft copy, so a failure leaves the
//! topology unchanged.

use tracing::debug;

use super::display_topology::DisplayTopology;
use super::error::TopologyError;
use super::topology::{extent, DisplayId, Point, Rational, Rotation, Scaling, SourceMode};

/// Edge of an anchor display to place another display against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RelativePosition {
    Left,
    Right,
    Above,
    Under,
}

/// Position of `point` after the desktop at `removed` disappears.
///
/// Modes further from the origin than the removed mode, on the same side,
/// slide towards the origin by the removed mode's extent.
pub(crate) fn shifted_for_removal(point: Point, removed: &SourceMode) -> Point {
    let origin = removed.position;
    let width = extent(removed.width);
    let height = extent(removed.height);
    let mut shifted = point;

    if origin.x > 0 && point.x > origin.x {
        shifted.x = shifted.x.saturating_sub(width);
    } else if origin.x < 0 && point.x < origin.x {
        shifted.x = shifted.x.saturating_add(width);
    }

    if origin.y > 0 && point.y > origin.y {
        shifted.y = shifted.y.saturating_sub(height);
    } else if origin.y < 0 && point.y < origin.y {
        shifted.y = shifted.y.saturating_add(height);
    }

    shifted
}

impl DisplayTopology {
    // ── Per-display settings ──────────────────────────────────────────────────

    /// Sets the desktop size of a display's whole position group.  Members
    /// with a desktop-image record get their clip resized too; the clip
    /// origin is left alone.
    ///
    /// # Errors
    ///
    /// [`TopologyError::UnknownDisplay`], [`TopologyError::InactiveDisplay`],
    /// or [`TopologyError::ModeLinkIntegrity`].
    pub fn set_resolution(
        &mut self,
        id: DisplayId,
        width: u32,
        height: u32,
    ) -> Result<(), TopologyError> {
        let index = self.active_path_index(id)?;
        let (_, members) = self.group_of(index)?;
        self.transact(|draft| {
            for source_index in draft.group_source_indexes(&members)? {
                let mode = draft.modes.source_mut(source_index)?;
                mode.width = width;
                mode.height = height;
            }
            for &member in &members {
                if let Some(image_index) = draft.paths[member].target.desktop_mode_idx {
                    let clip = &mut draft.modes.desktop_image_mut(image_index)?.image_clip;
                    clip.width = width;
                    clip.height = height;
                }
            }
            Ok(())
        })?;
        debug!(display = %id, width, height, "resolution set");
        Ok(())
    }

    /// Sets the vertical refresh rate of the display's target.
    ///
    /// # Errors
    ///
    /// [`TopologyError::UnknownDisplay`] or [`TopologyError::InactiveDisplay`].
    pub fn set_refresh_rate(&mut self, id: DisplayId, rate: Rational) -> Result<(), TopologyError> {
        let index = self.active_path_index(id)?;
        if let Some(target_index) = self.paths[index].target.mode_idx {
            self.modes.target_mut(target_index)?.signal.v_sync_freq = rate;
        }
        self.paths[index].target.refresh_rate = rate;
        debug!(display = %id, hz = rate.as_hz(), "refresh rate set");
        Ok(())
    }

    /// Rotates every member of the display's position group.  Switching
    /// between landscape and portrait swaps the desktop width and height.
    ///
    /// # Errors
    ///
    /// [`TopologyError::UnknownDisplay`] or [`TopologyError::InactiveDisplay`].
    pub fn set_rotation(&mut self, id: DisplayId, rotation: Rotation) -> Result<(), TopologyError> {
        let index = self.active_path_index(id)?;
        let (_, members) = self.group_of(index)?;
        let flips = self.paths[index].target.rotation.is_portrait() != rotation.is_portrait();
        self.transact(|draft| {
            if flips {
                for source_index in draft.group_source_indexes(&members)? {
                    let mode = draft.modes.source_mut(source_index)?;
                    std::mem::swap(&mut mode.width, &mut mode.height);
                }
            }
            for &member in &members {
                let target = &mut draft.paths[member].target;
                target.rotation = rotation;
                if let (true, Some(image_index)) = (flips, target.desktop_mode_idx) {
                    let clip = &mut draft.modes.desktop_image_mut(image_index)?.image_clip;
                    std::mem::swap(&mut clip.width, &mut clip.height);
                }
            }
            Ok(())
        })
    }

    pub fn set_scaling(&mut self, id: DisplayId, scaling: Scaling) -> Result<(), TopologyError> {
        let index = self.active_path_index(id)?;
        self.paths[index].target.scaling = scaling;
        Ok(())
    }

    // ── Positioning ───────────────────────────────────────────────────────────

    /// Moves the display's group so its top-left corner is at `(x, y)`.
    /// `None` keeps the current coordinate on that axis.
    ///
    /// Moving the primary group keeps it at the origin and shifts every other
    /// group by the inverse offset instead.
    ///
    /// # Errors
    ///
    /// [`TopologyError::PositionOccupied`] if another group already sits at
    /// the requested position, [`TopologyError::CoordinateOverflow`] if the
    /// move leaves the `i32` range, plus the usual lookup errors.
    pub fn set_position(
        &mut self,
        id: DisplayId,
        x: Option<i32>,
        y: Option<i32>,
    ) -> Result<(), TopologyError> {
        let index = self.active_path_index(id)?;
        let current = self.source_mode_of_path(index)?.position;
        let requested = Point::new(x.unwrap_or(current.x), y.unwrap_or(current.y));
        let (dx, dy) = current.delta_to(requested).ok_or(TopologyError::CoordinateOverflow)?;
        self.transact(|draft| draft.move_group_by(index, dx, dy))
    }

    /// Moves the display's group by `(dx, dy)`.
    ///
    /// # Errors
    ///
    /// Same as [`DisplayTopology::set_position`].
    pub fn move_by(&mut self, id: DisplayId, dx: i32, dy: i32) -> Result<(), TopologyError> {
        let index = self.active_path_index(id)?;
        let position = self.source_mode_of_path(index)?.position;
        position.offset(dx, dy).ok_or(TopologyError::CoordinateOverflow)?;
        self.transact(|draft| draft.move_group_by(index, dx, dy))
    }

    /// Places `id` flush against one edge of `anchor`, top or left edges
    /// aligned.
    ///
    /// # Errors
    ///
    /// [`TopologyError::SameGroup`] if both displays share a position.
    pub fn move_relative_to(
        &mut self,
        id: DisplayId,
        anchor: DisplayId,
        edge: RelativePosition,
    ) -> Result<(), TopologyError> {
        let index = self.active_path_index(id)?;
        let anchor_index = self.active_path_index(anchor)?;
        let own = self.source_mode_of_path(index)?.clone();
        let anchor_position = self.source_mode_of_path(anchor_index)?.position;
        if own.position == anchor_position {
            return Err(TopologyError::SameGroup(id, anchor));
        }

        self.transact(|draft| {
            let was_primary = own.is_primary();
            if was_primary {
                draft.set_primary_path(anchor_index)?;
            }

            let from = draft.source_mode_of_path(index)?.position;
            let anchor_mode = draft.source_mode_of_path(anchor_index)?;
            let to = match edge {
                RelativePosition::Left => anchor_mode.position.offset(-extent(own.width), 0),
                RelativePosition::Right => {
                    anchor_mode.position.offset(extent(anchor_mode.width), 0)
                }
                RelativePosition::Above => anchor_mode.position.offset(0, -extent(own.height)),
                RelativePosition::Under => {
                    anchor_mode.position.offset(0, extent(anchor_mode.height))
                }
            }
            .ok_or(TopologyError::CoordinateOverflow)?;
            let (dx, dy) = from.delta_to(to).ok_or(TopologyError::CoordinateOverflow)?;
            draft.move_group_by(index, dx, dy)?;

            if was_primary {
                draft.set_primary_path(index)?;
            }
            debug!(display = %id, anchor = %anchor, ?edge, "display placed next to anchor");
            Ok(())
        })
    }

    /// Exchanges the positions of two groups.  If either was primary, it
    /// stays primary afterwards.
    ///
    /// # Errors
    ///
    /// [`TopologyError::SameGroup`] if both displays share a position.
    pub fn swap(&mut self, first: DisplayId, second: DisplayId) -> Result<(), TopologyError> {
        let first_index = self.active_path_index(first)?;
        let second_index = self.active_path_index(second)?;
        let (first_position, first_members) = self.group_of(first_index)?;
        let (second_position, second_members) = self.group_of(second_index)?;
        if first_position == second_position {
            return Err(TopologyError::SameGroup(first, second));
        }

        self.transact(|draft| {
            draft.write_group_position(&first_members, second_position)?;
            draft.write_group_position(&second_members, first_position)?;
            if first_position == Point::ORIGIN {
                draft.set_primary_path(first_index)?;
            } else if second_position == Point::ORIGIN {
                draft.set_primary_path(second_index)?;
            }
            Ok(())
        })
    }

    /// Lines up the listed displays' groups in a single row at `y = 0`,
    /// left to right in argument order.  Groups not listed stay where they
    /// are.
    ///
    /// If a listed display was primary, it is primary again afterwards.  If
    /// none was, the row starts to the right of the primary group.
    ///
    /// # Errors
    ///
    /// [`TopologyError::ConflictingDisplayIds`] on a repeated id, plus the
    /// usual lookup errors.
    pub fn arrange_left_to_right(&mut self, ids: &[DisplayId]) -> Result<(), TopologyError> {
        ensure_distinct(ids)?;
        let indexes = ids
            .iter()
            .map(|&id| self.active_path_index(id))
            .collect::<Result<Vec<_>, _>>()?;

        self.transact(|draft| {
            let map = draft.desktop_map()?;
            let mut primary_listed = None;
            for &index in &indexes {
                if draft.source_mode_of_path(index)?.is_primary() {
                    primary_listed = Some(index);
                    break;
                }
            }

            let mut x = match primary_listed {
                Some(_) => 0,
                None => match map.get(&Point::ORIGIN).and_then(|m| m.first()) {
                    Some(&member) => extent(draft.source_mode_of_path(member)?.width),
                    None => 0,
                },
            };

            let mut placements: Vec<(Point, Point)> = Vec::new();
            for &index in &indexes {
                let mode = draft.source_mode_of_path(index)?;
                if placements.iter().any(|(from, _)| *from == mode.position) {
                    continue;
                }
                placements.push((mode.position, Point::new(x, 0)));
                x = x.checked_add(extent(mode.width)).ok_or(TopologyError::CoordinateOverflow)?;
            }

            for (from, to) in placements {
                let members = map.get(&from).cloned().unwrap_or_default();
                draft.write_group_position(&members, to)?;
            }

            if let Some(index) = primary_listed {
                draft.set_primary_path(index)?;
            }
            Ok(())
        })
    }

    /// Slides every desktop that lay beyond `removed` towards the origin by
    /// the removed extent, closing the hole it leaves.  Each source record
    /// is shifted once, whatever number of paths share it.
    pub fn close_gap_after_removal(&mut self, removed: &SourceMode) {
        for mode in self.modes.source_modes_mut() {
            mode.position = shifted_for_removal(mode.position, removed);
        }
    }

    // ── Crate-internal helpers ────────────────────────────────────────────────

    /// Moves the group of `index` by `(dx, dy)`.  When that group is primary,
    /// primary is handed to another group for the move and taken back after,
    /// which leaves the group at the origin and shifts the rest.
    pub(crate) fn move_group_by(
        &mut self,
        index: usize,
        dx: i32,
        dy: i32,
    ) -> Result<(), TopologyError> {
        if dx == 0 && dy == 0 {
            return Ok(());
        }
        let (position, members) = self.group_of(index)?;

        if position == Point::ORIGIN {
            let map = self.desktop_map()?;
            let Some(stand_in) = map
                .iter()
                .find(|(p, _)| **p != Point::ORIGIN)
                .and_then(|(_, m)| m.first().copied())
            else {
                return Ok(());
            };
            self.set_primary_path(stand_in)?;
            let (moved_from, members) = self.group_of(index)?;
            let to = moved_from.offset(dx, dy).ok_or(TopologyError::CoordinateOverflow)?;
            self.relocate_group(&members, to)?;
            return self.set_primary_path(index);
        }

        let to = position.offset(dx, dy).ok_or(TopologyError::CoordinateOverflow)?;
        self.relocate_group(&members, to)
    }

    /// Writes `to` into the group's source records unless another group is
    /// already there.
    fn relocate_group(&mut self, members: &[usize], to: Point) -> Result<(), TopologyError> {
        if let Some(occupants) = self.desktop_map()?.get(&to) {
            if occupants.iter().any(|o| !members.contains(o)) {
                return Err(TopologyError::PositionOccupied { x: to.x, y: to.y });
            }
        }
        self.write_group_position(members, to)
    }

    pub(crate) fn write_group_position(
        &mut self,
        members: &[usize],
        to: Point,
    ) -> Result<(), TopologyError> {
        for source_index in self.group_source_indexes(members)? {
            self.modes.source_mut(source_index)?.position = to;
        }
        Ok(())
    }

    /// Shifts every source record so the group of `index` lands on the origin.
    /// Nothing moves if any record would leave the `i32` range.
    pub(crate) fn set_primary_path(&mut self, index: usize) -> Result<(), TopologyError> {
        let position = self.source_mode_of_path(index)?.position;
        if position == Point::ORIGIN {
            return Ok(());
        }
        let (dx, dy) = position.delta_to(Point::ORIGIN).ok_or(TopologyError::CoordinateOverflow)?;
        let shifted = self
            .modes
            .source_modes()
            .map(|mode| mode.position.offset(dx, dy))
            .collect::<Option<Vec<_>>>()
            .ok_or(TopologyError::CoordinateOverflow)?;
        for (mode, to) in self.modes.source_modes_mut().zip(shifted) {
            mode.position = to;
        }
        Ok(())
    }
}

pub(crate) fn ensure_distinct(ids: &[DisplayId]) -> Result<(), TopologyError> {
    for (i, id) in ids.iter().enumerate() {
        if ids[..i].contains(id) {
            return Err(TopologyError::ConflictingDisplayIds(*id));
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{DisplaySpec, TopologyBuilder};
    use crate::domain::topology::{AdapterId, PixelFormat, Region};

    const GPU: AdapterId = AdapterId::new(1, 0);

    /// Three side-by-side 1920×1080 displays; ids follow push order.
    fn row_of_three() -> DisplayTopology {
        let mut builder = TopologyBuilder::new();
        builder
            .push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)))
            .push(DisplaySpec::active(GPU, 2, Region::new(1920, 0, 1920, 1080)))
            .push(DisplaySpec::active(GPU, 3, Region::new(3840, 0, 1920, 1080)));
        builder.build().into_topology().expect("topology")
    }

    /// Display 1 at the origin, displays 2 and 3 cloned at (1920, 0),
    /// display 4 at (3840, 0).
    fn row_with_clone_group() -> DisplayTopology {
        let mut builder = TopologyBuilder::new();
        builder
            .push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)))
            .push(DisplaySpec::active(GPU, 2, Region::new(1920, 0, 1920, 1080)))
            .push(DisplaySpec::active(GPU, 3, Region::new(1920, 0, 1920, 1080)))
            .push(DisplaySpec::active(GPU, 4, Region::new(3840, 0, 1920, 1080)));
        builder.build().into_topology().expect("topology")
    }

    fn positions(topology: &DisplayTopology) -> Vec<Point> {
        topology
            .catalog()
            .ids()
            .map(|id| topology.position(id).expect("active"))
            .collect()
    }

    fn mode(x: i32, y: i32, width: u32, height: u32) -> SourceMode {
        SourceMode { width, height, pixel_format: PixelFormat::Bpp32, position: Point::new(x, y) }
    }

    #[test]
    fn test_shifted_for_removal_only_moves_modes_beyond_the_removed_one() {
        let removed = mode(1920, 0, 1920, 1080);
        assert_eq!(shifted_for_removal(Point::new(3840, 0), &removed), Point::new(1920, 0));
        assert_eq!(shifted_for_removal(Point::ORIGIN, &removed), Point::ORIGIN);
        assert_eq!(shifted_for_removal(Point::new(1920, 1080), &removed), Point::new(1920, 1080));
    }

    #[test]
    fn test_shifted_for_removal_moves_negative_side_towards_origin() {
        let removed = mode(-1920, 0, 1920, 1080);
        assert_eq!(shifted_for_removal(Point::new(-3840, 0), &removed), Point::new(-1920, 0));
        assert_eq!(shifted_for_removal(Point::new(1920, 0), &removed), Point::new(1920, 0));
    }

    #[test]
    fn test_close_gap_shifts_each_record_once() {
        let mut topology = row_of_three();
        let removed = topology.source_mode(DisplayId(2)).unwrap().clone();

        topology.close_gap_after_removal(&removed);

        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 0));
        assert_eq!(topology.position(DisplayId(1)).unwrap(), Point::ORIGIN);
    }

    #[test]
    fn test_set_resolution_updates_source_record() {
        let mut topology = row_of_three();

        topology.set_resolution(DisplayId(2), 2560, 1440).unwrap();

        let mode = topology.source_mode(DisplayId(2)).unwrap();
        assert_eq!((mode.width, mode.height), (2560, 1440));
    }

    #[test]
    fn test_set_resolution_resizes_every_group_member_and_clip() {
        let mut builder = TopologyBuilder::new();
        builder
            .push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)).with_desktop_image())
            .push(DisplaySpec::active(GPU, 2, Region::new(0, 0, 1920, 1080)));
        let mut topology = builder.build().into_topology().unwrap();

        topology.set_resolution(DisplayId(1), 1280, 720).unwrap();

        assert_eq!(topology.source_mode(DisplayId(2)).unwrap().width, 1280);
        let image_index = topology.path(DisplayId(1)).unwrap().target.desktop_mode_idx.unwrap();
        let clip = topology.modes().desktop_image(image_index).unwrap().image_clip;
        assert_eq!(clip, Region::new(0, 0, 1280, 720));
    }

    #[test]
    fn test_set_rotation_to_portrait_swaps_dimensions() {
        let mut topology = row_of_three();

        topology.set_rotation(DisplayId(3), Rotation::Rotate90).unwrap();

        let mode = topology.source_mode(DisplayId(3)).unwrap();
        assert_eq!((mode.width, mode.height), (1080, 1920));
        assert_eq!(topology.path(DisplayId(3)).unwrap().target.rotation, Rotation::Rotate90);
    }

    #[test]
    fn test_set_rotation_between_landscape_orientations_keeps_dimensions() {
        let mut topology = row_of_three();

        topology.set_rotation(DisplayId(3), Rotation::Rotate180).unwrap();

        let mode = topology.source_mode(DisplayId(3)).unwrap();
        assert_eq!((mode.width, mode.height), (1920, 1080));
    }

    #[test]
    fn test_set_refresh_rate_updates_target_signal() {
        let mut topology = row_of_three();
        let rate = Rational::from_hz(144.0);

        topology.set_refresh_rate(DisplayId(1), rate).unwrap();

        let path = topology.path(DisplayId(1)).unwrap();
        assert_eq!(path.target.refresh_rate, rate);
        let target = topology.modes().target(path.target.mode_idx.unwrap()).unwrap();
        assert_eq!(target.signal.v_sync_freq, rate);
    }

    #[test]
    fn test_set_position_moves_secondary_group() {
        let mut topology = row_of_three();

        topology.set_position(DisplayId(3), None, Some(1080)).unwrap();

        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(3840, 1080));
    }

    #[test]
    fn test_set_position_on_primary_shifts_others_inversely() {
        let mut topology = row_of_three();

        topology.set_position(DisplayId(1), Some(100), Some(50)).unwrap();

        assert_eq!(
            positions(&topology),
            vec![Point::ORIGIN, Point::new(1820, -50), Point::new(3740, -50)]
        );
    }

    #[test]
    fn test_set_position_onto_other_group_fails_without_change() {
        let mut topology = row_of_three();
        let before = topology.clone();

        let result = topology.set_position(DisplayId(3), Some(1920), Some(0));

        assert_eq!(result, Err(TopologyError::PositionOccupied { x: 1920, y: 0 }));
        assert_eq!(topology, before);
    }

    #[test]
    fn test_move_by_primary_alone_is_a_no_op() {
        let mut builder = TopologyBuilder::new();
        builder.push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)));
        let mut topology = builder.build().into_topology().unwrap();

        topology.move_by(DisplayId(1), 10, 10).unwrap();

        assert_eq!(topology.position(DisplayId(1)).unwrap(), Point::ORIGIN);
    }

    #[test]
    fn test_move_relative_to_places_display_left_of_anchor() {
        let mut topology = row_of_three();

        topology.move_relative_to(DisplayId(3), DisplayId(1), RelativePosition::Left).unwrap();

        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(-1920, 0));
    }

    #[test]
    fn test_move_relative_to_under_anchor() {
        let mut topology = row_of_three();

        topology.move_relative_to(DisplayId(3), DisplayId(2), RelativePosition::Under).unwrap();

        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 1080));
    }

    #[test]
    fn test_move_relative_to_keeps_moved_primary_as_primary() {
        let mut topology = row_of_three();

        topology.move_relative_to(DisplayId(1), DisplayId(3), RelativePosition::Right).unwrap();

        assert_eq!(
            positions(&topology),
            vec![Point::ORIGIN, Point::new(-3840, 0), Point::new(-1920, 0)]
        );
    }

    #[test]
    fn test_move_relative_to_same_group_is_rejected() {
        let mut builder = TopologyBuilder::new();
        builder
            .push(DisplaySpec::active(GPU, 1, Region::new(0, 0, 1920, 1080)))
            .push(DisplaySpec::active(GPU, 2, Region::new(0, 0, 1920, 1080)));
        let mut topology = builder.build().into_topology().unwrap();

        let result = topology.move_relative_to(DisplayId(1), DisplayId(2), RelativePosition::Right);

        assert_eq!(result, Err(TopologyError::SameGroup(DisplayId(1), DisplayId(2))));
    }

    #[test]
    fn test_swap_exchanges_secondary_positions() {
        let mut topology = row_of_three();

        topology.swap(DisplayId(2), DisplayId(3)).unwrap();

        assert_eq!(
            positions(&topology),
            vec![Point::ORIGIN, Point::new(3840, 0), Point::new(1920, 0)]
        );
    }

    #[test]
    fn test_swap_with_primary_keeps_original_primary_at_origin() {
        let mut topology = row_of_three();

        topology.swap(DisplayId(1), DisplayId(2)).unwrap();

        assert_eq!(topology.position(DisplayId(1)).unwrap(), Point::ORIGIN);
        assert_eq!(topology.position(DisplayId(2)).unwrap(), Point::new(-1920, 0));
        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 0));
    }

    #[test]
    fn test_arrange_left_to_right_packs_in_argument_order() {
        let mut topology = row_of_three();

        topology
            .arrange_left_to_right(&[DisplayId(3), DisplayId(1), DisplayId(2)])
            .unwrap();

        assert_eq!(
            positions(&topology),
            vec![Point::ORIGIN, Point::new(1920, 0), Point::new(-1920, 0)]
        );
    }

    #[test]
    fn test_arrange_left_to_right_without_primary_starts_after_primary() {
        let mut topology = row_of_three();

        topology.arrange_left_to_right(&[DisplayId(3), DisplayId(2)]).unwrap();

        assert_eq!(
            positions(&topology),
            vec![Point::ORIGIN, Point::new(3840, 0), Point::new(1920, 0)]
        );
    }

    #[test]
    fn test_arrange_left_to_right_rejects_repeated_ids() {
        let mut topology = row_of_three();

        let result = topology.arrange_left_to_right(&[DisplayId(2), DisplayId(2)]);

        assert_eq!(result, Err(TopologyError::ConflictingDisplayIds(DisplayId(2))));
    }

    // ── Clone groups move as one ──────────────────────────────────────────────

    #[test]
    fn test_move_by_moves_every_clone_group_member() {
        let mut topology = row_with_clone_group();

        topology.move_by(DisplayId(2), 0, 100).unwrap();

        assert_eq!(topology.position(DisplayId(2)).unwrap(), Point::new(1920, 100));
        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 100));
        assert_eq!(topology.clone_peers(DisplayId(2)).unwrap(), vec![DisplayId(3)]);
    }

    #[test]
    fn test_set_position_moves_every_clone_group_member() {
        let mut topology = row_with_clone_group();

        topology.set_position(DisplayId(3), None, Some(1080)).unwrap();

        assert_eq!(topology.position(DisplayId(2)).unwrap(), Point::new(1920, 1080));
        assert_eq!(topology.position(DisplayId(3)).unwrap(), Point::new(1920, 1080));
        assert_eq!(topology.position(DisplayId(4)).unwrap(), Point::new(3840, 0));
    }

    #[test]
    fn test_swap_moves_whole_clone_group() {
        let mut topology = row_with_clone_group();

        topology.swap(DisplayId(3), DisplayId(4)).unwrap();

        assert_eq!(
            positions(&topology),
            vec![Point::ORIGIN, Point::new(3840, 0), Point::new(3840, 0), Point::new(1920, 0)]
        );
    }

    #[test]
    fn test_arrange_left_to_right_gives_cloned_ids_one_slot() {
        let mut topology = row_with_clone_group();

        topology
            .arrange_left_to_right(&[DisplayId(4), DisplayId(2), DisplayId(1), DisplayId(3)])
            .unwrap();

        assert_eq!(
            positions(&topology),
            vec![Point::ORIGIN, Point::new(-1920, 0), Point::new(-1920, 0), Point::new(-3840, 0)]
        );
    }

    // ── Coordinate overflow ───────────────────────────────────────────────────

    #[test]
    fn test_move_by_past_coordinate_range_fails_without_change() {
        let mut topology = row_of_three();
        let before = topology.clone();

        let result = topology.move_by(DisplayId(2), i32::MAX, 0);

        assert_eq!(result, Err(TopologyError::CoordinateOverflow));
        assert_eq!(topology, before);
    }

    #[test]
    fn test_move_by_primary_past_coordinate_range_fails_without_change() {
        let mut topology = row_of_three();
        let before = topology.clone();

        let result = topology.move_by(DisplayId(1), i32::MIN, 0);

        assert_eq!(result, Err(TopologyError::CoordinateOverflow));
        assert_eq!(topology, before);
    }

    #[test]
    fn test_set_position_past_coordinate_range_fails_without_change() {
        let mut topology = row_of_three();
        let before = topology.clone();

        let result = topology.set_position(DisplayId(2), Some(i32::MIN), None);

        assert_eq!(result, Err(TopologyError::CoordinateOverflow));
        assert_eq!(topology, before);
    }

    #[test]
    fn test_shifted_for_removal_clamps_oversized_extent() {
        let removed = mode(1, 0, u32::MAX, 1080);
        assert_eq!(shifted_for_removal(Point::new(10, 0), &removed), Point::new(10 - i32::MAX, 0));

        let removed = mode(0, -1, 1920, u32::MAX);
        assert_eq!(shifted_for_removal(Point::new(0, i32::MIN), &removed), Point::new(0, -1));
    }
}
