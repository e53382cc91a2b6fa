//! # dispcfg-core
//!
//! In-memory model of a machine's display topology and the algorithms that
//! mutate it.
//!
//! This crate has zero dependencies on OS APIs.  The arrays it works on are
//! produced and consumed by an external display configuration service; the
//! `dispcfg` crate owns that boundary.
//!
//! # Architecture overview
//!
//! The operating system describes the display topology as two flat arrays:
//!
//! - **paths** – one record per potential source→target connection
//!   (GPU output → monitor).
//! - **modes** – source geometry, target signal timing and desktop-image
//!   clip records.  Paths point into this array by index.
//!
//! Everything in this crate is about keeping those index references valid
//! while the arrays change:
//!
//! - **`domain::mode_arena`** – the mode array with checked, typed access,
//!   growth and compaction.
//! - **`domain::catalog`** – the stable, sorted, 1-based display numbering
//!   derived from raw path order.
//! - **`domain::layout`** – desktop positions: clone groups, moves, swaps,
//!   left-to-right arrangement and gap closing.
//! - **`domain::mutation`** – enable/disable/clone/primary transitions and
//!   per-adapter source-id allocation.
//! - **`builder`** – programmatic construction of topologies.

pub mod builder;
pub mod domain;

pub use domain::catalog::{DeviceNameSource, DisplayCatalog, TargetDeviceName};
pub use domain::display_topology::DisplayTopology;
pub use domain::error::TopologyError;
pub use domain::layout::RelativePosition;
pub use domain::mode_arena::ModeArena;
pub use domain::mutation::{EnableDisablePlan, EnableDisableRequest, SourceIdStrategy};
pub use domain::topology::{
    AdapterId, DesktopImageInfo, DisplayId, ModeIndex, ModeInfo, ModeKind, OutputTechnology,
    PathFlags, PathInfo, PathSourceInfo, PathTargetInfo, PhysicalTarget, PixelFormat, Point,
    Rational, Region, Rotation, Scaling, ScanlineOrdering, Size, SourceMode, TargetMode,
    VideoSignalInfo,
};
