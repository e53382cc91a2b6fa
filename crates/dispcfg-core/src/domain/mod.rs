//! Domain entities for the display topology.
//!
//! Pure logic over the path/mode array pair.  Nothing in here calls the
//! operating system; the arrays come in through [`display_topology::DisplayTopology`]
//! and leave the same way.
//!
//! # How the pieces fit together
//!
//! ```text
//! raw paths ──► catalog (sorted display ids)
//!     │
//!     └──► mode_arena (typed, index-checked mode records)
//!              │
//!              ├──► layout   (positions, clone groups, gap closing)
//!              └──► mutation (disable / clone / enable / primary)
//! ```

pub mod catalog;
pub mod display_topology;
pub mod error;
pub mod layout;
pub mod mode_arena;
pub mod mutation;
pub mod topology;
