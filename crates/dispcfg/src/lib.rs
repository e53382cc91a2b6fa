//! dispcfg library entry point.
//!
//! Drives a [`dispcfg_core::DisplayTopology`] against the platform display
//! configuration service.  Re-exports every module so the binary and the
//! integration tests in `tests/` share one module tree.

pub mod application;
pub mod infrastructure;
