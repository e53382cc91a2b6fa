//! Infrastructure layer.
//!
//! Contains the OS-facing adapters: the display configuration service
//! binding and file-system storage for the configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `dispcfg_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod native;
pub mod storage;
