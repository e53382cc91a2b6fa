//! Implementations of [`DisplayConfigApi`](crate::application::boundary::DisplayConfigApi).
//!
//! On Windows the service is the CCD API (`QueryDisplayConfig`,
//! `SetDisplayConfig`, `DisplayConfigGetDeviceInfo`), wrapped by
//! [`windows::WindowsDisplayConfigApi`].  Every other platform only gets the
//! in-memory [`fake::FakeDisplayConfigApi`], which is also what the
//! integration tests run against.

pub mod fake;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use windows::WindowsDisplayConfigApi as NativeDisplayConfigApi;
