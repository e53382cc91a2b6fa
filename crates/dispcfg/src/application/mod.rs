//! Application layer: everything between the pure topology model and the
//! operating system.
//!
//! Nothing in here calls the OS directly.  The display configuration service
//! is reached through the [`boundary::DisplayConfigApi`] trait, implemented in
//! `infrastructure::native`.
//!
//! # Sub-modules
//!
//! - **`boundary`**     – the trait the OS binding implements, plus its flag
//!   and status vocabulary.
//! - **`snapshot`**     – query the current configuration, negotiating buffer
//!   sizes until the service stops reporting "buffer too small".
//! - **`apply_retry`**  – submit an enable/disable change, falling back to a
//!   second strategy on one specific recoverable failure.
//! - **`session`**      – one snapshot plus the operations callers run
//!   against it, by display id.
//! - **`display_info`** – read-only summary of a display.

pub mod apply_retry;
pub mod boundary;
pub mod display_info;
pub mod session;
pub mod snapshot;
