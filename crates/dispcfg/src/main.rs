//! `dispcfg` diagnostic binary.
//!
//! Loads the configuration, takes one snapshot of the display topology and
//! logs every display in catalog order.
//!
//! ```text
//! main()
//!  └─ load_config()          -- defaults when the file is missing
//!  └─ tracing subscriber     -- RUST_LOG, else [logging] level
//!  └─ DisplaySession::open() -- snapshot + catalog
//!       └─ info! per display
//! ```

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dispcfg::application::boundary::DisplayConfigApi;
use dispcfg::application::session::{DisplaySession, SessionOptions};
use dispcfg::infrastructure::storage::config;

fn main() -> anyhow::Result<()> {
    let loaded = config::load_config();
    let cfg = loaded.as_ref().cloned().unwrap_or_default();

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level)),
        )
        .init();

    if let Err(e) = &loaded {
        warn!("failed to load config, using defaults: {e}");
    }
    info!("dispcfg starting");

    let options = SessionOptions::from(&cfg);
    let result = report(native_api(), options);
    if let Err(e) = &result {
        error!("display snapshot failed: {e}");
    }
    result
}

fn report<A: DisplayConfigApi>(api: A, options: SessionOptions) -> anyhow::Result<()> {
    let session = DisplaySession::open(api, options)?;
    for entry in session.displays()? {
        info!("{entry}");
    }
    match session.topology().primary_display() {
        Some(primary) => info!("primary display: {primary}"),
        None => warn!("no display sits at the desktop origin"),
    }
    Ok(())
}

#[cfg(target_os = "windows")]
fn native_api() -> dispcfg::infrastructure::native::NativeDisplayConfigApi {
    dispcfg::infrastructure::native::NativeDisplayConfigApi::new()
}

#[cfg(not(target_os = "windows"))]
fn native_api() -> dispcfg::infrastructure::native::fake::FakeDisplayConfigApi {
    warn!("no display configuration service on this platform, using the demo topology");
    dispcfg::infrastructure::native::fake::FakeDisplayConfigApi::demo()
}
