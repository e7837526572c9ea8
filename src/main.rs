//! `winreg-helpers` - refresh Windows file icons
//!
//! Tells Explorer to re-read file associations and icons, e.g. after an
//! installer script changed registrations through the library.

use anyhow::{Context, Result};
use tracing::info;
use winreg_helpers::{refresh_icons, utils};

fn main() -> Result<()> {
    utils::init_logging().context("Failed to initialize logging system")?;

    info!("Refreshing shell icons and file associations");
    refresh_icons();
    info!("Shell notified");

    Ok(())
}
