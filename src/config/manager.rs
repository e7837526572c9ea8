//! Manifest manager for loading and saving association manifests
//!
//! Saves go through a temporary file in the target directory that is then
//! persisted over the manifest, so a crash never leaves a half-written file.

use crate::config::models::AssociationManifest;
use crate::error::{AssocError, Result, StringError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name used below %APPDATA%
pub const APP_DIR_NAME: &str = "WinregHelpers";

/// Manifest manager
pub struct ManifestManager;

impl ManifestManager {
    /// Get the default manifest path
    ///
    /// Returns: %APPDATA%\WinregHelpers\associations.json
    pub fn default_path() -> PathBuf {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata)
            .join(APP_DIR_NAME)
            .join("associations.json")
    }

    /// Load a manifest from disk
    ///
    /// A missing file yields an empty manifest; a file that fails to parse is an error.
    pub fn load(path: &Path) -> Result<AssociationManifest> {
        if !path.exists() {
            info!("Manifest {} not found, using an empty manifest", path.display());
            return Ok(AssociationManifest::default());
        }

        let json = std::fs::read_to_string(path)?;
        let manifest: AssociationManifest = serde_json::from_str(&json).inspect_err(|e| {
            warn!("Failed to parse manifest {}: {}", path.display(), e);
        })?;
        info!(
            "Manifest loaded with {} fileclass(es) and {} extension(s)",
            manifest.fileclasses.len(),
            manifest.extensions.len()
        );
        Ok(manifest)
    }

    /// Save a manifest to disk with an atomic write
    pub fn save(path: &Path, manifest: &AssociationManifest) -> Result<()> {
        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| AssocError::ConfigError(StringError::new("Invalid manifest path")))?;
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(manifest)?;
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| AssocError::IoError(e.error))?;

        info!("Manifest saved to {}", path.display());
        Ok(())
    }
}
