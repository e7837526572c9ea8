//! Applying and reverting association manifests

use crate::assoc::AssociationManager;
use crate::config::models::{AssociationManifest, borrowed_details};
use crate::error::Result;
use crate::registry::{RegistryBackend, Root};
use tracing::{info, warn};

impl<B: RegistryBackend> AssociationManager<B> {
    /// Register every fileclass of `manifest`, then every extension.
    ///
    /// Stops at the first failure; registrations made before it are kept.
    pub fn apply_manifest(&self, manifest: &AssociationManifest) -> Result<()> {
        let root = Root::from_all_users(manifest.all_users);

        for class in &manifest.fileclasses {
            self.register_fileclass(
                &class.name,
                &borrowed_details(&class.details),
                root,
                class.description.as_deref(),
                manifest.overwrite,
            )?;
        }
        for extension in &manifest.extensions {
            self.register_extension(
                &extension.extension,
                &extension.fileclass,
                &borrowed_details(&extension.details),
                root,
                manifest.overwrite,
            )?;
        }

        info!(
            "Applied manifest: {} fileclass(es), {} extension(s) under {}",
            manifest.fileclasses.len(),
            manifest.extensions.len(),
            root.hive_name()
        );
        Ok(())
    }

    /// Remove every extension of `manifest`, then every fileclass.
    ///
    /// Keys that are already gone are skipped; any other failure stops the revert.
    pub fn revert_manifest(&self, manifest: &AssociationManifest) -> Result<()> {
        let root = Root::from_all_users(manifest.all_users);

        let extensions = manifest.extensions.iter().map(|extension| {
            (
                extension.extension.as_str(),
                self.unregister_extension(&extension.extension, root, false),
            )
        });
        let classes = manifest
            .fileclasses
            .iter()
            .map(|class| (class.name.as_str(), self.unregister_fileclass(&class.name, root)));

        for (name, result) in extensions.chain(classes) {
            match result {
                Ok(()) => {}
                Err(e) if e.is_not_found() => warn!("`{}` was already removed", name),
                Err(e) => return Err(e),
            }
        }

        info!("Reverted manifest under {}", root.hive_name());
        Ok(())
    }
}
