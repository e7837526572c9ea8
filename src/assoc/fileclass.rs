//! Fileclass registration
//!
//! A fileclass has two states, absent and present. `register_fileclass` moves
//! it to present (replacing an existing registration only on `overwrite`),
//! `unregister_fileclass` moves it back to absent.

use crate::assoc::{AssociationManager, Details, present_details, validate_name};
use crate::error::{AssocError, Result};
use crate::registry::{RegistryBackend, Root};
use tracing::{debug, info};

impl<B: RegistryBackend> AssociationManager<B> {
    /// Create the fileclass `name`.
    ///
    /// The class key's default value is set to `description` (when given)
    /// before any entry is written. Each entry in `details` names a sub-entry
    /// path below the class key (e.g. `DefaultIcon`, `shell\open\command`)
    /// whose default value is set to the entry's text; entries without a value
    /// are skipped.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the class is registered and `overwrite` is false
    /// - `InvalidName` for an empty or multi-level name, or a blank entry path
    /// - `Platform` for any other registry failure
    pub fn register_fileclass(
        &self,
        name: &str,
        details: &Details<'_>,
        root: Root,
        description: Option<&str>,
        overwrite: bool,
    ) -> Result<()> {
        validate_name(name)?;
        let entries = present_details(details)?;
        let path = root.class_path(name);
        let root_key = self.backend.predef(root);

        self.prepare_target(&root_key, root, &path, overwrite)?;

        debug!("Create fileclass key for `{}\\{}`", root.hive_name(), path);
        let registry_error = |e: std::io::Error| AssocError::from_registry(e, &path).under(root);
        let class_key = self
            .backend
            .create_subkey(&root_key, &path)
            .map_err(registry_error)?;

        if let Some(description) = description {
            self.backend
                .set_string(&class_key, "", description)
                .map_err(registry_error)?;
        }

        for (entry, value) in entries {
            let entry_key = self
                .backend
                .create_subkey(&class_key, entry)
                .map_err(registry_error)?;
            self.backend
                .set_string(&entry_key, "", value)
                .map_err(registry_error)?;
            debug!("Set `{}` = {:?}", entry, value);
        }

        info!("Registered fileclass `{}` under {}", name, root.hive_name());
        Ok(())
    }

    /// Remove the fileclass `name` and all of its entries.
    ///
    /// Extensions pointing at the class are left untouched.
    pub fn unregister_fileclass(&self, name: &str, root: Root) -> Result<()> {
        self.delete_class(name, root)
    }
}
