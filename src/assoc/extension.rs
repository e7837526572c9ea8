//! Extension association

use crate::assoc::{AssociationManager, Details, present_details, validate_extension, validate_name};
use crate::error::{AssocError, Result};
use crate::registry::{RegistryBackend, Root};
use std::io;
use tracing::{debug, info};

impl<B: RegistryBackend> AssociationManager<B> {
    /// Associate `extension` (e.g. `.foo`) with `fileclass`.
    ///
    /// The extension key's default value is set to the fileclass name, then each
    /// entry of `details` is written as a named value on the extension key
    /// (e.g. `Content Type`, `PerceivedType`); entries without a value are skipped.
    /// The fileclass itself is not checked for existence.
    pub fn register_extension(
        &self,
        extension: &str,
        fileclass: &str,
        details: &Details<'_>,
        root: Root,
        overwrite: bool,
    ) -> Result<()> {
        validate_extension(extension)?;
        validate_name(fileclass)?;
        let values = present_details(details)?;
        let path = root.class_path(extension);
        let root_key = self.backend.predef(root);

        self.prepare_target(&root_key, root, &path, overwrite)?;

        debug!("Create extension key for `{}\\{}`", root.hive_name(), path);
        let registry_error = |e: io::Error| AssocError::from_registry(e, &path).under(root);
        let extension_key = self
            .backend
            .create_subkey(&root_key, &path)
            .map_err(registry_error)?;
        self.backend
            .set_string(&extension_key, "", fileclass)
            .map_err(registry_error)?;

        for (name, value) in values {
            self.backend
                .set_string(&extension_key, name, value)
                .map_err(registry_error)?;
        }

        info!(
            "Associated `{}` with fileclass `{}` under {}",
            extension,
            fileclass,
            root.hive_name()
        );
        Ok(())
    }

    /// Name of the fileclass `extension` points at.
    ///
    /// Reads the extension key's default value, falling back to its first named
    /// value when no default is set.
    pub fn associated_fileclass(&self, extension: &str, root: Root) -> Result<String> {
        let key = self.get_class(extension, root)?;
        let path = root.class_path(extension);
        let registry_error = |e: io::Error| AssocError::from_registry(e, &path).under(root);

        match self.backend.get_string(&key, "") {
            Ok(fileclass) => Ok(fileclass),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let names = self.backend.value_names(&key).map_err(registry_error)?;
                let first = names
                    .first()
                    .ok_or_else(|| AssocError::NotFound(format!("{path}\\(Default)")).under(root))?;
                self.backend.get_string(&key, first).map_err(registry_error)
            }
            Err(e) => Err(registry_error(e)),
        }
    }

    /// Remove the association for `extension`.
    ///
    /// With `with_fileclass`, the fileclass the extension points at is removed
    /// first. That lookup is best-effort: a missing or broken association is
    /// logged and skipped. The extension key itself must exist.
    pub fn unregister_extension(&self, extension: &str, root: Root, with_fileclass: bool) -> Result<()> {
        validate_extension(extension)?;

        if with_fileclass {
            match self.associated_fileclass(extension, root) {
                Ok(fileclass) if fileclass.eq_ignore_ascii_case(extension) => {
                    debug!("`{}` points at itself, no separate fileclass to remove", extension);
                }
                Ok(fileclass) => {
                    if let Err(e) = self.unregister_fileclass(&fileclass, root) {
                        debug!("Fileclass `{}` of `{}` not removed: {}", fileclass, extension, e);
                    }
                }
                Err(e) => debug!("No fileclass to remove for `{}`: {}", extension, e),
            }
        }

        self.delete_class(extension, root)
    }
}
