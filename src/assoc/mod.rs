//! File class and extension association management
//!
//! `AssociationManager` implements the registration workflow on top of any
//! [`RegistryBackend`]:
//!
//! - **Fileclasses** (`MyApp.Document`): a key whose default value is a
//!   human-readable description, with sub-entries such as `DefaultIcon` or
//!   `shell\open\command`, each holding a default string value
//! - **Extensions** (`.foo`): a key whose default value names the fileclass
//!   that handles it, plus optional named values (`Content Type`, `PerceivedType`)
//!
//! Registering a fileclass and its extensions is a sequence of independent
//! registry writes, not a transaction. Register the fileclass first, then the
//! extensions; unregister in the opposite order. Nothing here notifies the
//! shell: call [`crate::shell::refresh_icons`] afterwards if Explorer should
//! pick the changes up immediately.
//!
//! # Example Usage
//!
//! ```
//! use winreg_helpers::assoc::AssociationManager;
//! use winreg_helpers::registry::{MemoryRegistry, Root};
//!
//! let manager = AssociationManager::new(MemoryRegistry::new());
//! manager.register_fileclass(
//!     "MyApp.Document",
//!     &[("shell\\open\\command", Some(r#""C:\MyApp\myapp.exe" "%1""#))],
//!     Root::CurrentUser,
//!     Some("MyApp document"),
//!     false,
//! )?;
//! manager.register_extension(".foo", "MyApp.Document", &[], Root::CurrentUser, false)?;
//! assert_eq!(manager.associated_fileclass(".foo", Root::CurrentUser)?, "MyApp.Document");
//!
//! manager.unregister_extension(".foo", Root::CurrentUser, true)?;
//! assert!(manager.get_class("MyApp.Document", Root::CurrentUser).is_err());
//! # Ok::<(), winreg_helpers::AssocError>(())
//! ```

mod extension;
mod fileclass;
mod manifest;

use crate::error::{AssocError, Result};
use crate::registry::{KeyPresence, RegistryBackend, Root, delete_tree, join_path};
use std::collections::BTreeMap;
use std::io;
use tracing::info;

/// Named string entries supplied at registration; `None` values are skipped
pub type Details<'a> = [(&'a str, Option<&'a str>)];

/// Snapshot of a class or extension key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassEntry {
    /// Key name (fileclass name or extension)
    pub name: String,
    /// Default value: the description of a fileclass, the fileclass of an extension
    pub default_value: Option<String>,
    /// Named values stored on the key itself
    pub values: BTreeMap<String, String>,
    /// Sub-entries with a default value, keyed by path relative to the class key
    pub entries: BTreeMap<String, String>,
}

/// Registers and removes file classes and extension associations
#[derive(Debug)]
pub struct AssociationManager<B: RegistryBackend> {
    backend: B,
}

#[cfg(windows)]
impl AssociationManager<crate::registry::WindowsRegistry> {
    /// Manager over the live registry of the current session
    pub fn system() -> Self {
        Self::new(crate::registry::WindowsRegistry::new())
    }
}

impl<B: RegistryBackend> AssociationManager<B> {
    /// Create a manager over `backend`
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The registry backend in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open the class key `name` (a fileclass or an extension)
    pub fn get_class(&self, name: &str, root: Root) -> Result<B::Key> {
        validate_name(name)?;
        let path = root.class_path(name);
        let root_key = self.backend.predef(root);
        self.backend
            .open_subkey(&root_key, &path)
            .map_err(|e| AssocError::from_registry(e, &path).under(root))
    }

    /// Read the default value, named values and sub-entries of class `name`
    ///
    /// Only string data is collected; values of other types, such as the
    /// `EditFlags` DWORD many system classes carry, are skipped.
    pub fn read_class(&self, name: &str, root: Root) -> Result<ClassEntry> {
        let key = self.get_class(name, root)?;
        let path = root.class_path(name);
        let registry_error = |e: io::Error| AssocError::from_registry(e, &path).under(root);

        let mut entry = ClassEntry {
            name: name.to_string(),
            ..ClassEntry::default()
        };
        for value_name in self.backend.value_names(&key).map_err(registry_error)? {
            let value = self
                .backend
                .get_string(&key, &value_name)
                .map_err(registry_error)?;
            if value_name.is_empty() {
                entry.default_value = Some(value);
            } else {
                entry.values.insert(value_name, value);
            }
        }
        self.collect_entries(&key, "", &mut entry.entries)
            .map_err(registry_error)?;
        Ok(entry)
    }

    /// Delete the class key `name` and everything below it
    pub fn delete_class(&self, name: &str, root: Root) -> Result<()> {
        validate_name(name)?;
        let path = root.class_path(name);
        let root_key = self.backend.predef(root);
        delete_tree(&self.backend, &root_key, &path).map_err(|e| e.under(root))?;
        info!("Removed class key `{}\\{}`", root.hive_name(), path);
        Ok(())
    }

    /// Recursively delete `sub_key` below `root`
    pub fn delete_tree(&self, root: Root, sub_key: &str) -> Result<()> {
        let root_key = self.backend.predef(root);
        delete_tree(&self.backend, &root_key, sub_key).map_err(|e| e.under(root))
    }

    /// Make room for a new registration at `path`
    ///
    /// Removes an existing key when `overwrite` is set, otherwise refuses with
    /// `AlreadyExists`.
    fn prepare_target(&self, root_key: &B::Key, root: Root, path: &str, overwrite: bool) -> Result<()> {
        match self.backend.key_presence(root_key, path) {
            KeyPresence::NotFound => Ok(()),
            KeyPresence::Exists if overwrite => {
                info!("Overwriting existing key `{}\\{}`", root.hive_name(), path);
                delete_tree(&self.backend, root_key, path).map_err(|e| e.under(root))
            }
            KeyPresence::Exists => Err(AssocError::AlreadyExists(path.to_string()).under(root)),
            KeyPresence::Error(e) => Err(AssocError::from_registry(e, path).under(root)),
        }
    }

    fn collect_entries(
        &self,
        key: &B::Key,
        prefix: &str,
        entries: &mut BTreeMap<String, String>,
    ) -> io::Result<()> {
        for child in self.backend.subkey_names(key)? {
            let child_key = self.backend.open_subkey(key, &child)?;
            let relative = join_path(prefix, &child);
            match self.backend.get_string(&child_key, "") {
                Ok(value) => {
                    entries.insert(relative.clone(), value);
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::InvalidData) => {}
                Err(e) => return Err(e),
            }
            self.collect_entries(&child_key, &relative, entries)?;
        }
        Ok(())
    }
}

/// Reject names that would not address exactly one key below the classes root
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['\\', '/']) {
        return Err(AssocError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Extensions are class names that start with a dot (`.foo`)
fn validate_extension(extension: &str) -> Result<()> {
    validate_name(extension)?;
    if extension.len() < 2 || !extension.starts_with('.') {
        return Err(AssocError::InvalidName(extension.to_string()));
    }
    Ok(())
}

/// Keep only the entries that carry a value, rejecting blank entry paths up front
fn present_details<'a>(details: &'a Details<'a>) -> Result<Vec<(&'a str, &'a str)>> {
    details
        .iter()
        .filter_map(|&(name, value)| value.map(|value| (name, value)))
        .map(|(name, value)| {
            if crate::registry::path_segments(name).next().is_none() {
                Err(AssocError::InvalidName(name.to_string()))
            } else {
                Ok((name, value))
            }
        })
        .collect()
}
