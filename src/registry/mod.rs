//! Registry access layer
//!
//! This module defines the capability the association logic is written against,
//! so the same code drives the live Windows registry and an in-memory fake.
//!
//! # Overview
//!
//! - `Root`: the two class roots an association can live under
//! - `RegistryBackend`: open/create/delete/enumerate/get/set over one registry store
//! - `KeyPresence`: tri-state existence check used before overwriting
//! - `tree`: recursive subtree deletion built on the backend
//!
//! # Backends
//!
//! - `MemoryRegistry`: process-local tree with OS-equivalent semantics (all platforms)
//! - `WindowsRegistry`: the real registry via the `winreg` crate (Windows only)
//!
//! # Example Usage
//!
//! ```
//! use winreg_helpers::registry::{MemoryRegistry, RegistryBackend, Root};
//!
//! let registry = MemoryRegistry::new();
//! let root = registry.predef(Root::CurrentUser);
//! let key = registry.create_subkey(&root, "Software\\Classes\\.foo")?;
//! registry.set_string(&key, "", "MyApp.Document")?;
//! assert_eq!(registry.get_string(&key, "")?, "MyApp.Document");
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod memory;
pub mod tree;

#[cfg(windows)]
pub mod native;

pub use memory::{MemoryKey, MemoryRegistry};
pub use tree::delete_tree;

#[cfg(windows)]
pub use native::WindowsRegistry;

use std::io;

/// Per-user location of the classes store under `HKEY_CURRENT_USER`
pub const USER_CLASSES_PATH: &str = "Software\\Classes";

/// Registry root an association is written under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Root {
    /// `HKEY_CURRENT_USER`, classes live under `Software\Classes`
    CurrentUser,
    /// `HKEY_CLASSES_ROOT`, classes live directly under the root
    AllUsers,
}

impl Root {
    /// Map the caller's "all users?" flag to a root
    pub fn from_all_users(all_users: bool) -> Self {
        if all_users {
            Self::AllUsers
        } else {
            Self::CurrentUser
        }
    }

    /// Path of the class key `name` relative to this root
    pub fn class_path(self, name: &str) -> String {
        match self {
            Self::CurrentUser => format!("{USER_CLASSES_PATH}\\{name}"),
            Self::AllUsers => name.to_string(),
        }
    }

    /// Conventional hive name, used in logs and error messages
    pub fn hive_name(self) -> &'static str {
        match self {
            Self::CurrentUser => "HKEY_CURRENT_USER",
            Self::AllUsers => "HKEY_CLASSES_ROOT",
        }
    }
}

/// Result of probing a key for existence
#[derive(Debug)]
pub enum KeyPresence {
    /// Key opened successfully
    Exists,
    /// OS reported the key as missing
    NotFound,
    /// Probing failed for another reason
    Error(io::Error),
}

/// Registry store operations used by the association logic.
///
/// All paths are relative to the given parent key and may span several levels,
/// separated by `\` (or `/`). Handles are scoped: dropping a `Key` releases it.
/// Value names are plain text; the empty name addresses the key's default value.
pub trait RegistryBackend {
    /// Open key handle, released on drop
    type Key;

    /// Handle to one of the predefined roots
    fn predef(&self, root: Root) -> Self::Key;

    /// Open an existing key below `parent`
    fn open_subkey(&self, parent: &Self::Key, path: &str) -> io::Result<Self::Key>;

    /// Open `path` below `parent`, creating it and any missing intermediate keys
    fn create_subkey(&self, parent: &Self::Key, path: &str) -> io::Result<Self::Key>;

    /// Names of the immediate subkeys of `key`
    fn subkey_names(&self, key: &Self::Key) -> io::Result<Vec<String>>;

    /// Delete `path` below `parent` together with its values.
    ///
    /// Fails with `io::ErrorKind::DirectoryNotEmpty` while the key still has subkeys.
    fn delete_subkey(&self, parent: &Self::Key, path: &str) -> io::Result<()>;

    /// Read a string value (`""` is the default value).
    ///
    /// Fails with `io::ErrorKind::InvalidData` if the value holds another type.
    fn get_string(&self, key: &Self::Key, name: &str) -> io::Result<String>;

    /// Write a string value (`""` is the default value)
    fn set_string(&self, key: &Self::Key, name: &str, value: &str) -> io::Result<()>;

    /// Names of the string values stored on `key`, in enumeration order.
    ///
    /// Values of other types (`REG_DWORD`, `REG_BINARY`, ...) are not listed.
    fn value_names(&self, key: &Self::Key) -> io::Result<Vec<String>>;

    /// Probe `path` below `parent` without raising on absence
    fn key_presence(&self, parent: &Self::Key, path: &str) -> KeyPresence {
        match self.open_subkey(parent, path) {
            Ok(_key) => KeyPresence::Exists,
            Err(e) if e.kind() == io::ErrorKind::NotFound => KeyPresence::NotFound,
            Err(e) => KeyPresence::Error(e),
        }
    }
}

/// Split a key path into its non-empty segments
pub(crate) fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['\\', '/']).filter(|segment| !segment.is_empty())
}

/// Join a parent path and a child name with the registry separator
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}\\{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_from_all_users() {
        assert_eq!(Root::from_all_users(false), Root::CurrentUser);
        assert_eq!(Root::from_all_users(true), Root::AllUsers);
    }

    #[test]
    fn test_class_path_per_root() {
        assert_eq!(
            Root::CurrentUser.class_path("MyApp.Document"),
            "Software\\Classes\\MyApp.Document"
        );
        assert_eq!(Root::AllUsers.class_path(".foo"), ".foo");
    }

    #[test]
    fn test_path_segments_accepts_both_separators() {
        let segments: Vec<_> = path_segments("Software/Classes\\\\MyApp\\").collect();
        assert_eq!(segments, ["Software", "Classes", "MyApp"]);
        assert_eq!(path_segments("").count(), 0);
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "shell"), "shell");
        assert_eq!(join_path("shell", "open"), "shell\\open");
    }
}
