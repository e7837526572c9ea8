//! Windows registry backend
//!
//! Thin adapter from [`RegistryBackend`] to the `winreg` crate. `RegKey` closes
//! its handle on drop, which gives the scoped release the trait asks for.

use crate::registry::{RegistryBackend, Root};
use std::io;
use winreg::RegKey;
use winreg::enums::{HKEY_CLASSES_ROOT, HKEY_CURRENT_USER, KEY_READ, RegType};

/// `ERROR_ACCESS_DENIED`, also returned by `RegDeleteKey` for keys that still have subkeys
const ERROR_ACCESS_DENIED: i32 = 5;

/// `ERROR_BAD_FILE_TYPE`, raised by `winreg` when a value is read as the wrong type
const ERROR_BAD_FILE_TYPE: i32 = 222;

/// The live registry of the current Windows session
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegistry;

impl WindowsRegistry {
    /// Create a handle to the system registry
    pub fn new() -> Self {
        Self
    }
}

impl RegistryBackend for WindowsRegistry {
    type Key = RegKey;

    fn predef(&self, root: Root) -> RegKey {
        match root {
            Root::CurrentUser => RegKey::predef(HKEY_CURRENT_USER),
            Root::AllUsers => RegKey::predef(HKEY_CLASSES_ROOT),
        }
    }

    /// Read-only handle; values are only written through `create_subkey` handles.
    fn open_subkey(&self, parent: &RegKey, path: &str) -> io::Result<RegKey> {
        parent.open_subkey_with_flags(path, KEY_READ)
    }

    fn create_subkey(&self, parent: &RegKey, path: &str) -> io::Result<RegKey> {
        let (key, _disposition) = parent.create_subkey(path)?;
        Ok(key)
    }

    fn subkey_names(&self, key: &RegKey) -> io::Result<Vec<String>> {
        key.enum_keys().collect()
    }

    fn delete_subkey(&self, parent: &RegKey, path: &str) -> io::Result<()> {
        match parent.delete_subkey(path) {
            Err(e) if e.raw_os_error() == Some(ERROR_ACCESS_DENIED) && has_subkeys(parent, path) => {
                Err(io::Error::new(
                    io::ErrorKind::DirectoryNotEmpty,
                    format!("`{path}` still has subkeys"),
                ))
            }
            result => result,
        }
    }

    fn get_string(&self, key: &RegKey, name: &str) -> io::Result<String> {
        key.get_value::<String, _>(name).map_err(|e| {
            if e.raw_os_error() == Some(ERROR_BAD_FILE_TYPE) {
                io::Error::new(io::ErrorKind::InvalidData, format!("value {name:?} is not a string"))
            } else {
                e
            }
        })
    }

    fn set_string(&self, key: &RegKey, name: &str, value: &str) -> io::Result<()> {
        key.set_value(name, &value)
    }

    fn value_names(&self, key: &RegKey) -> io::Result<Vec<String>> {
        key.enum_values()
            .filter_map(|value| match value {
                Ok((name, data)) => {
                    matches!(data.vtype, RegType::REG_SZ | RegType::REG_EXPAND_SZ).then_some(Ok(name))
                }
                Err(e) => Some(Err(e)),
            })
            .collect()
    }
}

/// Whether `path` below `parent` currently has subkeys (false if it cannot be inspected)
fn has_subkeys(parent: &RegKey, path: &str) -> bool {
    parent
        .open_subkey_with_flags(path, KEY_READ)
        .and_then(|key| key.query_info())
        .is_ok_and(|info| info.sub_keys > 0)
}
