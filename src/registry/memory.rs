//! In-memory registry backend
//!
//! A process-local key tree that follows the Windows registry's rules closely
//! enough for the association logic to be exercised without touching the OS:
//! case-insensitive names, intermediate key creation, and refusal to delete a
//! key that still has subkeys.
//!
//! The store also counts open handles and supports simple fault injection so
//! tests can check handle release and failure paths.

use crate::registry::{RegistryBackend, Root, path_segments};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stored value data
#[derive(Debug)]
enum Value {
    String(String),
    Dword(u32),
}

/// A key node: its display name, values and subkeys (keyed by lowercase name)
#[derive(Debug, Default)]
struct Node {
    name: String,
    values: Vec<(String, Value)>,
    children: BTreeMap<String, Node>,
}

impl Node {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn descendant_count(&self) -> usize {
        self.children
            .values()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    fn value_index(&self, name: &str) -> Option<usize> {
        self.values
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

/// Faults armed for a specific key path
#[derive(Debug, Default)]
struct Faults {
    /// Paths whose deletion fails with `PermissionDenied`
    denied_deletes: Vec<(Root, String)>,
    /// Paths that cannot be opened (`PermissionDenied`), though they may still be created
    denied_opens: Vec<(Root, String)>,
    /// Paths that grow a new child the first time their deletion is attempted
    late_children: HashMap<(Root, String), String>,
}

#[derive(Debug, Default)]
struct State {
    current_user: Node,
    all_users: Node,
    faults: Faults,
}

impl State {
    fn root(&self, root: Root) -> &Node {
        match root {
            Root::CurrentUser => &self.current_user,
            Root::AllUsers => &self.all_users,
        }
    }

    fn root_mut(&mut self, root: Root) -> &mut Node {
        match root {
            Root::CurrentUser => &mut self.current_user,
            Root::AllUsers => &mut self.all_users,
        }
    }

    fn find(&self, root: Root, path: &[String]) -> Option<&Node> {
        path.iter().try_fold(self.root(root), |node, segment| {
            node.children.get(&segment.to_lowercase())
        })
    }

    fn find_mut(&mut self, root: Root, path: &[String]) -> Option<&mut Node> {
        path.iter().try_fold(self.root_mut(root), |node, segment| {
            node.children.get_mut(&segment.to_lowercase())
        })
    }
}

/// Handle to a key of a [`MemoryRegistry`]
///
/// Holds the key's location, not a reference to its node, so a handle to a
/// deleted key reports `NotFound` on use, as an OS handle would.
#[derive(Debug)]
pub struct MemoryKey {
    root: Root,
    path: Vec<String>,
    open_handles: Arc<AtomicUsize>,
}

impl MemoryKey {
    /// Root the key lives under
    pub fn root(&self) -> Root {
        self.root
    }

    /// Full path of the key below its root
    pub fn path(&self) -> String {
        self.path.join("\\")
    }
}

impl Drop for MemoryKey {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory registry store
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<State>,
    open_handles: Arc<AtomicUsize>,
}

fn not_found(root: Root, path: &[String]) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}\\{} does not exist", root.hive_name(), path.join("\\")),
    )
}

fn lowercase_path(path: &str) -> String {
    path_segments(path)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\\")
}

impl MemoryRegistry {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of key handles currently open
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// Whether `path` exists under `root`
    pub fn contains_key(&self, root: Root, path: &str) -> bool {
        let segments: Vec<String> = path_segments(path).map(str::to_string).collect();
        self.state.lock().find(root, &segments).is_some()
    }

    /// Number of keys below `path` (not counting `path` itself), or `None` if it is missing
    pub fn descendant_count(&self, root: Root, path: &str) -> Option<usize> {
        let segments: Vec<String> = path_segments(path).map(str::to_string).collect();
        self.state
            .lock()
            .find(root, &segments)
            .map(Node::descendant_count)
    }

    /// Make every deletion of `path` fail with `PermissionDenied`
    pub fn deny_delete(&self, root: Root, path: &str) {
        self.state
            .lock()
            .faults
            .denied_deletes
            .push((root, lowercase_path(path)));
    }

    /// Make every `open_subkey` of `path` fail with `PermissionDenied`
    pub fn deny_open(&self, root: Root, path: &str) {
        self.state
            .lock()
            .faults
            .denied_opens
            .push((root, lowercase_path(path)));
    }

    /// Store a `REG_DWORD` value on `key`, as other software registering a class would
    pub fn set_dword(&self, key: &MemoryKey, name: &str, value: u32) -> io::Result<()> {
        self.set_value(key, name, Value::Dword(value))
    }

    fn set_value(&self, key: &MemoryKey, name: &str, value: Value) -> io::Result<()> {
        let mut state = self.state.lock();
        let node = state
            .find_mut(key.root, &key.path)
            .ok_or_else(|| not_found(key.root, &key.path))?;
        match node.value_index(name) {
            Some(index) => node.values[index].1 = value,
            None => node.values.push((name.to_string(), value)),
        }
        Ok(())
    }

    /// Simulate a concurrent writer: the first attempt to delete `path` adds
    /// subkey `child` to it just before the emptiness check
    pub fn add_child_on_delete(&self, root: Root, path: &str, child: &str) {
        self.state
            .lock()
            .faults
            .late_children
            .insert((root, lowercase_path(path)), child.to_string());
    }

    fn handle(&self, root: Root, path: Vec<String>) -> MemoryKey {
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        MemoryKey {
            root,
            path,
            open_handles: Arc::clone(&self.open_handles),
        }
    }

    fn resolve(parent: &MemoryKey, path: &str) -> Vec<String> {
        parent
            .path
            .iter()
            .cloned()
            .chain(path_segments(path).map(str::to_string))
            .collect()
    }
}

impl RegistryBackend for MemoryRegistry {
    type Key = MemoryKey;

    fn predef(&self, root: Root) -> MemoryKey {
        self.handle(root, Vec::new())
    }

    fn open_subkey(&self, parent: &MemoryKey, path: &str) -> io::Result<MemoryKey> {
        let full = Self::resolve(parent, path);
        {
            let state = self.state.lock();
            let lowered = full.join("\\").to_lowercase();
            if state
                .faults
                .denied_opens
                .iter()
                .any(|(root, denied)| *root == parent.root && *denied == lowered)
            {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("access to {} is denied", full.join("\\")),
                ));
            }
            if state.find(parent.root, &full).is_none() {
                return Err(not_found(parent.root, &full));
            }
        }
        Ok(self.handle(parent.root, full))
    }

    fn create_subkey(&self, parent: &MemoryKey, path: &str) -> io::Result<MemoryKey> {
        {
            let mut state = self.state.lock();
            let mut node = state
                .find_mut(parent.root, &parent.path)
                .ok_or_else(|| not_found(parent.root, &parent.path))?;
            for segment in path_segments(path) {
                node = node
                    .children
                    .entry(segment.to_lowercase())
                    .or_insert_with(|| Node::named(segment));
            }
        }
        Ok(self.handle(parent.root, Self::resolve(parent, path)))
    }

    fn subkey_names(&self, key: &MemoryKey) -> io::Result<Vec<String>> {
        let state = self.state.lock();
        let node = state
            .find(key.root, &key.path)
            .ok_or_else(|| not_found(key.root, &key.path))?;
        Ok(node.children.values().map(|child| child.name.clone()).collect())
    }

    fn delete_subkey(&self, parent: &MemoryKey, path: &str) -> io::Result<()> {
        let full = Self::resolve(parent, path);
        let Some((target, parent_path)) = full.split_last() else {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot delete predefined key {}", parent.root.hive_name()),
            ));
        };
        let lowered = full
            .iter()
            .map(|segment| segment.to_lowercase())
            .collect::<Vec<_>>()
            .join("\\");

        let mut state = self.state.lock();
        if state
            .faults
            .denied_deletes
            .iter()
            .any(|(root, denied)| *root == parent.root && *denied == lowered)
        {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("access to {} is denied", full.join("\\")),
            ));
        }
        let late_child = state.faults.late_children.remove(&(parent.root, lowered));

        let container = state
            .find_mut(parent.root, parent_path)
            .ok_or_else(|| not_found(parent.root, &full))?;
        let key = target.to_lowercase();
        let node = container
            .children
            .get_mut(&key)
            .ok_or_else(|| not_found(parent.root, &full))?;
        if let Some(child) = late_child {
            node.children
                .insert(child.to_lowercase(), Node::named(&child));
        }
        if !node.children.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("{} still has subkeys", full.join("\\")),
            ));
        }
        container.children.remove(&key);
        Ok(())
    }

    fn get_string(&self, key: &MemoryKey, name: &str) -> io::Result<String> {
        let state = self.state.lock();
        let node = state
            .find(key.root, &key.path)
            .ok_or_else(|| not_found(key.root, &key.path))?;
        match node.value_index(name).map(|index| &node.values[index].1) {
            Some(Value::String(value)) => Ok(value.clone()),
            Some(Value::Dword(data)) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("value {name:?} on {} is a REG_DWORD ({data:#x}), not a string", key.path()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("value {name:?} is not set on {}", key.path()),
            )),
        }
    }

    fn set_string(&self, key: &MemoryKey, name: &str, value: &str) -> io::Result<()> {
        self.set_value(key, name, Value::String(value.to_string()))
    }

    fn value_names(&self, key: &MemoryKey) -> io::Result<Vec<String>> {
        let state = self.state.lock();
        let node = state
            .find(key.root, &key.path)
            .ok_or_else(|| not_found(key.root, &key.path))?;
        Ok(node
            .values
            .iter()
            .filter(|(_, value)| matches!(value, Value::String(_)))
            .map(|(name, _)| name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::KeyPresence;

    #[test]
    fn test_create_makes_intermediate_keys() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::CurrentUser);
        registry
            .create_subkey(&root, "Software\\Classes\\MyApp.Document\\shell\\open")
            .unwrap();

        assert!(registry.contains_key(Root::CurrentUser, "Software\\Classes"));
        assert!(registry.contains_key(Root::CurrentUser, "software/classes/myapp.document/SHELL"));
        assert!(!registry.contains_key(Root::AllUsers, "Software"));
        assert_eq!(registry.descendant_count(Root::CurrentUser, ""), Some(5));
    }

    #[test]
    fn test_names_are_case_insensitive_but_preserved() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::AllUsers);
        let key = registry.create_subkey(&root, "MyApp.Document").unwrap();
        registry.set_string(&key, "FriendlyTypeName", "first").unwrap();
        registry.set_string(&key, "friendlytypename", "second").unwrap();

        assert_eq!(registry.value_names(&key).unwrap(), ["FriendlyTypeName"]);
        assert_eq!(registry.get_string(&key, "FRIENDLYTYPENAME").unwrap(), "second");
        assert_eq!(registry.subkey_names(&root).unwrap(), ["MyApp.Document"]);
    }

    #[test]
    fn test_delete_refuses_non_empty_key() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::AllUsers);
        registry.create_subkey(&root, "a\\b").unwrap();

        let err = registry.delete_subkey(&root, "a").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::DirectoryNotEmpty);

        registry.delete_subkey(&root, "a\\b").unwrap();
        registry.delete_subkey(&root, "a").unwrap();
        assert!(!registry.contains_key(Root::AllUsers, "a"));
    }

    #[test]
    fn test_delete_missing_key_is_not_found() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::CurrentUser);
        let err = registry.delete_subkey(&root, "missing").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_predefined_root_cannot_be_deleted() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::CurrentUser);
        let err = registry.delete_subkey(&root, "").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_handle_to_deleted_key_reports_not_found() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::AllUsers);
        let key = registry.create_subkey(&root, ".foo").unwrap();
        registry.delete_subkey(&root, ".foo").unwrap();

        let err = registry.set_string(&key, "", "MyApp.Document").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_open_handles_are_counted() {
        let registry = MemoryRegistry::new();
        assert_eq!(registry.open_handles(), 0);
        {
            let root = registry.predef(Root::CurrentUser);
            let _key = registry.create_subkey(&root, "x").unwrap();
            assert_eq!(registry.open_handles(), 2);
            assert!(registry.open_subkey(&root, "y").is_err());
            assert_eq!(registry.open_handles(), 2);
        }
        assert_eq!(registry.open_handles(), 0);
    }

    #[test]
    fn test_key_presence() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::AllUsers);
        registry.create_subkey(&root, ".foo").unwrap();

        assert!(matches!(registry.key_presence(&root, ".foo"), KeyPresence::Exists));
        assert!(matches!(registry.key_presence(&root, ".bar"), KeyPresence::NotFound));

        registry.deny_open(Root::AllUsers, ".FOO");
        match registry.key_presence(&root, ".foo") {
            KeyPresence::Error(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_denied_open_still_allows_create() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::CurrentUser);
        registry.deny_open(Root::CurrentUser, "Software\\Locked");

        let err = registry.open_subkey(&root, "Software\\Locked").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        registry.create_subkey(&root, "Software\\Locked").unwrap();
        assert!(registry.open_subkey(&root, "Software\\Locked").is_err());
        assert_eq!(registry.open_handles(), 1);
    }

    #[test]
    fn test_dword_values_are_not_strings() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::AllUsers);
        let key = registry.create_subkey(&root, "txtfile").unwrap();
        registry.set_string(&key, "", "Text Document").unwrap();
        registry.set_dword(&key, "EditFlags", 0x0021_0000).unwrap();

        assert_eq!(registry.value_names(&key).unwrap(), [""]);
        let err = registry.get_string(&key, "EditFlags").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_denied_delete() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::AllUsers);
        registry.create_subkey(&root, "Locked").unwrap();
        registry.deny_delete(Root::AllUsers, "locked");

        let err = registry.delete_subkey(&root, "Locked").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(registry.contains_key(Root::AllUsers, "Locked"));
    }

    #[test]
    fn test_late_child_is_added_once() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::AllUsers);
        registry.create_subkey(&root, "Busy").unwrap();
        registry.add_child_on_delete(Root::AllUsers, "Busy", "Intruder");

        let err = registry.delete_subkey(&root, "Busy").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::DirectoryNotEmpty);
        assert!(registry.contains_key(Root::AllUsers, "Busy\\Intruder"));

        registry.delete_subkey(&root, "Busy\\Intruder").unwrap();
        registry.delete_subkey(&root, "Busy").unwrap();
    }
}
