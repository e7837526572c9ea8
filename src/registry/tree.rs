//! Recursive registry subtree deletion
//!
//! The registry refuses to delete a key that still has subkeys, so a subtree is
//! removed depth-first, post-order: every child subtree goes first, then the
//! now-childless key itself.
//!
//! Failure policy:
//! - the key named by the caller must exist, otherwise `NotFound` is returned
//! - a child that disappears between enumeration and deletion counts as deleted
//! - a key that gains a child while it is being emptied (another writer) is
//!   walked again, up to `MAX_DELETE_ATTEMPTS` times
//! - any other failure (e.g. permission denied) aborts the walk; keys already
//!   removed stay removed

use crate::error::{AssocError, Result};
use crate::registry::{RegistryBackend, join_path};
use std::io;
use tracing::debug;

/// Number of times a key is emptied and deleted before a concurrent writer wins
const MAX_DELETE_ATTEMPTS: usize = 3;

/// Recursively delete `sub_key` below `parent`, including all subkeys and values.
///
/// `parent` may be a predefined root or any open key. Errors name the key path
/// relative to `parent`.
pub fn delete_tree<B: RegistryBackend>(backend: &B, parent: &B::Key, sub_key: &str) -> Result<()> {
    match delete_node(backend, parent, sub_key, sub_key)? {
        Removal::Removed => Ok(()),
        Removal::AlreadyGone => Err(AssocError::NotFound(sub_key.to_string())),
    }
}

/// Outcome of deleting one node
enum Removal {
    Removed,
    AlreadyGone,
}

fn delete_node<B: RegistryBackend>(
    backend: &B,
    parent: &B::Key,
    sub_key: &str,
    label: &str,
) -> Result<Removal> {
    let mut attempt = 1;
    loop {
        {
            let node = match backend.open_subkey(parent, sub_key) {
                Ok(node) => node,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Removal::AlreadyGone),
                Err(e) => return Err(AssocError::from_registry(e, label)),
            };
            let children = backend
                .subkey_names(&node)
                .map_err(|e| AssocError::from_registry(e, label))?;
            for child in children {
                let child_label = join_path(label, &child);
                if let Removal::AlreadyGone = delete_node(backend, &node, &child, &child_label)? {
                    debug!("`{}` vanished before it could be removed", child_label);
                }
            }
        }

        match backend.delete_subkey(parent, sub_key) {
            Ok(()) => {
                debug!("Removed `{}`", label);
                return Ok(Removal::Removed);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Removal::AlreadyGone),
            Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty && attempt < MAX_DELETE_ATTEMPTS => {
                debug!(
                    "`{}` gained subkeys while being emptied (attempt {}/{}), walking it again",
                    label, attempt, MAX_DELETE_ATTEMPTS
                );
                attempt += 1;
            }
            Err(e) => return Err(AssocError::from_registry(e, label)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, Root};
    use crate::test_utils::seed_tree;

    #[test]
    fn test_delete_single_key() {
        let registry = MemoryRegistry::new();
        seed_tree(&registry, Root::AllUsers, "Leaf", 0, 0);
        let root = registry.predef(Root::AllUsers);

        delete_tree(&registry, &root, "Leaf").unwrap();
        assert!(!registry.contains_key(Root::AllUsers, "Leaf"));
    }

    #[test]
    fn test_delete_nested_tree_keeps_parent() {
        let registry = MemoryRegistry::new();
        let created = seed_tree(&registry, Root::CurrentUser, "Software\\Classes\\Deep", 3, 3);
        assert_eq!(created, 3 + 9 + 27);
        seed_tree(&registry, Root::CurrentUser, "Software\\Classes\\Sibling", 1, 2);
        assert_eq!(
            registry.descendant_count(Root::CurrentUser, "Software\\Classes\\Deep"),
            Some(3 + 9 + 27)
        );

        let root = registry.predef(Root::CurrentUser);
        delete_tree(&registry, &root, "Software\\Classes\\Deep").unwrap();

        assert!(!registry.contains_key(Root::CurrentUser, "Software\\Classes\\Deep"));
        assert!(registry.contains_key(Root::CurrentUser, "Software\\Classes"));
        assert_eq!(
            registry.descendant_count(Root::CurrentUser, "Software\\Classes\\Sibling"),
            Some(2)
        );
    }

    #[test]
    fn test_delete_below_open_key() {
        let registry = MemoryRegistry::new();
        seed_tree(&registry, Root::AllUsers, "MyApp.Document\\shell", 2, 2);
        let root = registry.predef(Root::AllUsers);
        let class_key = registry.open_subkey(&root, "MyApp.Document").unwrap();

        delete_tree(&registry, &class_key, "shell").unwrap();
        assert!(registry.contains_key(Root::AllUsers, "MyApp.Document"));
        assert!(!registry.contains_key(Root::AllUsers, "MyApp.Document\\shell"));
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let registry = MemoryRegistry::new();
        let root = registry.predef(Root::CurrentUser);
        let err = delete_tree(&registry, &root, "Software\\Classes\\Nope").unwrap_err();
        assert!(matches!(err, AssocError::NotFound(path) if path == "Software\\Classes\\Nope"));
    }

    #[test]
    fn test_permission_failure_aborts_walk() {
        let registry = MemoryRegistry::new();
        seed_tree(&registry, Root::AllUsers, "Guarded", 1, 3);
        registry.deny_delete(Root::AllUsers, "Guarded\\child1");
        let root = registry.predef(Root::AllUsers);

        let err = delete_tree(&registry, &root, "Guarded").unwrap_err();
        match err {
            AssocError::Platform { path, source } => {
                assert_eq!(path, "Guarded\\child1");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Platform error, got {other:?}"),
        }
        // child0 was already gone, child2 was never reached
        assert!(!registry.contains_key(Root::AllUsers, "Guarded\\child0"));
        assert!(registry.contains_key(Root::AllUsers, "Guarded\\child1"));
        assert!(registry.contains_key(Root::AllUsers, "Guarded\\child2"));
    }

    #[test]
    fn test_concurrently_added_child_is_removed_too() {
        let registry = MemoryRegistry::new();
        seed_tree(&registry, Root::AllUsers, "Busy", 1, 1);
        registry.add_child_on_delete(Root::AllUsers, "Busy", "LateArrival");
        let root = registry.predef(Root::AllUsers);

        delete_tree(&registry, &root, "Busy").unwrap();
        assert!(!registry.contains_key(Root::AllUsers, "Busy"));
    }

    #[test]
    fn test_handles_released_on_success_and_failure() {
        let registry = MemoryRegistry::new();
        seed_tree(&registry, Root::AllUsers, "Tree", 2, 2);
        registry.deny_delete(Root::AllUsers, "Tree\\child1\\child0");
        {
            let root = registry.predef(Root::AllUsers);
            assert!(delete_tree(&registry, &root, "Tree").is_err());
            assert!(delete_tree(&registry, &root, "Missing").is_err());
        }
        assert_eq!(registry.open_handles(), 0);
    }
}
