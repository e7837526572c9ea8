#![expect(
    clippy::unwrap_used,
    reason = "Test utilities use .unwrap() for brevity"
)]

//! Shared test utilities for `winreg-helpers` unit tests.
//!
//! This module is only compiled during testing (`#[cfg(test)]`).

use crate::registry::{MemoryRegistry, RegistryBackend, Root};

/// Create `path` under `root` with a default value, then `breadth` children
/// per key, `depth` levels deep. Returns the number of keys created below `path`.
pub fn seed_tree(registry: &MemoryRegistry, root: Root, path: &str, depth: usize, breadth: usize) -> usize {
    let root_key = registry.predef(root);
    let key = registry.create_subkey(&root_key, path).unwrap();
    registry.set_string(&key, "", "seeded").unwrap();
    registry.set_string(&key, "Depth", &depth.to_string()).unwrap();
    if depth == 0 {
        return 0;
    }
    (0..breadth)
        .map(|i| 1 + seed_tree(registry, root, &format!("{path}\\child{i}"), depth - 1, breadth))
        .sum()
}
