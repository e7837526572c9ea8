//! `winreg-helpers` - Windows file type association helpers
//!
//! Creates and removes file classes (`MyApp.Document`) and extension
//! associations (`.foo`) in the Windows registry, deletes registry subtrees,
//! and notifies the shell so Explorer refreshes file icons.
//!
//! Registry access goes through the [`registry::RegistryBackend`] trait: the
//! live registry on Windows ([`registry::WindowsRegistry`]) or an in-memory
//! store ([`registry::MemoryRegistry`]) for tests and non-Windows builds.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(windows)]
//! # fn example() -> winreg_helpers::Result<()> {
//! use winreg_helpers::{AssociationManager, Root, refresh_icons};
//!
//! let manager = AssociationManager::system();
//! manager.register_fileclass(
//!     "MyApp.Document",
//!     &[("shell\\open\\command", Some(r#""C:\MyApp\myapp.exe" "%1""#))],
//!     Root::CurrentUser,
//!     Some("MyApp document"),
//!     true,
//! )?;
//! manager.register_extension(".foo", "MyApp.Document", &[], Root::CurrentUser, true)?;
//! refresh_icons();
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod assoc;
pub mod config;
pub mod error;
pub mod registry;
pub mod shell;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use assoc::{AssociationManager, ClassEntry, Details};
pub use error::{AssocError, Result};
pub use registry::{RegistryBackend, Root};
pub use shell::{refresh_icons, refresh_icons_with_timeout};
