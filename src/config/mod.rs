//! Association manifest configuration
//!
//! A manifest describes a set of fileclasses and the extensions that point at
//! them, so an installer can register them in one call and remove them again
//! later. Manifests are stored as JSON, by default in
//! %APPDATA%\WinregHelpers\associations.json, with atomic writes to prevent
//! corruption.

pub mod manager;
pub mod models;

pub use manager::ManifestManager;
pub use models::{AssociationManifest, ExtensionSpec, FileClassSpec};
