//! Manifest data models
//!
//! Detail maps use JSON `null` for entries that should not be written, so a
//! manifest can declare an optional field without producing an empty value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fileclass to register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileClassSpec {
    /// Class name (e.g. `MyApp.Document`)
    pub name: String,
    /// Human-readable description stored as the class key's default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sub-entry path -> default value (e.g. `shell\open\command`)
    #[serde(default)]
    pub details: BTreeMap<String, Option<String>>,
}

/// An extension association to register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSpec {
    /// File extension including the leading dot (e.g. `.foo`)
    pub extension: String,
    /// Fileclass the extension maps to
    pub fileclass: String,
    /// Named values stored on the extension key (e.g. `Content Type`)
    #[serde(default)]
    pub details: BTreeMap<String, Option<String>>,
}

/// Set of fileclasses and extensions managed together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationManifest {
    /// Register for all users (`HKEY_CLASSES_ROOT`) instead of the current user
    #[serde(default)]
    pub all_users: bool,
    /// Replace existing registrations instead of failing
    #[serde(default)]
    pub overwrite: bool,
    /// Fileclasses, registered before any extension
    #[serde(default)]
    pub fileclasses: Vec<FileClassSpec>,
    /// Extension associations
    #[serde(default)]
    pub extensions: Vec<ExtensionSpec>,
}

/// Borrow a detail map in the form the registration calls take
pub(crate) fn borrowed_details(details: &BTreeMap<String, Option<String>>) -> Vec<(&str, Option<&str>)> {
    details
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_deref()))
        .collect()
}
