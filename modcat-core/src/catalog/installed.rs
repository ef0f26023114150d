//! Local installation state
//!
//! `LocalInstallationState` reports which modules are on this shop and how
//! they are configured. `InstallationLock` keeps that state in a YAML file
//! alongside the category hierarchy used to resolve parent categories.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{CategoryRef, ModuleRecord, Origin};

/// Default installation state location
pub const STATE_FILE: &str = ".modcat/installed.yaml";

/// Source of local installation state
pub trait LocalInstallationState {
    /// Modules present locally.
    ///
    /// Disabled modules are skipped unless `include_disabled` is set. Modules
    /// bought on the marketplace are only listed for an `authenticated`
    /// shop. `actor_id` identifies the employee asking.
    fn list_installed_modules(
        &self,
        include_disabled: bool,
        authenticated: bool,
        actor_id: i64,
    ) -> Result<Vec<ModuleRecord>>;

    /// Parent of a category, if the hierarchy knows it
    fn parent_category(&self, category_name: &str) -> Option<CategoryRef>;
}

/// The installation state file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationLock {
    /// API version for schema compatibility
    pub api_version: String,

    /// When this file was last updated
    pub generated: String,

    /// Modules present on disk
    #[serde(default)]
    pub modules: Vec<LocalModule>,

    /// Category name → parent category
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryNode>,
}

/// A module present on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalModule {
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    /// Version of the code on disk
    #[serde(default)]
    pub version: Option<String>,

    /// Whether the module is installed (present on disk otherwise)
    #[serde(default = "default_true")]
    pub installed: bool,

    /// Version recorded when the module was installed
    #[serde(default)]
    pub installed_version: Option<String>,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub active_on_mobile: bool,

    #[serde(default)]
    pub is_configurable: bool,

    #[serde(default)]
    pub category_name: String,

    #[serde(default)]
    pub origin: Option<Origin>,

    /// When this module was installed
    #[serde(default)]
    pub installed_at: Option<String>,
}

fn default_true() -> bool {
    true
}

/// An entry in the category hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    /// Parent category key
    pub parent: String,

    #[serde(default)]
    pub display_name: Option<String>,
}

impl Default for InstallationLock {
    fn default() -> Self {
        Self {
            api_version: "modcat.dev/v1".to_string(),
            generated: chrono::Utc::now().to_rfc3339(),
            modules: Vec::new(),
            categories: BTreeMap::new(),
        }
    }
}

impl LocalModule {
    fn to_record(&self, parent: Option<CategoryRef>) -> ModuleRecord {
        ModuleRecord {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            origin: self.origin,
            origin_filter_value: self.origin.and_then(Origin::filter_value),
            category_name: self.category_name.clone(),
            category_parent: parent,
            installed: self.installed,
            installed_version: self.installed_version.clone(),
            active: self.active,
            active_on_mobile: self.active_on_mobile,
            is_configurable: self.is_configurable,
            is_present_on_disk: true,
            ..ModuleRecord::default()
        }
    }
}

impl InstallationLock {
    /// Load state file from a specific path; a missing file is an empty state
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read installation state: {}", path.display()))?;

        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse installation state: {}", path.display()))
    }
}

impl LocalInstallationState for InstallationLock {
    fn list_installed_modules(
        &self,
        include_disabled: bool,
        authenticated: bool,
        actor_id: i64,
    ) -> Result<Vec<ModuleRecord>> {
        tracing::trace!(actor_id, include_disabled, authenticated, "Listing local modules");

        Ok(self
            .modules
            .iter()
            .filter(|m| include_disabled || !m.installed || m.active)
            .filter(|m| authenticated || m.origin != Some(Origin::Customer))
            .map(|m| m.to_record(self.parent_category(&m.category_name)))
            .collect())
    }

    fn parent_category(&self, category_name: &str) -> Option<CategoryRef> {
        self.categories.get(category_name).map(|node| CategoryRef {
            name: node.parent.clone(),
            display_name: node.display_name.clone(),
        })
    }
}
