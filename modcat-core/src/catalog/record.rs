//! Catalog records
//!
//! `RawRecord` is what the marketplace sends for one module in a category;
//! `ModuleRecord` is the stamped entry stored in a catalog snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::actions::{ModuleAction, PrimaryAction};

/// Product type used when the marketplace gives neither an explicit type nor
/// a type tag.
pub const DEFAULT_PRODUCT_TYPE: &str = "module";

/// Where a catalog entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    #[serde(rename = "must-have")]
    MustHave,
    #[serde(rename = "service")]
    Service,
    #[serde(rename = "native")]
    Native,
    #[serde(rename = "native_all")]
    NativeAll,
    #[serde(rename = "customer")]
    Customer,
    #[serde(rename = "partner")]
    Partner,
}

impl Origin {
    /// Marketplace category name for this origin
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::MustHave => "must-have",
            Origin::Service => "service",
            Origin::Native => "native",
            Origin::NativeAll => "native_all",
            Origin::Customer => "customer",
            Origin::Partner => "partner",
        }
    }

    /// Parse a marketplace category name
    pub fn from_category(category: &str) -> Option<Self> {
        match category {
            "must-have" => Some(Origin::MustHave),
            "service" => Some(Origin::Service),
            "native" => Some(Origin::Native),
            "native_all" => Some(Origin::NativeAll),
            "customer" => Some(Origin::Customer),
            "partner" => Some(Origin::Partner),
            _ => None,
        }
    }

    /// Filter value used for downstream categorization.
    ///
    /// Partner modules are never fetched as a category and have none.
    pub fn filter_value(self) -> Option<OriginFilter> {
        match self {
            Origin::MustHave => Some(OriginFilter::MustHave),
            Origin::Service => Some(OriginFilter::Service),
            Origin::Native => Some(OriginFilter::Native),
            Origin::NativeAll => Some(OriginFilter::NativeAll),
            Origin::Customer => Some(OriginFilter::Customer),
            Origin::Partner => None,
        }
    }

    /// Origins whose modules can be installed without a purchase
    pub fn is_freely_installable(self) -> bool {
        matches!(
            self,
            Origin::Native | Origin::NativeAll | Origin::Partner | Origin::Customer
        )
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin value used downstream to categorize catalog entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginFilter {
    MustHave,
    Service,
    Native,
    NativeAll,
    Customer,
}

/// A resolved parent category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    /// Category key
    pub name: String,

    /// Human-readable label, when the hierarchy provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl CategoryRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
        }
    }
}

/// One module as returned by the marketplace for a category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub category_name: String,

    /// Explicit product type, preferred over the type tag
    #[serde(default, alias = "product_type")]
    pub product_type: Option<String>,

    /// Plural grouping tag the record was listed under (e.g. `modules`)
    #[serde(default)]
    pub type_tag: Option<String>,
}

impl RawRecord {
    /// Product type for this record.
    ///
    /// An explicit `product_type` wins. Otherwise the plural type tag has its
    /// trailing `s` characters trimmed; without a tag the type is `module`.
    pub fn resolve_product_type(&self) -> String {
        if let Some(explicit) = &self.product_type {
            return explicit.clone();
        }
        match &self.type_tag {
            Some(tag) => tag.trim_end_matches('s').to_string(),
            None => DEFAULT_PRODUCT_TYPE.to_string(),
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    /// Unique key within a snapshot
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    /// Version offered by the catalog (or found on disk)
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub origin: Option<Origin>,

    #[serde(default)]
    pub origin_filter_value: Option<OriginFilter>,

    #[serde(default)]
    pub product_type: String,

    #[serde(default)]
    pub category_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_parent: Option<CategoryRef>,

    #[serde(default)]
    pub installed: bool,

    /// Version recorded at install time
    #[serde(default)]
    pub installed_version: Option<String>,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub active_on_mobile: bool,

    #[serde(default)]
    pub is_configurable: bool,

    #[serde(default)]
    pub is_present_on_disk: bool,

    /// Action URLs; only set when at least one action is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<BTreeMap<ModuleAction, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_action: Option<PrimaryAction>,
}

impl ModuleRecord {
    /// Create a bare record with only a name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            ..Self::default()
        }
    }

    /// Stamp a marketplace record with its provenance
    pub fn from_raw(raw: RawRecord, origin: Origin, category_parent: Option<CategoryRef>) -> Self {
        let product_type = raw.resolve_product_type();
        Self {
            name: raw.name,
            display_name: raw.display_name,
            description: raw.description,
            version: raw.version,
            origin: Some(origin),
            origin_filter_value: origin.filter_value(),
            product_type,
            category_name: raw.category_name,
            category_parent,
            ..Self::default()
        }
    }

    /// Whether the available version is newer than the installed one
    pub fn can_be_upgraded(&self) -> bool {
        if !self.installed {
            return false;
        }
        let (Some(available), Some(installed)) = (&self.version, &self.installed_version) else {
            return false;
        };
        match (
            semver::Version::parse(available),
            semver::Version::parse(installed),
        ) {
            (Ok(available), Ok(installed)) => available > installed,
            _ => false,
        }
    }

    /// Truncate description to first line
    pub fn short_description(&self) -> &str {
        self.description
            .lines()
            .next()
            .unwrap_or(&self.description)
            .trim()
    }
}
