//! Remote marketplace access
//!
//! `RemoteMarketplace` is the seam to the marketplace service. Transport and
//! authentication belong to the implementation; the catalog only probes
//! availability and asks for a category's records.
//!
//! `DirectoryMarketplace` serves a mirrored marketplace from disk:
//!
//! ```text
//! <root>/
//!   must-have.json     ← one document per category
//!   service.json
//!   native.json
//!   native_all.json
//!   customer.json
//!   module/<id>.json   ← single-module lookups
//! ```
//!
//! A category document is either a list of records or an object grouping
//! records under plural type tags (`{"modules": [...], "themes": [...]}`).
//! Groups are read in document order, so a name listed under two tags keeps
//! the later one once merged into a snapshot.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::RawRecord;
use crate::error::TransportError;

/// Category used for single-module lookups
pub const MODULE_CATEGORY: &str = "module";

/// Response encoding requested from the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
}

impl ResponseFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
        }
    }
}

/// Parameters for a marketplace request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub format: ResponseFormat,
    pub extra: BTreeMap<String, String>,
}

impl RequestParams {
    pub fn json() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(|s| s.as_str())
    }
}

/// The marketplace service
pub trait RemoteMarketplace {
    /// Availability probe; an unavailable marketplace is skipped, not an error
    fn is_up(&self) -> bool;

    /// Whether the shop is signed in to the marketplace
    fn is_authenticated(&self) -> bool;

    /// Fetch the records of a category
    fn request(
        &self,
        category: &str,
        params: &RequestParams,
    ) -> Result<Vec<RawRecord>, TransportError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryDocument {
    List(Vec<RawRecord>),
    Grouped(TypeGroups),
    Single(RawRecord),
}

/// Records grouped under plural type tags, in document order
struct TypeGroups(Vec<(String, Vec<RawRecord>)>);

impl<'de> Deserialize<'de> for TypeGroups {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = TypeGroups;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of type tags to record lists")
            }

            fn visit_map<A>(self, mut map: A) -> Result<TypeGroups, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut groups = Vec::new();
                while let Some(entry) = map.next_entry::<String, Vec<RawRecord>>()? {
                    groups.push(entry);
                }
                Ok(TypeGroups(groups))
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

impl CategoryDocument {
    fn into_records(self) -> Vec<RawRecord> {
        match self {
            CategoryDocument::List(records) => records,
            CategoryDocument::Single(record) => vec![record],
            CategoryDocument::Grouped(TypeGroups(groups)) => groups
                .into_iter()
                .flat_map(|(tag, records)| {
                    records.into_iter().map(move |mut record| {
                        if record.type_tag.is_none() {
                            record.type_tag = Some(tag.clone());
                        }
                        record
                    })
                })
                .collect(),
        }
    }
}

/// Decode a category document
pub fn parse_category(category: &str, content: &str) -> Result<Vec<RawRecord>, TransportError> {
    serde_json::from_str::<CategoryDocument>(content)
        .map(CategoryDocument::into_records)
        .map_err(|source| TransportError::Malformed {
            category: category.to_string(),
            source,
        })
}

/// Marketplace mirrored into a local directory
#[derive(Debug, Clone)]
pub struct DirectoryMarketplace {
    root: PathBuf,
    online: bool,
    authenticated: bool,
}

impl DirectoryMarketplace {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            online: true,
            authenticated: false,
        }
    }

    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn with_authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    fn document_path(&self, category: &str, params: &RequestParams) -> PathBuf {
        match (category, params.get("id_module")) {
            (MODULE_CATEGORY, Some(id)) => self
                .root
                .join(MODULE_CATEGORY)
                .join(format!("{}.{}", id, params.format.as_str())),
            _ => self
                .root
                .join(format!("{}.{}", category, params.format.as_str())),
        }
    }
}

impl RemoteMarketplace for DirectoryMarketplace {
    fn is_up(&self) -> bool {
        self.online && self.root.is_dir()
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn request(
        &self,
        category: &str,
        params: &RequestParams,
    ) -> Result<Vec<RawRecord>, TransportError> {
        if !self.is_up() {
            return Err(TransportError::Unreachable {
                category: category.to_string(),
                detail: format!("mirror at {} is offline", self.root.display()),
            });
        }

        let path = self.document_path(category, params);
        if !path.exists() {
            tracing::debug!("No mirrored document for '{}' at {}", category, path.display());
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|source| TransportError::Io { path, source })?;
        parse_category(category, &content)
    }
}
