//! Catalog filtering
//!
//! Filters arrive from the presentation layer as ordered `(name, value)`
//! pairs. Each known filter narrows the candidate set, so a module must
//! satisfy every filter supplied. Unknown filter names are kept as an
//! explicit no-op variant rather than rejected.

use std::borrow::Cow;
use std::collections::BTreeSet;

use super::{CatalogSnapshot, ModuleRecord};

/// A single catalog filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogFilter {
    /// Whitespace-separated keywords; any keyword may match
    Search(String),
    /// Exact module name
    Name(String),
    /// A filter this catalog does not know; ignored
    Unknown { name: String, value: String },
}

impl CatalogFilter {
    /// Build a filter from its wire name and value
    pub fn parse(name: &str, value: &str) -> Self {
        match name {
            "search" => CatalogFilter::Search(value.to_string()),
            "name" => CatalogFilter::Name(value.to_string()),
            _ => CatalogFilter::Unknown {
                name: name.to_string(),
                value: value.to_string(),
            },
        }
    }

    /// Build filters from ordered `(name, value)` pairs
    pub fn from_pairs<'a, I>(pairs: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .map(|(name, value)| Self::parse(name, value))
            .collect()
    }

    fn is_known(&self) -> bool {
        !matches!(self, CatalogFilter::Unknown { .. })
    }
}

/// Whether a module matches any non-empty keyword of a search query.
///
/// Matching is a case-sensitive substring test against display name, name
/// and description.
pub fn matches_search(module: &ModuleRecord, query: &str) -> bool {
    query.split_whitespace().any(|keyword| {
        module.display_name.contains(keyword)
            || module.name.contains(keyword)
            || module.description.contains(keyword)
    })
}

/// Apply filters to a snapshot.
///
/// Without any known filter the snapshot is returned as-is, borrowed.
pub fn apply_filters<'a>(
    snapshot: &'a CatalogSnapshot,
    filters: &[CatalogFilter],
) -> Cow<'a, CatalogSnapshot> {
    if !filters.iter().any(CatalogFilter::is_known) {
        return Cow::Borrowed(snapshot);
    }

    let mut result = snapshot.clone();
    for filter in filters {
        match filter {
            CatalogFilter::Search(query) => {
                let keep: BTreeSet<String> = result
                    .modules()
                    .filter(|module| matches_search(module, query))
                    .map(|module| module.name.clone())
                    .collect();
                result.retain(|name| keep.contains(name));
            }
            CatalogFilter::Name(wanted) => result.retain(|name| name == wanted),
            CatalogFilter::Unknown { name, .. } => {
                tracing::trace!("Ignoring unknown catalog filter '{}'", name);
            }
        }
    }

    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn module(name: &str, display_name: &str, description: &str) -> ModuleRecord {
        ModuleRecord {
            display_name: display_name.to_string(),
            description: description.to_string(),
            ..ModuleRecord::named(name)
        }
    }

    fn sample() -> CatalogSnapshot {
        [
            module("blockreassurance", "Customer reassurance", "Adds trust badges"),
            module("ps_facebook", "Facebook", "Social login and pixel"),
            module("stripe_official", "Stripe", "Accept card payments"),
            module("paypal", "PayPal", "Accept PayPal payments"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_no_filters_is_identity() {
        let snapshot = sample();
        let result = apply_filters(&snapshot, &[]);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_unknown_filters_are_ignored() {
        let snapshot = sample();
        let filters = CatalogFilter::from_pairs([("category", "payments")]);
        let result = apply_filters(&snapshot, &filters);
        assert_eq!(result.len(), 4);

        let filters = CatalogFilter::from_pairs([("category", "x"), ("name", "paypal")]);
        assert_eq!(apply_filters(&snapshot, &filters).names(), vec!["paypal"]);
    }

    #[test]
    fn test_search_matches_any_keyword() {
        let snapshot = sample();
        let filters = CatalogFilter::from_pairs([("search", "Stripe trust")]);
        let result = apply_filters(&snapshot, &filters);
        assert_eq!(result.names(), vec!["blockreassurance", "stripe_official"]);
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let snapshot = sample();
        let filters = CatalogFilter::from_pairs([("search", "stripe")]);
        // matches the internal name, not the display name
        assert_eq!(apply_filters(&snapshot, &filters).names(), vec!["stripe_official"]);

        let filters = CatalogFilter::from_pairs([("search", "STRIPE")]);
        assert!(apply_filters(&snapshot, &filters).is_empty());
    }

    #[test]
    fn test_search_ignores_empty_keywords() {
        let snapshot = sample();
        let filters = CatalogFilter::from_pairs([("search", "  PayPal   ")]);
        assert_eq!(apply_filters(&snapshot, &filters).names(), vec!["paypal"]);

        let filters = CatalogFilter::from_pairs([("search", "   ")]);
        assert!(apply_filters(&snapshot, &filters).is_empty());
    }

    #[test]
    fn test_name_filter_is_exact() {
        let snapshot = sample();
        let filters = CatalogFilter::from_pairs([("name", "paypal")]);
        assert_eq!(apply_filters(&snapshot, &filters).names(), vec!["paypal"]);

        let filters = CatalogFilter::from_pairs([("name", "pay")]);
        assert!(apply_filters(&snapshot, &filters).is_empty());
    }

    #[test]
    fn test_filters_intersect() {
        let snapshot = sample();
        let both = CatalogFilter::from_pairs([("search", "payments"), ("name", "paypal")]);
        let name_only = CatalogFilter::from_pairs([("name", "paypal")]);

        let narrowed = apply_filters(&snapshot, &both);
        let by_name = apply_filters(&snapshot, &name_only);
        assert!(narrowed.names().iter().all(|n| by_name.contains(n)));
        assert_eq!(narrowed.names(), vec!["paypal"]);

        let disjoint = CatalogFilter::from_pairs([("search", "Facebook"), ("name", "paypal")]);
        assert!(apply_filters(&snapshot, &disjoint).is_empty());
    }

    #[test]
    fn test_filtered_entries_are_unchanged() {
        let snapshot = sample();
        let filters = CatalogFilter::from_pairs([("name", "ps_facebook")]);
        let result = apply_filters(&snapshot, &filters);
        assert_eq!(result.get("ps_facebook"), snapshot.get("ps_facebook"));
    }
}
