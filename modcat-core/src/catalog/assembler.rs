//! Catalog assembly
//!
//! Builds the catalog snapshot from the marketplace categories, keeps it in
//! memory and in the external cache, and falls back on the last cached copy
//! when the marketplace fails mid-load.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Duration;

use super::actions::attach_action_urls;
use super::cache::{cache_key, ExternalCache, DEFAULT_CACHE_TTL};
use super::filter::{apply_filters, CatalogFilter};
use super::installed::LocalInstallationState;
use super::marketplace::{RemoteMarketplace, RequestParams, MODULE_CATEGORY};
use super::observer::Observability;
use super::router::ActionUrlResolver;
use super::{CatalogSnapshot, ModuleRecord, Origin, RawRecord};
use crate::error::{ConfigurationError, TransportError};

/// Categories fetched for every shop, in request order
pub const PUBLIC_ORIGINS: [Origin; 4] = [
    Origin::MustHave,
    Origin::Service,
    Origin::Native,
    Origin::NativeAll,
];

/// Language part of a locale tag: `fr-FR` → `fr`
pub fn language_iso(locale: &str) -> String {
    locale
        .split(|c: char| c == '-' || c == '_')
        .next()
        .unwrap_or(locale)
        .trim()
        .to_ascii_lowercase()
}

/// Copy local installation flags onto catalog records of the same name
pub fn overlay_installation_state(snapshot: &mut CatalogSnapshot, local: &[ModuleRecord]) {
    for local_module in local {
        if let Some(module) = snapshot.get_mut(&local_module.name) {
            module.installed = local_module.installed;
            module.installed_version = local_module.installed_version.clone();
            module.active = local_module.active;
            module.active_on_mobile = local_module.active_on_mobile;
            module.is_configurable = local_module.is_configurable;
            module.is_present_on_disk = local_module.is_present_on_disk;
        }
    }
}

/// Assembles and serves the module catalog for one locale
pub struct CatalogAssembler {
    language_iso: String,
    actor_id: i64,
    marketplace: Box<dyn RemoteMarketplace>,
    state: Box<dyn LocalInstallationState>,
    observer: Box<dyn Observability>,
    cache: Option<Box<dyn ExternalCache>>,
    cache_ttl: Duration,
    router: Option<Box<dyn ActionUrlResolver>>,
    catalog: CatalogSnapshot,
    failed: bool,
}

impl CatalogAssembler {
    /// Create an assembler for a locale tag such as `en-US`
    pub fn new(
        locale: &str,
        marketplace: Box<dyn RemoteMarketplace>,
        state: Box<dyn LocalInstallationState>,
        observer: Box<dyn Observability>,
    ) -> Self {
        Self {
            language_iso: language_iso(locale),
            actor_id: 0,
            marketplace,
            state,
            observer,
            cache: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            router: None,
            catalog: CatalogSnapshot::new(),
            failed: false,
        }
    }

    /// Attach an external cache
    pub fn with_cache(mut self, cache: Box<dyn ExternalCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Employee on whose behalf local state is listed
    pub fn with_actor(mut self, actor_id: i64) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn set_router(&mut self, router: Box<dyn ActionUrlResolver>) {
        self.router = Some(router);
    }

    pub fn language_iso(&self) -> &str {
        &self.language_iso
    }

    /// Key of this locale's catalog in the external cache
    pub fn cache_key(&self) -> String {
        cache_key(&self.language_iso)
    }

    /// Whether the last load failed with nothing to fall back on.
    ///
    /// Distinguishes an empty catalog from one that could not be loaded.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Drop the in-memory and cached catalog for this locale
    pub fn clear_catalog_cache(&mut self) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete(&self.cache_key()) {
                tracing::warn!("Failed to clear catalog cache: {}", e);
            }
        }
        self.catalog = CatalogSnapshot::new();
        self.failed = false;
    }

    /// Load the catalog, from cache if possible, else from the marketplace.
    ///
    /// A loaded non-empty catalog is reused; after a failed load no further
    /// attempt is made until [`clear_catalog_cache`](Self::clear_catalog_cache).
    /// Transport failures are never returned: the catalog degrades to the
    /// last cached copy or to empty.
    pub fn load_catalog(&mut self) -> &CatalogSnapshot {
        if !self.catalog.is_empty() || self.failed {
            return &self.catalog;
        }

        let key = self.cache_key();
        if let Some(cached) = self
            .cache
            .as_ref()
            .filter(|cache| cache.contains(&key))
            .and_then(|cache| cache.fetch(&key))
        {
            tracing::debug!("Loaded {} catalog modules from cache '{}'", cached.len(), key);
            self.catalog = cached;
        }

        if self.catalog.is_empty() {
            match self.fetch_catalog() {
                Ok(snapshot) => {
                    self.catalog = snapshot;
                    self.save_to_cache(&key);
                }
                Err(e) => {
                    if !self.fallback_on_cache(&key) {
                        self.catalog = CatalogSnapshot::new();
                        self.failed = true;

                        let mut context = BTreeMap::new();
                        context.insert("exception".to_string(), e.to_string());
                        context.insert("locale".to_string(), self.language_iso.clone());
                        self.observer.error(
                            "Data from the marketplace is invalid, and cannot fall back on cache.",
                            &context,
                        );
                    }
                }
            }
        }

        &self.catalog
    }

    /// Catalog restricted by filters; loads lazily
    pub fn catalog_modules(&mut self, filters: &[CatalogFilter]) -> Cow<'_, CatalogSnapshot> {
        self.load_catalog();
        apply_filters(&self.catalog, filters)
    }

    pub fn catalog_module_names(&mut self, filters: &[CatalogFilter]) -> Vec<String> {
        self.catalog_modules(filters).names()
    }

    /// Filtered catalog with local installation flags applied
    pub fn catalog_with_installation_state(
        &mut self,
        filters: &[CatalogFilter],
    ) -> anyhow::Result<CatalogSnapshot> {
        let local = self.all_modules()?;
        let mut snapshot = self.catalog_modules(filters).into_owned();
        overlay_installation_state(&mut snapshot, &local);
        Ok(snapshot)
    }

    /// Every module known locally, disabled ones included
    pub fn all_modules(&self) -> anyhow::Result<Vec<ModuleRecord>> {
        self.state.list_installed_modules(
            true,
            self.marketplace.is_authenticated(),
            self.actor_id,
        )
    }

    /// Raw marketplace attributes of a single module
    pub fn module_attributes_by_id(&self, module_id: i64) -> Result<Vec<RawRecord>, TransportError> {
        let params = RequestParams::json().with("id_module", module_id.to_string());
        self.marketplace.request(MODULE_CATEGORY, &params)
    }

    /// Attach action URLs, primary action and parent category to modules.
    ///
    /// Fails when no router has been set.
    pub fn generate_action_urls(
        &self,
        mut modules: Vec<ModuleRecord>,
        specific_action: Option<&str>,
    ) -> Result<Vec<ModuleRecord>, ConfigurationError> {
        let router = self
            .router
            .as_deref()
            .ok_or(ConfigurationError::RouterNotSet)?;

        for module in &mut modules {
            attach_action_urls(module, router, specific_action)?;
            module.category_parent = self.state.parent_category(&module.category_name);
        }

        Ok(modules)
    }

    fn requested_origins(&self) -> Vec<Origin> {
        let mut origins = PUBLIC_ORIGINS.to_vec();
        if self.marketplace.is_authenticated() {
            origins.push(Origin::Customer);
        }
        origins
    }

    fn fetch_catalog(&self) -> Result<CatalogSnapshot, TransportError> {
        let params = RequestParams::json();
        let mut snapshot = CatalogSnapshot::new();

        for origin in self.requested_origins() {
            if !self.marketplace.is_up() {
                tracing::debug!("Marketplace is down, skipping '{}'", origin);
                continue;
            }

            let records = self.marketplace.request(origin.as_str(), &params)?;
            tracing::debug!("Fetched {} modules from '{}'", records.len(), origin);

            for raw in records {
                let parent = self.state.parent_category(&raw.category_name);
                snapshot.insert(ModuleRecord::from_raw(raw, origin, parent));
            }
        }

        Ok(snapshot)
    }

    fn save_to_cache(&self, key: &str) {
        let Some(cache) = &self.cache else {
            return;
        };
        if self.catalog.is_empty() {
            return;
        }
        // Caching is best effort
        if let Err(e) = cache.save(key, &self.catalog, self.cache_ttl) {
            tracing::warn!("Failed to save catalog to cache: {}", e);
        }
    }

    fn fallback_on_cache(&mut self, key: &str) -> bool {
        let Some(cached) = self.cache.as_ref().and_then(|cache| cache.fetch_stale(key)) else {
            return false;
        };
        if cached.is_empty() {
            return false;
        }

        tracing::warn!(
            "Marketplace load failed, using {} cached modules for '{}'",
            cached.len(),
            key
        );
        self.catalog = cached;
        true
    }
}
