//! Shared fakes for catalog integration tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::Duration;

use modcat_core::catalog::{
    CatalogAssembler, CatalogSnapshot, CategoryRef, ExternalCache, LocalInstallationState,
    MemoryCache, ModuleRecord, Observability, RawRecord, RemoteMarketplace, RequestParams,
};
use modcat_core::error::{Result as CatalogResult, TransportError};

#[derive(Default)]
struct MarketplaceState {
    up: bool,
    authenticated: bool,
    categories: BTreeMap<String, Vec<RawRecord>>,
    failing: BTreeSet<String>,
    requests: Vec<String>,
}

/// Marketplace answering from scripted category contents
#[derive(Clone)]
pub struct ScriptedMarketplace {
    state: Rc<RefCell<MarketplaceState>>,
}

impl ScriptedMarketplace {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MarketplaceState {
                up: true,
                ..MarketplaceState::default()
            })),
        }
    }

    pub fn with_category(self, category: &str, records: Vec<RawRecord>) -> Self {
        self.state
            .borrow_mut()
            .categories
            .insert(category.to_string(), records);
        self
    }

    pub fn authenticated(self) -> Self {
        self.state.borrow_mut().authenticated = true;
        self
    }

    pub fn set_up(&self, up: bool) {
        self.state.borrow_mut().up = up;
    }

    /// Make requests for `category` fail with a transport error
    pub fn fail(&self, category: &str) {
        self.state.borrow_mut().failing.insert(category.to_string());
    }

    pub fn recover(&self) {
        self.state.borrow_mut().failing.clear();
    }

    /// Categories requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.state.borrow().requests.clone()
    }
}

impl RemoteMarketplace for ScriptedMarketplace {
    fn is_up(&self) -> bool {
        self.state.borrow().up
    }

    fn is_authenticated(&self) -> bool {
        self.state.borrow().authenticated
    }

    fn request(
        &self,
        category: &str,
        params: &RequestParams,
    ) -> Result<Vec<RawRecord>, TransportError> {
        let mut state = self.state.borrow_mut();
        let label = match params.get("id_module") {
            Some(id) => format!("{category}#{id}"),
            None => category.to_string(),
        };
        state.requests.push(label);

        if state.failing.contains(category) {
            return Err(TransportError::Unreachable {
                category: category.to_string(),
                detail: "connection reset".to_string(),
            });
        }
        Ok(state.categories.get(category).cloned().unwrap_or_default())
    }
}

/// Observer keeping every report
#[derive(Clone, Default)]
pub struct RecordingObserver {
    reports: Rc<RefCell<Vec<(String, BTreeMap<String, String>)>>>,
}

impl RecordingObserver {
    pub fn reports(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.reports.borrow().clone()
    }
}

impl Observability for RecordingObserver {
    fn error(&self, message: &str, context: &BTreeMap<String, String>) {
        self.reports
            .borrow_mut()
            .push((message.to_string(), context.clone()));
    }
}

/// Fixed local state
#[derive(Clone, Default)]
pub struct StaticState {
    pub modules: Vec<ModuleRecord>,
    pub parents: BTreeMap<String, String>,
}

impl StaticState {
    pub fn with_parent(mut self, category: &str, parent: &str) -> Self {
        self.parents.insert(category.to_string(), parent.to_string());
        self
    }

    pub fn with_module(mut self, module: ModuleRecord) -> Self {
        self.modules.push(module);
        self
    }
}

impl LocalInstallationState for StaticState {
    fn list_installed_modules(
        &self,
        include_disabled: bool,
        _authenticated: bool,
        _actor_id: i64,
    ) -> anyhow::Result<Vec<ModuleRecord>> {
        Ok(self
            .modules
            .iter()
            .filter(|m| include_disabled || m.active)
            .cloned()
            .collect())
    }

    fn parent_category(&self, category_name: &str) -> Option<CategoryRef> {
        self.parents.get(category_name).map(CategoryRef::new)
    }
}

/// Memory cache shared between the test and one or more assemblers
#[derive(Clone, Default)]
pub struct SharedCache {
    inner: Rc<MemoryCache>,
}

impl ExternalCache for SharedCache {
    fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    fn fetch(&self, key: &str) -> Option<CatalogSnapshot> {
        self.inner.fetch(key)
    }

    fn fetch_stale(&self, key: &str) -> Option<CatalogSnapshot> {
        self.inner.fetch_stale(key)
    }

    fn save(&self, key: &str, snapshot: &CatalogSnapshot, ttl: Duration) -> CatalogResult<()> {
        self.inner.save(key, snapshot, ttl)
    }

    fn delete(&self, key: &str) -> CatalogResult<()> {
        self.inner.delete(key)
    }
}

pub fn raw(name: &str, category_name: &str) -> RawRecord {
    RawRecord {
        name: name.to_string(),
        display_name: name.replace('_', " "),
        description: format!("The {name} module"),
        category_name: category_name.to_string(),
        ..RawRecord::default()
    }
}

/// Marketplace with one module in each public category
pub fn standard_marketplace() -> ScriptedMarketplace {
    ScriptedMarketplace::new()
        .with_category("must-have", vec![raw("blockreassurance", "front_office")])
        .with_category("service", vec![raw("premium_support", "services")])
        .with_category("native", vec![raw("ps_banner", "front_office")])
        .with_category(
            "native_all",
            vec![raw("ps_banner", "front_office"), raw("ps_wirepayment", "payments")],
        )
        .with_category("customer", vec![raw("bought_theme", "themes")])
}

pub fn assembler(
    marketplace: &ScriptedMarketplace,
    observer: &RecordingObserver,
    cache: Option<&SharedCache>,
) -> CatalogAssembler {
    let state = StaticState::default().with_parent("payments", "checkout");
    let assembler = CatalogAssembler::new(
        "en-US",
        Box::new(marketplace.clone()),
        Box::new(state),
        Box::new(observer.clone()),
    );
    match cache {
        Some(cache) => assembler.with_cache(Box::new(cache.clone())),
        None => assembler,
    }
}
