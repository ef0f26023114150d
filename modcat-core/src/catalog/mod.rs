//! Module catalog - marketplace acquisition and caching
//!
//! This module assembles the catalog of installable modules offered by the
//! marketplace, caches it per locale, and decides which management actions
//! each module supports.
//!
//! # Architecture
//!
//! ```text
//! RemoteMarketplace            LocalInstallationState
//!   must-have ─┐                 installed.yaml
//!   service   ─┤                      │
//!   native    ─┼──► CatalogAssembler ◄┘
//!   native_all─┤         │
//!   customer  ─┘         ├──► ExternalCache  (<locale>_addons_modules, 24h)
//!                        │
//!                        ├──► apply_filters   (search, name)
//!                        │
//!                        └──► resolve_actions ──► ActionUrlResolver
//! ```

mod actions;
mod assembler;
mod cache;
mod filter;
mod installed;
mod marketplace;
mod observer;
mod record;
mod router;
mod snapshot;

pub use actions::{
    action_url, attach_action_urls, resolve_actions, ActionFlags, ActionResolution,
    ModuleAction, PrimaryAction, CONFIGURE_ACTION_ROUTE, MANAGE_ACTION_ROUTE,
};
pub use assembler::{language_iso, overlay_installation_state, CatalogAssembler, PUBLIC_ORIGINS};
pub use cache::{
    cache_key, CachedSnapshot, ExternalCache, FileCache, MemoryCache, CACHE_KEY_SUFFIX,
    DEFAULT_CACHE_TTL,
};
pub use filter::{apply_filters, matches_search, CatalogFilter};
pub use installed::{
    CategoryNode, InstallationLock, LocalInstallationState, LocalModule, STATE_FILE,
};
pub use marketplace::{
    parse_category, DirectoryMarketplace, RemoteMarketplace, RequestParams, ResponseFormat,
    MODULE_CATEGORY,
};
pub use observer::{Observability, TracingObserver};
pub use record::{CategoryRef, ModuleRecord, Origin, OriginFilter, RawRecord, DEFAULT_PRODUCT_TYPE};
pub use router::{ActionUrlResolver, RouteTable};
pub use snapshot::CatalogSnapshot;
