//! Catalog configuration
//!
//! Loaded from `config.yaml` in the platform config directory unless a path
//! is given. Relative paths inside the file resolve against the directory
//! holding it. A missing file yields the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::catalog::{
    CatalogAssembler, DirectoryMarketplace, ExternalCache, FileCache, InstallationLock,
    MemoryCache, RouteTable, TracingObserver, DEFAULT_CACHE_TTL, STATE_FILE,
};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct CatalogConfig {
    /// Locale tag of the back office, e.g. `fr-FR`
    pub locale: String,

    /// Employee id used when listing local modules
    pub actor_id: i64,

    pub marketplace: MarketplaceConfig,

    pub cache: CacheConfig,

    /// Installation state file
    pub state_file: PathBuf,

    /// Route name → URL template
    pub routes: RouteTable,

    /// Directory relative paths resolve against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Where marketplace data comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct MarketplaceConfig {
    /// Mirror directory holding one document per category
    pub root: PathBuf,

    /// Set to false to simulate an unreachable marketplace
    pub online: bool,

    /// Whether the shop is signed in (enables the `customer` category)
    pub authenticated: bool,
}

/// Snapshot cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct CacheConfig {
    pub enabled: bool,

    pub backend: CacheBackend,

    /// Cache directory for the file backend; platform cache dir if unset
    pub dir: Option<PathBuf>,

    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    File,
    Memory,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            actor_id: 0,
            marketplace: MarketplaceConfig::default(),
            cache: CacheConfig::default(),
            state_file: PathBuf::from(STATE_FILE),
            routes: RouteTable::default(),
            base_dir: None,
        }
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".modcat/marketplace"),
            online: true,
            authenticated: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::File,
            dir: None,
            ttl_seconds: DEFAULT_CACHE_TTL.as_secs(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl CatalogConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_config_path()?)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            serde_yaml_ng::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?
        } else {
            debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = directories::ProjectDirs::from("io", "modcat", "modcat")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("modcat")))
            .context("Could not determine config directory")?;
        Ok(config_dir.join("config.yaml"))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn marketplace_root(&self) -> PathBuf {
        self.resolve(&self.marketplace.root)
    }

    pub fn state_path(&self) -> PathBuf {
        self.resolve(&self.state_file)
    }

    /// Build the configured cache, if caching is enabled
    pub fn build_cache(&self) -> Result<Option<Box<dyn ExternalCache>>> {
        if !self.cache.enabled {
            return Ok(None);
        }
        let cache: Box<dyn ExternalCache> = match self.cache.backend {
            CacheBackend::Memory => Box::new(MemoryCache::new()),
            CacheBackend::File => match &self.cache.dir {
                Some(dir) => Box::new(FileCache::new(self.resolve(dir))),
                None => Box::new(FileCache::default_location()?),
            },
        };
        Ok(Some(cache))
    }

    /// Wire an assembler from the configured adapters
    pub fn build_assembler(&self) -> Result<CatalogAssembler> {
        let marketplace = DirectoryMarketplace::new(self.marketplace_root())
            .with_online(self.marketplace.online)
            .with_authenticated(self.marketplace.authenticated);
        let state = InstallationLock::load_from_path(&self.state_path())?;

        let mut assembler = CatalogAssembler::new(
            &self.locale,
            Box::new(marketplace),
            Box::new(state),
            Box::new(TracingObserver),
        )
        .with_actor(self.actor_id)
        .with_cache_ttl(self.cache.ttl());

        if let Some(cache) = self.build_cache()? {
            assembler = assembler.with_cache(cache);
        }
        assembler.set_router(Box::new(self.routes.clone()));

        Ok(assembler)
    }
}
