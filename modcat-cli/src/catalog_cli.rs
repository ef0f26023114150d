//! Catalog CLI commands
//!
//! Lists marketplace modules with their local installation state and shows
//! the management actions available for each one.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use modcat_core::catalog::{CatalogAssembler, CatalogFilter, ModuleRecord};
use modcat_core::config::CatalogConfig;

/// Catalog subcommand for browsing modules
#[derive(Parser, Debug)]
pub struct CatalogCommand {
    #[clap(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CatalogSubcommand {
    /// List catalog modules
    List {
        /// Keywords matched against name, display name and description
        #[clap(long)]
        search: Option<String>,

        /// Exact module name
        #[clap(long)]
        name: Option<String>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Print catalog module names, one per line
    Names {
        #[clap(long)]
        search: Option<String>,
    },

    /// Show detailed information about a module
    Show {
        /// Module name
        name: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show the actions available for a module
    Actions {
        /// Module name
        name: String,

        /// Preferred primary action (e.g. reset, upgrade)
        #[clap(long)]
        action: Option<String>,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// List modules present locally
    Installed,

    /// Drop the cached catalog for the configured locale
    ClearCache,
}

impl CatalogCommand {
    pub fn execute(self, config: &CatalogConfig) -> Result<()> {
        let mut assembler = config.build_assembler()?;

        match self.command {
            CatalogSubcommand::List { search, name, json } => {
                execute_list(&mut assembler, &filters(search, name), json)
            }
            CatalogSubcommand::Names { search } => {
                execute_names(&mut assembler, &filters(search, None))
            }
            CatalogSubcommand::Show { name, json } => execute_show(&mut assembler, &name, json),
            CatalogSubcommand::Actions { name, action, json } => {
                execute_actions(&mut assembler, &name, action.as_deref(), json)
            }
            CatalogSubcommand::Installed => execute_installed(&assembler),
            CatalogSubcommand::ClearCache => {
                assembler.clear_catalog_cache();
                println!("Cleared catalog cache '{}'", assembler.cache_key());
                Ok(())
            }
        }
    }
}

fn filters(search: Option<String>, name: Option<String>) -> Vec<CatalogFilter> {
    let mut filters = Vec::new();
    if let Some(query) = search {
        filters.push(CatalogFilter::Search(query));
    }
    if let Some(name) = name {
        filters.push(CatalogFilter::Name(name));
    }
    filters
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn warn_if_unavailable(assembler: &CatalogAssembler) {
    if assembler.has_failed() {
        eprintln!("Warning: the marketplace catalog could not be loaded");
    }
}

/// Table row for catalog listings
#[derive(Tabled)]
struct ModuleRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Origin")]
    origin: String,
    #[tabled(rename = "Type")]
    product_type: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&ModuleRecord> for ModuleRow {
    fn from(module: &ModuleRecord) -> Self {
        Self {
            name: module.name.clone(),
            version: module.version.clone().unwrap_or_else(|| "-".to_string()),
            origin: module
                .origin
                .map(|o| o.to_string())
                .unwrap_or_else(|| "disk".to_string()),
            product_type: module.product_type.clone(),
            installed: yes_no(module.installed).to_string(),
            description: truncate(module.short_description(), 50),
        }
    }
}

fn print_modules(modules: &[&ModuleRecord]) {
    let rows: Vec<ModuleRow> = modules.iter().map(|m| ModuleRow::from(*m)).collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();
    println!("{table}");
}

fn execute_list(
    assembler: &mut CatalogAssembler,
    filters: &[CatalogFilter],
    json_output: bool,
) -> Result<()> {
    let snapshot = assembler.catalog_with_installation_state(filters)?;
    warn_if_unavailable(assembler);

    if json_output {
        let modules: Vec<&ModuleRecord> = snapshot.modules().collect();
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("No modules found.");
        return Ok(());
    }

    println!("Found {} module(s):\n", snapshot.len());
    let modules: Vec<&ModuleRecord> = snapshot.modules().collect();
    print_modules(&modules);
    Ok(())
}

fn execute_names(assembler: &mut CatalogAssembler, filters: &[CatalogFilter]) -> Result<()> {
    for name in assembler.catalog_module_names(filters) {
        println!("{name}");
    }
    warn_if_unavailable(assembler);
    Ok(())
}

/// Catalog entry by name, falling back on modules only known locally
fn find_module(assembler: &mut CatalogAssembler, name: &str) -> Result<ModuleRecord> {
    let filters = [CatalogFilter::Name(name.to_string())];
    let snapshot = assembler.catalog_with_installation_state(&filters)?;
    if let Some(module) = snapshot.get(name) {
        return Ok(module.clone());
    }

    assembler
        .all_modules()?
        .into_iter()
        .find(|m| m.name == name)
        .with_context(|| format!("Module '{name}' not found in catalog or on disk"))
}

fn execute_show(assembler: &mut CatalogAssembler, name: &str, json_output: bool) -> Result<()> {
    let module = find_module(assembler, name)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&module)?);
        return Ok(());
    }

    println!("Module:    {}", module.name);
    if module.display_name != module.name {
        println!("Title:     {}", module.display_name);
    }
    if let Some(version) = &module.version {
        println!("Version:   {version}");
    }
    if let Some(origin) = module.origin {
        println!("Origin:    {origin}");
    }
    if !module.product_type.is_empty() {
        println!("Type:      {}", module.product_type);
    }
    if !module.category_name.is_empty() {
        match &module.category_parent {
            Some(parent) => println!("Category:  {} ({})", module.category_name, parent.name),
            None => println!("Category:  {}", module.category_name),
        }
    }

    println!();
    println!("Installed: {}", yes_no(module.installed));
    if module.installed {
        if let Some(installed_version) = &module.installed_version {
            println!("  version: {installed_version}");
        }
        println!("  active:  {}", yes_no(module.active));
        println!("  mobile:  {}", yes_no(module.active_on_mobile));
        if module.can_be_upgraded() {
            println!("  upgrade available");
        }
    }

    if !module.description.is_empty() {
        println!();
        println!("Description:");
        for line in module.description.lines() {
            println!("  {line}");
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct ActionsOutput<'a> {
    name: &'a str,
    primary_action: String,
    urls: BTreeMap<String, String>,
}

fn execute_actions(
    assembler: &mut CatalogAssembler,
    name: &str,
    specific_action: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let module = find_module(assembler, name)?;
    let module = assembler
        .generate_action_urls(vec![module], specific_action)?
        .into_iter()
        .next()
        .context("No module returned from action resolution")?;

    let primary_action = module
        .primary_action
        .map(|a| a.to_string())
        .unwrap_or_default();
    let urls: BTreeMap<String, String> = module
        .urls
        .iter()
        .flatten()
        .map(|(action, url)| (action.to_string(), url.clone()))
        .collect();

    if json_output {
        let output = ActionsOutput {
            name: &module.name,
            primary_action,
            urls,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Primary action: {primary_action}");
    if urls.is_empty() {
        println!("No actions available.");
    } else {
        println!();
        for (action, url) in &urls {
            println!("  {action:<15} {url}");
        }
    }

    Ok(())
}

fn execute_installed(assembler: &CatalogAssembler) -> Result<()> {
    let modules = assembler.all_modules()?;

    if modules.is_empty() {
        println!("No modules installed.");
        return Ok(());
    }

    let refs: Vec<&ModuleRecord> = modules.iter().collect();
    print_modules(&refs);
    Ok(())
}
