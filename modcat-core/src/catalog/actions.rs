//! Module action resolution
//!
//! Decides which management actions are valid for a module given its
//! installation state, and which one the presentation layer should offer
//! first.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::record::{ModuleRecord, Origin};
use super::router::ActionUrlResolver;
use crate::error::ConfigurationError;

/// Route used for every action except `configure`
pub const MANAGE_ACTION_ROUTE: &str = "admin_module_manage_action";

/// Route used for the `configure` action
pub const CONFIGURE_ACTION_ROUTE: &str = "admin_module_configure_action";

/// A management action that can be linked for a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleAction {
    Install,
    Uninstall,
    Enable,
    Disable,
    EnableMobile,
    DisableMobile,
    Reset,
    Upgrade,
    Configure,
}

impl ModuleAction {
    /// Every action, in presentation order
    pub const ALL: [ModuleAction; 9] = [
        ModuleAction::Install,
        ModuleAction::Uninstall,
        ModuleAction::Enable,
        ModuleAction::Disable,
        ModuleAction::EnableMobile,
        ModuleAction::DisableMobile,
        ModuleAction::Reset,
        ModuleAction::Upgrade,
        ModuleAction::Configure,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleAction::Install => "install",
            ModuleAction::Uninstall => "uninstall",
            ModuleAction::Enable => "enable",
            ModuleAction::Disable => "disable",
            ModuleAction::EnableMobile => "enable_mobile",
            ModuleAction::DisableMobile => "disable_mobile",
            ModuleAction::Reset => "reset",
            ModuleAction::Upgrade => "upgrade",
            ModuleAction::Configure => "configure",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == name)
    }
}

impl fmt::Display for ModuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The action offered first for a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    Install,
    Uninstall,
    Enable,
    Disable,
    EnableMobile,
    DisableMobile,
    Reset,
    Upgrade,
    Configure,
    /// Paid module not yet purchased
    Buy,
}

impl PrimaryAction {
    pub fn as_str(self) -> &'static str {
        match self.action() {
            Some(action) => action.as_str(),
            None => "buy",
        }
    }

    /// The linkable action behind this primary action, if any
    pub fn action(self) -> Option<ModuleAction> {
        Some(match self {
            PrimaryAction::Install => ModuleAction::Install,
            PrimaryAction::Uninstall => ModuleAction::Uninstall,
            PrimaryAction::Enable => ModuleAction::Enable,
            PrimaryAction::Disable => ModuleAction::Disable,
            PrimaryAction::EnableMobile => ModuleAction::EnableMobile,
            PrimaryAction::DisableMobile => ModuleAction::DisableMobile,
            PrimaryAction::Reset => ModuleAction::Reset,
            PrimaryAction::Upgrade => ModuleAction::Upgrade,
            PrimaryAction::Configure => ModuleAction::Configure,
            PrimaryAction::Buy => return None,
        })
    }
}

impl From<ModuleAction> for PrimaryAction {
    fn from(action: ModuleAction) -> Self {
        match action {
            ModuleAction::Install => PrimaryAction::Install,
            ModuleAction::Uninstall => PrimaryAction::Uninstall,
            ModuleAction::Enable => PrimaryAction::Enable,
            ModuleAction::Disable => PrimaryAction::Disable,
            ModuleAction::EnableMobile => PrimaryAction::EnableMobile,
            ModuleAction::DisableMobile => PrimaryAction::DisableMobile,
            ModuleAction::Reset => PrimaryAction::Reset,
            ModuleAction::Upgrade => PrimaryAction::Upgrade,
            ModuleAction::Configure => PrimaryAction::Configure,
        }
    }
}

impl fmt::Display for PrimaryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The module state the resolver looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionFlags {
    pub installed: bool,
    pub active: bool,
    pub is_configurable: bool,
    pub active_on_mobile: bool,
    pub can_be_upgraded: bool,
    pub is_present_on_disk: bool,
    pub origin: Option<Origin>,
}

impl From<&ModuleRecord> for ActionFlags {
    fn from(module: &ModuleRecord) -> Self {
        Self {
            installed: module.installed,
            active: module.active,
            is_configurable: module.is_configurable,
            active_on_mobile: module.active_on_mobile,
            can_be_upgraded: module.can_be_upgraded(),
            is_present_on_disk: module.is_present_on_disk,
            origin: module.origin,
        }
    }
}

/// Valid actions and the primary action for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResolution {
    pub actions: BTreeSet<ModuleAction>,
    pub primary: PrimaryAction,
}

impl ActionResolution {
    /// Let a caller-requested action take over as primary.
    ///
    /// Only honored when the action is part of the computed set.
    pub fn with_specific_action(mut self, specific_action: Option<&str>) -> Self {
        if let Some(action) = specific_action.and_then(ModuleAction::parse) {
            if self.actions.contains(&action) {
                self.primary = action.into();
            }
        }
        self
    }
}

/// Compute the valid actions and primary action for a module state
pub fn resolve_actions(flags: &ActionFlags) -> ActionResolution {
    let mut actions: BTreeSet<ModuleAction> = ModuleAction::ALL.into_iter().collect();

    if flags.installed {
        let mut primary = if !flags.active {
            actions.remove(&ModuleAction::Install);
            actions.remove(&ModuleAction::Disable);
            PrimaryAction::Enable
        } else if flags.is_configurable {
            actions.remove(&ModuleAction::Enable);
            actions.remove(&ModuleAction::Install);
            PrimaryAction::Configure
        } else {
            actions.remove(&ModuleAction::Install);
            actions.remove(&ModuleAction::Enable);
            actions.remove(&ModuleAction::Configure);
            PrimaryAction::Disable
        };

        if !flags.is_configurable {
            actions.remove(&ModuleAction::Configure);
        }

        if flags.can_be_upgraded {
            primary = PrimaryAction::Upgrade;
        } else {
            actions.remove(&ModuleAction::Upgrade);
        }

        if flags.active_on_mobile {
            actions.remove(&ModuleAction::EnableMobile);
        } else {
            actions.remove(&ModuleAction::DisableMobile);
        }

        return ActionResolution { actions, primary };
    }

    let installable = match flags.origin {
        None => true,
        Some(origin) => flags.is_present_on_disk || origin.is_freely_installable(),
    };

    if installable {
        ActionResolution {
            actions: BTreeSet::from([ModuleAction::Install]),
            primary: PrimaryAction::Install,
        }
    } else {
        ActionResolution {
            actions: BTreeSet::new(),
            primary: PrimaryAction::Buy,
        }
    }
}

/// Generate the URL for one action through the router
pub fn action_url(
    router: &dyn ActionUrlResolver,
    module_name: &str,
    action: ModuleAction,
) -> Result<String, ConfigurationError> {
    let mut params = BTreeMap::new();
    params.insert("module_name".to_string(), module_name.to_string());

    if action == ModuleAction::Configure {
        router.generate(CONFIGURE_ACTION_ROUTE, &params)
    } else {
        params.insert("action".to_string(), action.as_str().to_string());
        router.generate(MANAGE_ACTION_ROUTE, &params)
    }
}

/// Resolve actions for a module and attach URLs and the primary action.
///
/// The URL map is left unset when no action is available.
pub fn attach_action_urls(
    module: &mut ModuleRecord,
    router: &dyn ActionUrlResolver,
    specific_action: Option<&str>,
) -> Result<(), ConfigurationError> {
    let resolution = resolve_actions(&ActionFlags::from(&*module))
        .with_specific_action(specific_action);

    if resolution.actions.is_empty() {
        module.urls = None;
    } else {
        let mut urls = BTreeMap::new();
        for action in &resolution.actions {
            urls.insert(*action, action_url(router, &module.name, *action)?);
        }
        module.urls = Some(urls);
    }
    module.primary_action = Some(resolution.primary);

    Ok(())
}
