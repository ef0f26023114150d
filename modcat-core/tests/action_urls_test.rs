mod common;

use common::{assembler, standard_marketplace, RecordingObserver};
use modcat_core::catalog::{CategoryRef, ModuleAction, ModuleRecord, PrimaryAction, RouteTable};
use modcat_core::ConfigurationError;
use pretty_assertions::assert_eq;

fn installed_configurable(name: &str) -> ModuleRecord {
    ModuleRecord {
        installed: true,
        active: true,
        is_configurable: true,
        active_on_mobile: true,
        is_present_on_disk: true,
        category_name: "payments".to_string(),
        ..ModuleRecord::named(name)
    }
}

#[test]
fn test_router_required() {
    let marketplace = standard_marketplace();
    let observer = RecordingObserver::default();
    let assembler = assembler(&marketplace, &observer, None);

    let err = assembler
        .generate_action_urls(vec![ModuleRecord::named("blog")], None)
        .unwrap_err();
    assert_eq!(err, ConfigurationError::RouterNotSet);
}

#[test]
fn test_urls_for_catalog_modules() {
    let marketplace = standard_marketplace();
    let observer = RecordingObserver::default();
    let mut assembler = assembler(&marketplace, &observer, None);
    assembler.set_router(Box::new(RouteTable::default()));

    let modules: Vec<ModuleRecord> = assembler.load_catalog().modules().cloned().collect();
    let modules = assembler.generate_action_urls(modules, None).unwrap();

    let banner = modules.iter().find(|m| m.name == "ps_banner").unwrap();
    assert_eq!(banner.primary_action, Some(PrimaryAction::Install));
    let urls = banner.urls.as_ref().unwrap();
    assert_eq!(urls.len(), 1);
    assert_eq!(
        urls[&ModuleAction::Install],
        "/modules/manage/action/install/ps_banner"
    );

    // Paid services cannot be installed before purchase
    let service = modules.iter().find(|m| m.name == "premium_support").unwrap();
    assert_eq!(service.primary_action, Some(PrimaryAction::Buy));
    assert!(service.urls.is_none());
}

#[test]
fn test_urls_for_installed_module() {
    let marketplace = standard_marketplace();
    let observer = RecordingObserver::default();
    let mut assembler = assembler(&marketplace, &observer, None);
    assembler.set_router(Box::new(RouteTable::default()));

    let modules = assembler
        .generate_action_urls(vec![installed_configurable("ps_checkout")], None)
        .unwrap();
    let module = &modules[0];

    assert_eq!(module.primary_action, Some(PrimaryAction::Configure));
    assert_eq!(module.category_parent.as_ref().unwrap().name, "checkout");

    let urls = module.urls.as_ref().unwrap();
    let actions: Vec<ModuleAction> = urls.keys().copied().collect();
    assert_eq!(
        actions,
        vec![
            ModuleAction::Uninstall,
            ModuleAction::Disable,
            ModuleAction::DisableMobile,
            ModuleAction::Reset,
            ModuleAction::Configure,
        ]
    );
    assert_eq!(
        urls[&ModuleAction::Configure],
        "/modules/manage/action/configure/ps_checkout"
    );
    assert_eq!(
        urls[&ModuleAction::DisableMobile],
        "/modules/manage/action/disable_mobile/ps_checkout"
    );
}

#[test]
fn test_parent_category_is_re_resolved() {
    let marketplace = standard_marketplace();
    let observer = RecordingObserver::default();
    let mut assembler = assembler(&marketplace, &observer, None);
    assembler.set_router(Box::new(RouteTable::default()));

    let orphan = ModuleRecord {
        category_name: "retired_category".to_string(),
        category_parent: Some(CategoryRef::new("stale_parent")),
        ..ModuleRecord::named("orphan")
    };
    let modules = assembler.generate_action_urls(vec![orphan], None).unwrap();
    assert_eq!(modules[0].category_parent, None);
}

#[test]
fn test_specific_action_becomes_primary() {
    let marketplace = standard_marketplace();
    let observer = RecordingObserver::default();
    let mut assembler = assembler(&marketplace, &observer, None);
    assembler.set_router(Box::new(RouteTable::default()));

    let modules = assembler
        .generate_action_urls(
            vec![installed_configurable("a"), ModuleRecord::named("b")],
            Some("reset"),
        )
        .unwrap();

    assert_eq!(modules[0].primary_action, Some(PrimaryAction::Reset));
    // Not available for a module that is not installed
    assert_eq!(modules[1].primary_action, Some(PrimaryAction::Install));
}

#[test]
fn test_missing_route_is_reported() {
    let marketplace = standard_marketplace();
    let observer = RecordingObserver::default();
    let mut assembler = assembler(&marketplace, &observer, None);
    assembler.set_router(Box::new(RouteTable::empty()));

    let err = assembler
        .generate_action_urls(vec![ModuleRecord::named("blog")], None)
        .unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::UnknownRoute {
            route: "admin_module_manage_action".to_string()
        }
    );
}
