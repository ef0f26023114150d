//! Error reporting for absorbed catalog failures

use std::collections::BTreeMap;

/// Receives reports about failures the catalog recovers from silently
pub trait Observability {
    fn error(&self, message: &str, context: &BTreeMap<String, String>);
}

/// Reports through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observability for TracingObserver {
    fn error(&self, message: &str, context: &BTreeMap<String, String>) {
        tracing::error!(target: "modcat::catalog", context = ?context, "{}", message);
    }
}
