//! Action URL generation
//!
//! The host application owns routing; the catalog only asks it to render a
//! named route with parameters. `RouteTable` is a template-based router for
//! hosts (and the CLI) that do not bring their own.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::actions::{CONFIGURE_ACTION_ROUTE, MANAGE_ACTION_ROUTE};
use crate::error::ConfigurationError;

/// Renders named routes into URLs
pub trait ActionUrlResolver {
    fn generate(
        &self,
        route: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<String, ConfigurationError>;
}

/// Route name → URL template with `{param}` placeholders.
///
/// A deserialized table starts from the default routes; entries read from
/// the document replace routes of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: BTreeMap<String, String>,
}

impl<'de> Deserialize<'de> for RouteTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let overrides = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut table = RouteTable::default();
        table.routes.extend(overrides);
        Ok(table)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        let mut routes = BTreeMap::new();
        routes.insert(
            MANAGE_ACTION_ROUTE.to_string(),
            "/modules/manage/action/{action}/{module_name}".to_string(),
        );
        routes.insert(
            CONFIGURE_ACTION_ROUTE.to_string(),
            "/modules/manage/action/configure/{module_name}".to_string(),
        );
        Self { routes }
    }
}

impl RouteTable {
    /// An empty table; every route lookup fails
    pub fn empty() -> Self {
        Self {
            routes: BTreeMap::new(),
        }
    }

    /// Add or replace a route template
    pub fn with_route(mut self, name: &str, template: &str) -> Self {
        self.routes.insert(name.to_string(), template.to_string());
        self
    }

    pub fn template(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(|s| s.as_str())
    }
}

impl ActionUrlResolver for RouteTable {
    fn generate(
        &self,
        route: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<String, ConfigurationError> {
        let template = self
            .routes
            .get(route)
            .ok_or_else(|| ConfigurationError::UnknownRoute {
                route: route.to_string(),
            })?;

        let mut url = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let param = &rest[start + 1..start + len];
            let value =
                params
                    .get(param)
                    .ok_or_else(|| ConfigurationError::MissingRouteParameter {
                        route: route.to_string(),
                        param: param.to_string(),
                    })?;
            url.push_str(&rest[..start]);
            url.push_str(value);
            rest = &rest[start + len + 1..];
        }
        url.push_str(rest);

        Ok(url)
    }
}
