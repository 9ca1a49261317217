//! Route naming and the route table pages are registered into.

use crate::error::{Error, Result};
use crate::types::{PageRoute, TemplateRef};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Template module name used for a route whose name normalizes to nothing (`/`)
pub const INDEX_TEMPLATE: &str = "index";

/// Hex digits added per attempt when a module name is taken
const SUFFIX_LEN: usize = 8;

/// Module-safe identifier derived from a route path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteName(String);

impl RouteName {
    /// Strip every character outside `[A-Za-z0-9]`.
    ///
    /// ```text
    /// "/blog/my-post!" → "blogmypost"
    /// "/"              → ""
    /// ```
    pub fn from_path(path: &str) -> Self {
        Self(path.chars().filter(|c| c.is_ascii_alphanumeric()).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn template_ref(&self) -> TemplateRef {
        if self.0.is_empty() {
            TemplateRef(INDEX_TEMPLATE.to_string())
        } else {
            TemplateRef(self.0.clone())
        }
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out route names whose template modules are unique.
///
/// Uniqueness is checked on the module name, so `/` (module `index`) and
/// `/index` clash. The first path to claim a module keeps it. A later path
/// whose module is taken gets a hex suffix from the sha256 of its path: 8
/// digits, lengthened until the module is free. Claiming the same path
/// twice returns the same name.
#[derive(Debug, Default)]
pub struct RouteNames {
    /// module name → path owning it
    modules: HashMap<String, String>,
    by_path: HashMap<String, RouteName>,
}

impl RouteNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, path: &str) -> RouteName {
        if let Some(name) = self.by_path.get(path) {
            return name.clone();
        }

        let base = RouteName::from_path(path);
        let module = base.template_ref().0;
        let name = match self.modules.get(&module) {
            None => base,
            Some(other) => {
                warn!(path, other = %other, module = %module, "route name collision, adding hash suffix");
                self.suffixed(&module, path)
            }
        };

        self.modules.insert(name.template_ref().0, path.to_string());
        self.by_path.insert(path.to_string(), name.clone());
        name
    }

    fn suffixed(&self, module: &str, path: &str) -> RouteName {
        let digest = format!("{:x}", Sha256::digest(path.as_bytes()));
        let mut len = SUFFIX_LEN;
        let mut counter = 0u32;
        loop {
            let candidate = if len <= digest.len() {
                format!("{}{}", module, &digest[..len])
            } else {
                counter += 1;
                format!("{}{}{}", module, digest, counter)
            };
            if !self.modules.contains_key(&candidate) {
                return RouteName(candidate);
            }
            len += SUFFIX_LEN;
        }
    }
}

/// Destination of registered page routes.
pub trait RouteTable {
    fn register(&mut self, route: PageRoute) -> Result<()>;
}

/// Route table held in memory, in registration order.
#[derive(Debug, Default)]
pub struct MemoryRouteTable {
    routes: Vec<PageRoute>,
    paths: HashMap<String, usize>,
}

impl MemoryRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[PageRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_routes(self) -> Vec<PageRoute> {
        self.routes
    }
}

impl RouteTable for MemoryRouteTable {
    fn register(&mut self, route: PageRoute) -> Result<()> {
        if self.paths.contains_key(&route.path) {
            return Err(Error::DuplicateRoute {
                path: route.path,
                page: route.context.content_item_id,
            });
        }
        self.paths.insert(route.path.clone(), self.routes.len());
        self.routes.push(route);
        Ok(())
    }
}
