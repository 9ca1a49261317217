pub mod config;
pub mod error;
pub mod registry;
pub mod route;
pub mod types;

pub use config::{CONFIG_FILE, ProjectConfig, parse_project_toml};
pub use error::{Error, Result};
pub use registry::WidgetRegistry;
pub use route::{MemoryRouteTable, RouteName, RouteNames, RouteTable};
pub use types::*;
