pub mod build;
pub mod init;
pub mod query;
pub mod validate;

use anyhow::{Context, Result};
use flow_pages_core::{CONFIG_FILE, ProjectConfig, WidgetNode, parse_project_toml};
use std::path::Path;

/// Load flowpages.toml and every widget node of a site directory
pub fn load_site(path: &Path) -> Result<(ProjectConfig, Vec<WidgetNode>)> {
    if !path.exists() {
        anyhow::bail!("Site directory does not exist: {}", path.display());
    }

    let config_path = path.join(CONFIG_FILE);
    if !config_path.exists() {
        anyhow::bail!(
            "{} not found in {}\nRun 'flow-pages init {}' first",
            CONFIG_FILE,
            path.display(),
            path.display()
        );
    }

    let config = parse_project_toml(&config_path)
        .with_context(|| format!("Failed to parse {}", CONFIG_FILE))?;
    let nodes = config
        .widget_nodes(path)
        .context("Failed to load widget fragments")?;

    Ok((config, nodes))
}
