use anyhow::Result;
use flow_pages_core::WidgetRegistry;
use flow_pages_generator::{BaseSelection, compose};
use std::path::PathBuf;

use super::load_site;

/// Print the combined query the build would issue
pub async fn run(path: PathBuf) -> Result<()> {
    let (config, nodes) = load_site(&path)?;
    let registry = WidgetRegistry::register(nodes);
    let query = compose(&registry, &BaseSelection::from_config(&config.source));

    println!("{}", query);
    Ok(())
}
