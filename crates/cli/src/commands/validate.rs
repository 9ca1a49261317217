use anyhow::Result;
use flow_pages_validator::validate_widgets;
use std::path::PathBuf;

use super::load_site;

pub async fn run(path: PathBuf) -> Result<()> {
    println!("Validating site at: {}", path.display());

    let (config, nodes) = load_site(&path)?;
    println!("✓ flowpages.toml valid");
    println!("  Site: {}", config.site.name);
    match &config.source.endpoint {
        Some(endpoint) => println!("  Source: {}", endpoint),
        None => println!("  Source: recorded response"),
    }

    let report = validate_widgets(&nodes);
    for info in &report.info {
        println!("  {}", info);
    }
    for warning in &report.warnings {
        println!("⚠ {}", warning);
    }
    for error in &report.errors {
        println!("✗ {}", error);
    }

    if !report.is_ok() {
        anyhow::bail!("{} widget error(s)", report.errors.len());
    }

    println!("✓ Widgets valid");
    Ok(())
}
