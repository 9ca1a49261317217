use anyhow::{Context, Result};
use flow_pages_core::CONFIG_FILE;
use std::fs;
use std::path::{Path, PathBuf};

const PAGES_DIR: &str = "src/pages";
const WIDGETS_DIR: &str = "widgets";

const SAMPLE_WIDGET: &str = r#"fragment HtmlWidgetFields on HtmlWidget {
  htmlBody {
    html
  }
}
"#;

/// Initialize a new site directory.
///
/// Writes a flowpages.toml skeleton, a sample widget fragment and the pages
/// directory the content source scanner expects. An existing flowpages.toml
/// is never overwritten.
pub async fn run(path: PathBuf) -> Result<()> {
    println!("📁 Initializing site at: {}", path.display());

    let config_path = path.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{} already exists in {}", CONFIG_FILE, path.display());
    }

    create_directory_structure(&path)?;
    println!("   ✓ Created {} and {}", PAGES_DIR, WIDGETS_DIR);

    let name = site_name(&path);
    fs::write(&config_path, generate_config_toml(&name))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("   ✓ Wrote {}", CONFIG_FILE);

    let sample = path.join(WIDGETS_DIR).join("HtmlWidget.graphql");
    if !sample.exists() {
        fs::write(&sample, SAMPLE_WIDGET).context("Failed to write sample widget")?;
        println!("   ✓ Wrote {}/HtmlWidget.graphql", WIDGETS_DIR);
    }

    println!();
    println!("Next steps:");
    println!("  1. Set [source].endpoint in {}", CONFIG_FILE);
    println!("  2. Add one .graphql fragment per widget type to {}/", WIDGETS_DIR);
    println!("  3. Run 'flow-pages build {} --output public'", path.display());

    Ok(())
}

fn create_directory_structure(base: &Path) -> Result<()> {
    fs::create_dir_all(base.join(PAGES_DIR)).context("Failed to create pages directory")?;
    fs::create_dir_all(base.join(WIDGETS_DIR)).context("Failed to create widgets directory")?;
    Ok(())
}

fn site_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("My Site")
        .to_string()
}

/// Escape a string for a TOML basic string
fn toml_escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn generate_config_toml(name: &str) -> String {
    format!(
        r#"[site]
name = "{name}"
base_template = "templates/Page"
pages_dir = "{pages}"

[source]
endpoint = "http://localhost:5000/api/graphql"
key = "cms"
collection = "page"
status = "PUBLISHED"
# token_env = "CMS_API_TOKEN"
# response = "fixtures/pages.json"

[build]
parallel = true
strict = false

[widgets]
dir = "{widgets}"

# Widgets can also be declared inline:
# [[widget]]
# name = "ImageWidget"
# renderer = "widgets/ImageWidget"
# fragment = "fragment ImageWidgetFields on ImageWidget {{ url }}"
"#,
        name = toml_escape_string(name),
        pages = PAGES_DIR,
        widgets = WIDGETS_DIR,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_pages_core::config::parse_project_toml_str;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_structure() {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("docs-site");

        run(site.clone()).await.unwrap();

        assert!(site.join(PAGES_DIR).is_dir());
        assert!(site.join("widgets/HtmlWidget.graphql").is_file());
        let config = flow_pages_core::parse_project_toml(site.join(CONFIG_FILE)).unwrap();
        assert_eq!(config.site.name, "docs-site");

        let nodes = config.widget_nodes(&site).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "HtmlWidget");
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "keep me").unwrap();

        let err = run(dir.path().to_path_buf()).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap(), "keep me");
    }

    #[test]
    fn test_create_directory_structure_idempotent() {
        let dir = TempDir::new().unwrap();
        create_directory_structure(dir.path()).unwrap();
        create_directory_structure(dir.path()).unwrap();
        assert!(dir.path().join(PAGES_DIR).is_dir());
    }

    #[test]
    fn test_generated_config_escapes_name() {
        let toml = generate_config_toml(r#"My "Quoted" \ Site"#);
        let config = parse_project_toml_str(&toml).unwrap();
        assert_eq!(config.site.name, r#"My "Quoted" \ Site"#);
        assert_eq!(config.source.key, "cms");
    }
}
