use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flow_pages_client::{ContentQueryClient, FixtureClient, GraphQlClient};
use flow_pages_core::{MemoryRouteTable, PageRoute, ProjectConfig, WidgetRegistry};
use flow_pages_generator::{BuildOutput, BuildReport, PageRegistrar, RegistrarOptions};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the route manifest written to the output directory
pub const MANIFEST_FILE: &str = "routes.json";

/// Command-line overrides for a build
#[derive(Debug, Default)]
pub struct BuildArgs {
    pub response: Option<PathBuf>,
    pub strict: bool,
    pub sequential: bool,
}

#[derive(Serialize)]
struct RouteManifest<'a> {
    site: &'a str,
    generated_at: DateTime<Utc>,
    routes: &'a [PageRoute],
    report: &'a BuildReport,
}

/// Build page routes for deployment
pub async fn run(path: PathBuf, output: PathBuf, args: BuildArgs) -> Result<()> {
    println!("🔨 Building page routes...");
    println!("   Source: {}", path.display());
    println!("   Output: {}", output.display());
    println!();

    let (config, nodes) = super::load_site(&path)?;
    let registry = WidgetRegistry::register(nodes);

    println!("✓ Loaded: {}", config.site.name);
    println!("  Widgets: {}", registry.len());
    println!();

    // The content source scanner expects the pages directory to exist
    let pages_dir = path.join(&config.site.pages_dir);
    fs::create_dir_all(&pages_dir)
        .with_context(|| format!("Failed to create {}", pages_dir.display()))?;

    let client = content_client(&path, &config, args.response.as_deref())?;

    let mut options = RegistrarOptions::from_config(&config);
    options.strict |= args.strict;
    options.parallel &= !args.sequential;

    println!("📡 Querying pages...");
    let mut registrar = PageRegistrar::new(&registry, options);
    let mut table = MemoryRouteTable::new();
    let built = registrar
        .run(client.as_ref(), &mut table)
        .await
        .context("Page build failed")?;

    for skipped in &built.report.skipped {
        eprintln!("   ⚠ Skipped page #{}: {}", skipped.index, skipped.reason);
    }
    println!(
        "   ✓ Registered {} routes ({} templates, {} reused)",
        built.report.routes, built.report.templates, built.report.reused_templates
    );

    println!("📄 Writing manifest...");
    write_manifest(&output, &config.site.name, table.routes(), &built)?;
    println!("   ✓ Wrote {}", output.join(MANIFEST_FILE).display());

    println!();
    println!("✅ Build complete!");
    println!();

    Ok(())
}

/// Pick the recorded response (flag first, then config) or the live endpoint
fn content_client(
    path: &Path,
    config: &ProjectConfig,
    response: Option<&Path>,
) -> Result<Box<dyn ContentQueryClient>> {
    let recorded = response
        .map(Path::to_path_buf)
        .or_else(|| config.source.response.as_ref().map(|r| path.join(r)));

    match recorded {
        Some(file) => {
            println!("   Using recorded response: {}", file.display());
            let client = FixtureClient::from_file(&file)
                .with_context(|| format!("Failed to load {}", file.display()))?;
            Ok(Box::new(client))
        }
        None => {
            let client = GraphQlClient::from_config(&config.source)
                .context("Failed to configure content source")?;
            println!("   Endpoint: {}", client.endpoint());
            Ok(Box::new(client))
        }
    }
}

/// Write `routes.json` and one `templates/<name>.json` per emitted template
pub fn write_manifest(
    output: &Path,
    site: &str,
    routes: &[PageRoute],
    built: &BuildOutput,
) -> Result<()> {
    let templates_dir = output.join("templates");
    fs::create_dir_all(&templates_dir).context("Failed to create templates directory")?;

    for (template_ref, template) in built.catalog.iter() {
        let file = templates_dir.join(format!("{}.json", template_ref));
        let json = serde_json::to_string_pretty(template)?;
        fs::write(&file, json).with_context(|| format!("Failed to write {}", file.display()))?;
    }

    let manifest = RouteManifest {
        site,
        generated_at: Utc::now(),
        routes,
        report: &built.report,
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(output.join(MANIFEST_FILE), json).context("Failed to write route manifest")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_pages_core::CONFIG_FILE;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    const CONFIG: &str = r##"
[site]
name = "Fixture Site"

[source]
response = "response.json"

[[widget]]
name = "HtmlWidget"
renderer = "components/Html"
fragment = "fragment HtmlFields on HtmlWidget { htmlBody { html } }"
"##;

    fn site(response: Value) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), CONFIG).unwrap();
        fs::write(dir.path().join("response.json"), response.to_string()).unwrap();
        dir
    }

    fn page(id: &str, path: &str, widgets: Value) -> Value {
        json!({
            "contentItemId": id,
            "contentType": "Page",
            "autoroutePart": { "path": path },
            "displayText": id,
            "flowPart": { "widgets": widgets }
        })
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_build_writes_routes_and_templates() {
        let site = site(json!({
            "data": { "cms": { "page": [
                page("home", "/", json!([{ "contentType": "HtmlWidget" }])),
                null,
                page("about", "/about-us", json!([]))
            ] } }
        }));
        let out = TempDir::new().unwrap();

        run(site.path().to_path_buf(), out.path().to_path_buf(), BuildArgs::default())
            .await
            .unwrap();

        assert!(site.path().join("src/pages").is_dir());

        let manifest = read_json(&out.path().join(MANIFEST_FILE));
        assert_eq!(manifest["site"], "Fixture Site");
        let routes = manifest["routes"].as_array().unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[1]["path"], "/about-us");
        assert_eq!(routes[1]["template"], "aboutus");
        assert_eq!(routes[1]["context"], json!({ "contentItemId": "about", "slug": "/about-us" }));
        assert_eq!(manifest["report"]["null_entries"], 1);

        let index = read_json(&out.path().join("templates/index.json"));
        assert_eq!(index["imports"][0]["renderer"], "components/Html");
        assert!(out.path().join("templates/aboutus.json").exists());
    }

    #[tokio::test]
    async fn test_build_query_errors_write_nothing() {
        let site = site(json!({ "errors": [{ "message": "Unknown fragment" }] }));
        let out = TempDir::new().unwrap();

        let err = run(site.path().to_path_buf(), out.path().to_path_buf(), BuildArgs::default())
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("Unknown fragment"));
        assert!(!out.path().join(MANIFEST_FILE).exists());
    }

    #[tokio::test]
    async fn test_build_strict_flag_fails_on_unknown_widget() {
        let site = site(json!({
            "data": { "cms": { "page": [
                page("a", "/a", json!([{ "contentType": "VideoWidget" }]))
            ] } }
        }));
        let out = TempDir::new().unwrap();
        let args = BuildArgs {
            strict: true,
            ..BuildArgs::default()
        };

        let err = run(site.path().to_path_buf(), out.path().to_path_buf(), args)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("VideoWidget"));
    }

    #[tokio::test]
    async fn test_build_response_flag_overrides_config() {
        let site = site(json!({ "errors": [{ "message": "stale" }] }));
        let fresh = site.path().join("fresh.json");
        fs::write(&fresh, json!({ "data": { "cms": { "page": [] } } }).to_string()).unwrap();
        let out = TempDir::new().unwrap();
        let args = BuildArgs {
            response: Some(fresh),
            ..BuildArgs::default()
        };

        run(site.path().to_path_buf(), out.path().to_path_buf(), args)
            .await
            .unwrap();
        let manifest = read_json(&out.path().join(MANIFEST_FILE));
        assert!(manifest["routes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_without_config_fails() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let err = run(dir.path().to_path_buf(), out.path().to_path_buf(), BuildArgs::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("flowpages.toml not found"));
    }
}
