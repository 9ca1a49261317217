use crate::error::{Error, Result};
use crate::registry::discover_dir;
use crate::types::WidgetNode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "flowpages.toml";

const DEFAULT_SOURCE_KEY: &str = "cms";
const DEFAULT_COLLECTION: &str = "page";
const DEFAULT_STATUS: &str = "PUBLISHED";
const DEFAULT_PAGES_DIR: &str = "src/pages";
const DEFAULT_BASE_TEMPLATE: &str = "templates/Page";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw TOML configuration structure
/// This matches the flowpages.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSite,
    source: RawSource,
    #[serde(default)]
    build: BuildConfig,
    #[serde(default)]
    widgets: RawWidgets,
    #[serde(default)]
    widget: Vec<RawWidget>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    name: String,
    base_template: Option<String>,
    pages_dir: Option<String>, // Convert to PathBuf
}

#[derive(Debug, Deserialize)]
struct RawSource {
    endpoint: Option<String>,
    key: Option<String>,
    collection: Option<String>,
    status: Option<String>,
    token_env: Option<String>,
    timeout_secs: Option<u64>,
    response: Option<String>, // Convert to PathBuf
}

#[derive(Debug, Default, Deserialize)]
struct RawWidgets {
    dir: Option<String>, // Convert to PathBuf
}

#[derive(Debug, Deserialize)]
struct RawWidget {
    name: String,
    renderer: Option<String>,
    fragment: Option<String>,
    fragment_file: Option<String>, // Convert to PathBuf
}

/// Complete project configuration
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub site: SiteConfig,
    pub source: SourceConfig,
    pub build: BuildConfig,
    pub widgets_dir: Option<PathBuf>,
    pub widgets: Vec<WidgetDecl>,
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub name: String,
    /// Page shell every generated template wraps
    pub base_template: String,
    pub pages_dir: PathBuf,
}

/// Where and how the combined query is sent
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub endpoint: Option<String>,
    /// Top-level key of the content source in the response data
    pub key: String,
    /// Collection field holding pages under the source key
    pub collection: String,
    /// Status filter passed to the collection field, omitted when `None`
    pub status: Option<String>,
    /// Environment variable holding a bearer token
    pub token_env: Option<String>,
    pub timeout_secs: u64,
    /// Recorded response to build from instead of querying the endpoint
    pub response: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Fail the build on any per-page error instead of skipping the page
    #[serde(default)]
    pub strict: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            strict: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A widget declared in the config file
#[derive(Debug, Clone)]
pub struct WidgetDecl {
    pub name: String,
    pub renderer: Option<String>,
    pub fragment: WidgetFragment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetFragment {
    Inline(String),
    File(PathBuf),
}

impl ProjectConfig {
    /// Collect every widget node: declared widgets first, then the widgets directory.
    ///
    /// Relative paths are resolved against `root`.
    pub fn widget_nodes(&self, root: &Path) -> Result<Vec<WidgetNode>> {
        let mut nodes = Vec::with_capacity(self.widgets.len());

        for decl in &self.widgets {
            let fragment = match &decl.fragment {
                WidgetFragment::Inline(text) => text.clone(),
                WidgetFragment::File(path) => {
                    fs::read_to_string(root.join(path)).map_err(|e| {
                        Error::ConfigParse(format!(
                            "Cannot read fragment_file '{}' for widget '{}': {}",
                            path.display(),
                            decl.name,
                            e
                        ))
                    })?
                }
            };
            nodes.push(WidgetNode {
                name: decl.name.clone(),
                fragment,
                renderer: decl.renderer.clone(),
            });
        }

        if let Some(dir) = &self.widgets_dir {
            let dir = root.join(dir);
            if dir.is_dir() {
                nodes.extend(discover_dir(&dir)?);
            } else {
                tracing::warn!(dir = %dir.display(), "widgets directory not found");
            }
        }

        Ok(nodes)
    }
}

/// Parse flowpages.toml from a file path
pub fn parse_project_toml<P: AsRef<Path>>(path: P) -> Result<ProjectConfig> {
    let content = fs::read_to_string(path)?;
    parse_project_toml_str(&content)
}

/// Parse flowpages.toml from a string (useful for testing)
pub fn parse_project_toml_str(content: &str) -> Result<ProjectConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let pages_dir = validate_path(
        raw.site.pages_dir.as_deref().unwrap_or(DEFAULT_PAGES_DIR),
        "site.pages_dir",
    )?;

    let site = SiteConfig {
        name: raw.site.name,
        base_template: raw
            .site
            .base_template
            .unwrap_or_else(|| DEFAULT_BASE_TEMPLATE.to_string()),
        pages_dir,
    };

    let response = match raw.source.response {
        Some(p) => Some(validate_path(&p, "source.response")?),
        None => None,
    };

    if raw.source.endpoint.is_none() && response.is_none() {
        return Err(Error::ConfigParse(
            "[source] needs either 'endpoint' or 'response'".to_string(),
        ));
    }

    let status = match raw.source.status {
        Some(s) if s.trim().is_empty() => None,
        Some(s) => Some(s),
        None => Some(DEFAULT_STATUS.to_string()),
    };

    let source = SourceConfig {
        endpoint: raw.source.endpoint,
        key: raw.source.key.unwrap_or_else(|| DEFAULT_SOURCE_KEY.to_string()),
        collection: raw
            .source
            .collection
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
        status,
        token_env: raw.source.token_env,
        timeout_secs: raw.source.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        response,
    };

    let widgets_dir = match raw.widgets.dir {
        Some(d) => Some(validate_path(&d, "widgets.dir")?),
        None => None,
    };

    // Convert widget declarations, validating fragment paths
    let widgets: Result<Vec<WidgetDecl>> = raw
        .widget
        .into_iter()
        .map(|w| {
            let fragment = match (w.fragment, w.fragment_file) {
                (Some(text), None) => WidgetFragment::Inline(text),
                (None, Some(path)) => {
                    WidgetFragment::File(validate_path(&path, "widget.fragment_file")?)
                }
                (Some(_), Some(_)) => {
                    return Err(Error::ConfigParse(format!(
                        "Widget '{}' sets both 'fragment' and 'fragment_file'",
                        w.name
                    )));
                }
                (None, None) => {
                    return Err(Error::ConfigParse(format!(
                        "Widget '{}' needs 'fragment' or 'fragment_file'",
                        w.name
                    )));
                }
            };

            Ok(WidgetDecl {
                name: w.name,
                renderer: w.renderer,
                fragment,
            })
        })
        .collect();

    Ok(ProjectConfig {
        site,
        source,
        build: raw.build,
        widgets_dir,
        widgets: widgets?,
    })
}

/// Validate and convert a path string to PathBuf.
///
/// Rejects absolute paths and parent directory references (`..`) so a
/// config file cannot point outside the project directory.
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    if path_str.trim().is_empty() {
        return Err(Error::ConfigParse(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    if path.is_absolute() {
        return Err(Error::ConfigParse(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::ConfigParse(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    Ok(path.to_path_buf())
}
