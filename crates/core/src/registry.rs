//! Widget registry: the fixed set of widget types known to one build.

use crate::error::Result;
use crate::types::{RendererRef, WidgetNode, WidgetType};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory prefix for renderers of widgets that do not name one
pub const DEFAULT_RENDERER_DIR: &str = "widgets";

fn fragment_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"fragment\s+([_A-Za-z][_0-9A-Za-z]*)\s+on\s+([_A-Za-z][_0-9A-Za-z]*)")
            .expect("fragment header pattern is valid")
    })
}

/// Parse `fragment <Name> on <Type>` from the start of a fragment definition.
///
/// Returns `(name, type_condition)` for the first definition in the text.
pub fn parse_fragment_header(text: &str) -> Option<(&str, &str)> {
    let caps = fragment_header().captures(text)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Immutable registry of widget types, in registration order.
#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    types: Vec<WidgetType>,
    index: HashMap<String, usize>,
}

impl WidgetRegistry {
    /// Build the registry from every widget node known to the build.
    ///
    /// Nodes are deduplicated by widget name; the first registration wins.
    /// Fragment text is not validated here: an unparseable fragment keeps
    /// the widget name as its spread name and surfaces later as a query error.
    pub fn register<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = WidgetNode>,
    {
        let mut registry = Self::default();

        for node in nodes {
            if registry.index.contains_key(&node.name) {
                warn!(widget = %node.name, "duplicate widget registration ignored");
                continue;
            }

            let fragment_name = match parse_fragment_header(&node.fragment) {
                Some((name, _)) => name.to_string(),
                None => {
                    warn!(widget = %node.name, "fragment has no `fragment <Name> on <Type>` header");
                    node.name.clone()
                }
            };

            let renderer = node
                .renderer
                .unwrap_or_else(|| format!("{}/{}", DEFAULT_RENDERER_DIR, node.name));

            debug!(widget = %node.name, fragment = %fragment_name, "registered widget");
            registry.index.insert(node.name.clone(), registry.types.len());
            registry.types.push(WidgetType {
                name: node.name,
                fragment_name,
                query_fragment: node.fragment,
                renderer: RendererRef(renderer),
            });
        }

        registry
    }

    pub fn types(&self) -> &[WidgetType] {
        &self.types
    }

    pub fn get(&self, name: &str) -> Option<&WidgetType> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Discover widget nodes from `*.graphql` files under `dir`.
///
/// Files are read in path order. The widget name is the fragment's type
/// condition, or the file stem when the header does not parse.
pub fn discover_dir(dir: &Path) -> Result<Vec<WidgetNode>> {
    let mut nodes = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some("graphql")
        {
            continue;
        }

        let fragment = fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let name = parse_fragment_header(&fragment)
            .map(|(_, on)| on.to_string())
            .unwrap_or(stem);

        debug!(path = %path.display(), widget = %name, "discovered widget fragment");
        nodes.push(WidgetNode {
            name,
            fragment,
            renderer: None,
        });
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn node(name: &str, fragment: &str) -> WidgetNode {
        WidgetNode {
            name: name.to_string(),
            fragment: fragment.to_string(),
            renderer: None,
        }
    }

    #[test]
    fn test_parse_fragment_header() {
        let text = "fragment HtmlWidgetFields on HtmlWidget { htmlBody { html } }";
        assert_eq!(
            parse_fragment_header(text),
            Some(("HtmlWidgetFields", "HtmlWidget"))
        );
        assert_eq!(
            parse_fragment_header("\n  fragment  A_1\non  B { x }"),
            Some(("A_1", "B"))
        );
        assert_eq!(parse_fragment_header("{ html }"), None);
    }

    #[test]
    fn test_register_dedupes_by_name_first_wins() {
        let registry = WidgetRegistry::register(vec![
            node("HtmlWidget", "fragment HtmlA on HtmlWidget { a }"),
            node("ImageWidget", "fragment Img on ImageWidget { url }"),
            node("HtmlWidget", "fragment HtmlB on HtmlWidget { b }"),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.types()[0].name, "HtmlWidget");
        assert_eq!(registry.types()[1].name, "ImageWidget");
        assert_eq!(registry.get("HtmlWidget").unwrap().fragment_name, "HtmlA");
    }

    #[test]
    fn test_register_defaults_renderer() {
        let mut custom = node("Quote", "fragment QuoteFields on Quote { text }");
        custom.renderer = Some("components/Quote".into());
        let registry = WidgetRegistry::register(vec![
            node("HtmlWidget", "fragment HtmlA on HtmlWidget { a }"),
            custom,
        ]);

        assert_eq!(registry.get("HtmlWidget").unwrap().renderer.as_str(), "widgets/HtmlWidget");
        assert_eq!(registry.get("Quote").unwrap().renderer.as_str(), "components/Quote");
    }

    #[test]
    fn test_register_passes_malformed_fragment_through() {
        let registry = WidgetRegistry::register(vec![node("Broken", "{ not a fragment")]);
        let broken = registry.get("Broken").unwrap();
        assert_eq!(broken.fragment_name, "Broken");
        assert_eq!(broken.query_fragment, "{ not a fragment");
    }

    #[test]
    fn test_empty_registry() {
        let registry = WidgetRegistry::register(Vec::new());
        assert!(registry.is_empty());
        assert!(registry.get("HtmlWidget").is_none());
    }

    #[test]
    fn test_discover_dir_reads_graphql_files_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("b-image.graphql"),
            "fragment ImageFields on ImageWidget { url }",
        )
        .unwrap();
        fs::write(dir.path().join("a-html.graphql"), "{ html }").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let nodes = discover_dir(dir.path()).unwrap();
        assert_eq!(nodes.len(), 2);
        // No header: falls back to file stem
        assert_eq!(nodes[0].name, "a-html");
        assert_eq!(nodes[1].name, "ImageWidget");
        assert!(nodes.iter().all(|n| n.renderer.is_none()));
    }
}
