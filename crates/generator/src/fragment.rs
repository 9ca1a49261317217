//! Combined page query composition.
//!
//! Every registered widget fragment is emitted once, followed by the
//! `FlowPartWidgets` fragment that spreads them all, and then the page
//! selection under the content source key. The query is sent once for the
//! whole site, so it covers every widget type even if no page uses it.

use flow_pages_core::config::SourceConfig;
use flow_pages_core::{ContentPage, WidgetRegistry};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Name of the fragment that selects the widgets of a flow part
pub const FLOW_PART_FRAGMENT: &str = "FlowPartWidgets";

/// Where pages live in the response: `<source> { <collection>(status: ..) }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSelection {
    pub source: String,
    pub collection: String,
    pub status: Option<String>,
}

impl BaseSelection {
    pub fn from_config(source: &SourceConfig) -> Self {
        Self {
            source: source.key.clone(),
            collection: source.collection.clone(),
            status: source.status.clone(),
        }
    }
}

impl Default for BaseSelection {
    fn default() -> Self {
        Self {
            source: "cms".to_string(),
            collection: "page".to_string(),
            status: Some("PUBLISHED".to_string()),
        }
    }
}

/// The query document issued once per build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedQuery {
    document: String,
    fragment_names: Vec<String>,
}

impl CombinedQuery {
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Fragment names spread by `FlowPartWidgets`, in registration order
    pub fn fragment_names(&self) -> &[String] {
        &self.fragment_names
    }
}

impl fmt::Display for CombinedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.document)
    }
}

/// Compose the combined query for every widget type in the registry.
pub fn compose(registry: &WidgetRegistry, base: &BaseSelection) -> CombinedQuery {
    let mut document = String::new();
    let mut seen = HashSet::new();
    let mut fragment_names = Vec::with_capacity(registry.len());

    for widget in registry.types() {
        if !seen.insert(widget.fragment_name.as_str()) {
            warn!(
                widget = %widget.name,
                fragment = %widget.fragment_name,
                "fragment already defined by another widget, emitting once"
            );
            continue;
        }
        fragment_names.push(widget.fragment_name.clone());
        document.push_str(widget.query_fragment.trim());
        document.push_str("\n\n");
    }

    document.push_str(&format!("fragment {} on FlowPart {{\n", FLOW_PART_FRAGMENT));
    document.push_str("  widgets {\n    contentItemId\n    contentType\n");
    for name in &fragment_names {
        document.push_str(&format!("    ...{}\n", name));
    }
    document.push_str("  }\n}\n\n");

    let filter = match &base.status {
        Some(status) => format!("(status: {})", status),
        None => String::new(),
    };
    document.push_str(&format!(
        r#"{{
  {source} {{
    {collection}{filter} {{
      contentItemId
      contentType
      autoroutePart {{
        path
      }}
      displayText
      flowPart {{
        ...{flow}
      }}
    }}
  }}
}}
"#,
        source = base.source,
        collection = base.collection,
        filter = filter,
        flow = FLOW_PART_FRAGMENT,
    ));

    CombinedQuery {
        document,
        fragment_names,
    }
}

/// Fragment names a page's widgets need, distinct and in page order.
///
/// Widgets whose type is not registered contribute nothing here; the
/// template builder reports them.
pub fn needed_fragments<'r>(registry: &'r WidgetRegistry, page: &ContentPage) -> Vec<&'r str> {
    let mut needed: Vec<&str> = Vec::new();
    for instance in &page.widgets {
        if let Some(widget) = registry.get(&instance.content_type)
            && !needed.contains(&widget.fragment_name.as_str())
        {
            needed.push(&widget.fragment_name);
        }
    }
    needed
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_pages_core::{WidgetInstance, WidgetNode};
    use serde_json::Map;

    fn registry(widgets: &[(&str, &str)]) -> WidgetRegistry {
        WidgetRegistry::register(widgets.iter().map(|(name, fragment)| WidgetNode {
            name: name.to_string(),
            fragment: fragment.to_string(),
            renderer: None,
        }))
    }

    fn site_registry() -> WidgetRegistry {
        registry(&[
            ("HtmlWidget", "fragment HtmlFields on HtmlWidget { htmlBody { html } }"),
            ("ImageWidget", "fragment ImageFields on ImageWidget { url alt }"),
            ("QuoteWidget", "fragment QuoteFields on QuoteWidget { text }"),
        ])
    }

    fn page_with(types: &[&str]) -> ContentPage {
        ContentPage {
            content_item_id: "p".into(),
            content_type: "Page".into(),
            route_path: "/p".into(),
            display_text: "P".into(),
            widgets: types
                .iter()
                .map(|t| WidgetInstance {
                    content_type: t.to_string(),
                    content_item_id: None,
                    fields: Map::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_compose_defines_and_spreads_every_fragment() {
        let query = compose(&site_registry(), &BaseSelection::default());
        let doc = query.document();

        for name in ["HtmlFields", "ImageFields", "QuoteFields"] {
            assert_eq!(doc.matches(&format!("fragment {} on", name)).count(), 1);
            assert_eq!(doc.matches(&format!("...{}\n", name)).count(), 1);
        }
        assert_eq!(doc.matches("fragment FlowPartWidgets on FlowPart").count(), 1);
        assert!(doc.contains("page(status: PUBLISHED)"));
        assert!(doc.contains("...FlowPartWidgets"));
        assert_eq!(query.fragment_names(), ["HtmlFields", "ImageFields", "QuoteFields"]);
    }

    #[test]
    fn test_compose_keeps_registration_order() {
        let query = compose(&site_registry(), &BaseSelection::default());
        let doc = query.document();
        let html = doc.find("fragment HtmlFields").unwrap();
        let image = doc.find("fragment ImageFields").unwrap();
        let quote = doc.find("fragment QuoteFields").unwrap();
        let flow = doc.find("fragment FlowPartWidgets").unwrap();
        assert!(html < image && image < quote && quote < flow);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let a = compose(&site_registry(), &BaseSelection::default());
        let b = compose(&site_registry(), &BaseSelection::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_compose_collapses_duplicate_fragment_names() {
        let registry = registry(&[
            ("HtmlWidget", "fragment Shared on HtmlWidget { html }"),
            ("TextWidget", "fragment Shared on TextWidget { text }"),
        ]);
        let query = compose(&registry, &BaseSelection::default());
        assert_eq!(query.document().matches("fragment Shared on").count(), 1);
        assert_eq!(query.document().matches("...Shared").count(), 1);
    }

    #[test]
    fn test_compose_with_no_widgets() {
        let query = compose(&WidgetRegistry::default(), &BaseSelection::default());
        let doc = query.document();
        assert!(query.fragment_names().is_empty());
        assert!(doc.starts_with("fragment FlowPartWidgets on FlowPart"));
        assert!(!doc.contains("...HtmlFields"));
        assert!(doc.contains("autoroutePart"));
    }

    #[test]
    fn test_compose_custom_base_selection() {
        let base = BaseSelection {
            source: "orchard".into(),
            collection: "article".into(),
            status: None,
        };
        let doc = compose(&site_registry(), &base).to_string();
        assert!(doc.contains("  orchard {\n    article {\n"));
        assert!(!doc.contains("status:"));
    }

    #[test]
    fn test_needed_fragments_distinct_in_page_order() {
        let registry = site_registry();
        let page = page_with(&["QuoteWidget", "HtmlWidget", "QuoteWidget", "Unknown"]);
        assert_eq!(needed_fragments(&registry, &page), vec!["QuoteFields", "HtmlFields"]);
        assert!(needed_fragments(&registry, &page_with(&[])).is_empty());
    }
}
