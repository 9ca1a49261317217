use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A widget as declared to the build, before registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetNode {
    /// Content type of the widget (matches `contentType` in query results)
    pub name: String,
    /// Fragment definition text, e.g. `fragment HtmlWidgetFields on HtmlWidget { ... }`
    pub fragment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<String>,
}

/// Identifier of the component that renders one widget type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RendererRef(pub String);

impl RendererRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RendererRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered widget type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetType {
    pub name: String,
    /// Name used to spread the fragment inside `FlowPartWidgets`
    pub fragment_name: String,
    /// Raw fragment text, emitted verbatim into the combined query
    pub query_fragment: String,
    pub renderer: RendererRef,
}

/// One page returned by the content query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPage {
    pub content_item_id: String,
    pub content_type: String,
    pub route_path: String,
    pub display_text: String,
    /// Widgets in rendering order
    pub widgets: Vec<WidgetInstance>,
}

impl ContentPage {
    /// Identity used in log lines and error reports
    pub fn label(&self) -> String {
        format!("{} ({})", self.content_item_id, self.route_path)
    }
}

/// A widget placed on a page, with the instance fields the query returned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetInstance {
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_item_id: Option<String>,
    pub fields: Map<String, Value>,
}

/// Raw response of the content query engine
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<QueryError>>,
}

impl QueryResponse {
    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    pub fn with_errors<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data: None,
            errors: Some(
                messages
                    .into_iter()
                    .map(|m| QueryError {
                        message: m.into(),
                        path: None,
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueryError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
}

/// Module identifier of a page template
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRef(pub String);

impl TemplateRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Data context handed to the template when the page is rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub content_item_id: String,
    pub slug: String,
}

/// A build-time route: URL path, template, and data context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRoute {
    pub path: String,
    pub template: TemplateRef,
    pub context: PageContext,
}

impl PageRoute {
    pub fn for_page(page: &ContentPage, template: TemplateRef) -> Self {
        Self {
            path: page.route_path.clone(),
            template,
            context: PageContext {
                content_item_id: page.content_item_id.clone(),
                slug: page.route_path.clone(),
            },
        }
    }
}
