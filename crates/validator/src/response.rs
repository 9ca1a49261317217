//! Validation at the query-result boundary.
//!
//! Turns the untyped query response into page entries and typed
//! [`ContentPage`]s, rejecting shapes the pipeline cannot use.

use flow_pages_core::{ContentPage, Error, QueryResponse, Result, WidgetInstance};
use serde_json::{Map, Value};
use tracing::warn;

/// Check the response envelope and return the page entries in order.
///
/// `null` entries are kept as `None`; the caller skips them.
pub fn page_entries(
    response: QueryResponse,
    source_key: &str,
    collection: &str,
) -> Result<Vec<Option<Value>>> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        return Err(Error::ContentQuery {
            messages: errors.into_iter().map(|e| e.message).collect(),
        });
    }

    let missing = || Error::MissingContentSource {
        key: source_key.to_string(),
    };

    let mut data = response.data.ok_or_else(missing)?;
    let source = data
        .get_mut(source_key)
        .filter(|v| !v.is_null())
        .ok_or_else(missing)?;

    match source.get_mut(collection).map(Value::take) {
        Some(Value::Array(pages)) => Ok(pages
            .into_iter()
            .map(|p| if p.is_null() { None } else { Some(p) })
            .collect()),
        Some(Value::Null) => Ok(Vec::new()),
        _ => Err(Error::MissingContentSource {
            key: format!("{}.{}", source_key, collection),
        }),
    }
}

/// Convert one page entry into a [`ContentPage`].
///
/// A page without `contentItemId` or `autoroutePart.path` is malformed.
/// Missing `flowPart` means a page with no widgets.
pub fn parse_page(value: &Value) -> Result<ContentPage> {
    let obj = value.as_object().ok_or_else(|| Error::MalformedPage {
        page: "<unknown>".to_string(),
        reason: "page entry is not an object".to_string(),
    })?;

    let content_item_id = str_field(obj, "contentItemId").ok_or_else(|| Error::MalformedPage {
        page: "<unknown>".to_string(),
        reason: "missing contentItemId".to_string(),
    })?;

    let malformed = |reason: &str| Error::MalformedPage {
        page: content_item_id.to_string(),
        reason: reason.to_string(),
    };

    let route_path = obj
        .get("autoroutePart")
        .and_then(|a| a.get("path"))
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing autoroutePart.path"))?;

    let widgets = match obj.get("flowPart").and_then(|f| f.get("widgets")) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter(|(i, w)| {
                if w.is_null() {
                    warn!(page = %content_item_id, index = i, "skipping null widget entry");
                }
                !w.is_null()
            })
            .map(|(i, w)| parse_widget(w).ok_or_else(|| malformed(&format!("widget #{} has no contentType", i))))
            .collect::<Result<Vec<_>>>()?,
        Some(_) => return Err(malformed("flowPart.widgets is not a list")),
    };

    Ok(ContentPage {
        content_item_id: content_item_id.to_string(),
        content_type: str_field(obj, "contentType").unwrap_or_default().to_string(),
        route_path: route_path.to_string(),
        display_text: str_field(obj, "displayText").unwrap_or_default().to_string(),
        widgets,
    })
}

fn parse_widget(value: &Value) -> Option<WidgetInstance> {
    let obj = value.as_object()?;
    let content_type = str_field(obj, "contentType")?.to_string();
    let content_item_id = str_field(obj, "contentItemId").map(str::to_string);

    let fields: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| k.as_str() != "contentType" && k.as_str() != "contentItemId")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Some(WidgetInstance {
        content_type,
        content_item_id,
        fields,
    })
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}
