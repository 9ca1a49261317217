// Validation of widget declarations and of content query responses

pub mod response;

pub use response::{page_entries, parse_page};

use flow_pages_core::WidgetNode;
use flow_pages_core::registry::parse_fragment_header;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check widget nodes before they are registered and composed into a query.
pub fn validate_widgets(nodes: &[WidgetNode]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut names: HashMap<&str, usize> = HashMap::new();
    let mut fragments: HashMap<&str, &str> = HashMap::new();

    for node in nodes {
        let seen = names.entry(node.name.as_str()).or_insert(0);
        *seen += 1;
        if *seen == 2 {
            report.warnings.push(format!(
                "Widget '{}' is declared more than once; only the first is used",
                node.name
            ));
        }
        if *seen > 1 {
            continue;
        }

        match parse_fragment_header(&node.fragment) {
            None => report.errors.push(format!(
                "Widget '{}' fragment has no `fragment <Name> on <Type>` header",
                node.name
            )),
            Some((fragment, on)) => {
                if on != node.name {
                    report.warnings.push(format!(
                        "Widget '{}' fragment applies to type '{}'",
                        node.name, on
                    ));
                }
                if let Some(owner) = fragments.insert(fragment, node.name.as_str()) {
                    report.warnings.push(format!(
                        "Fragment '{}' is defined by both '{}' and '{}'; it is emitted once",
                        fragment, owner, node.name
                    ));
                }
            }
        }

        if node.renderer.is_none() {
            report.info.push(format!(
                "Widget '{}' uses the default renderer",
                node.name
            ));
        }
    }

    report.info.push(format!("{} widget type(s)", names.len()));
    report
}
