//! Per-page templates.
//!
//! A template is data: the base page shell plus the renderers for exactly
//! the widget types a page uses. Pages with the same composition share one
//! template through [`TemplateCatalog`].

use flow_pages_core::{
    ContentPage, Error, RendererRef, Result, RouteName, TemplateRef, WidgetRegistry,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Hex digits of the composition digest kept in the fingerprint
const FINGERPRINT_LEN: usize = 16;

/// One renderer a template pulls in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateImport {
    pub widget_type: String,
    pub renderer: RendererRef,
}

/// Rendering template for one widget composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    /// Name of the page the template was first built for
    pub name: String,
    pub base: String,
    /// Distinct renderers in order of first appearance on the page
    pub imports: Vec<TemplateImport>,
    /// Index into `imports` for each widget instance, in page order
    pub slots: Vec<usize>,
    pub fingerprint: String,
}

/// Builds templates against a read-only widget registry.
#[derive(Debug, Clone, Copy)]
pub struct TemplateBuilder<'a> {
    registry: &'a WidgetRegistry,
    base: &'a str,
}

impl<'a> TemplateBuilder<'a> {
    pub fn new(registry: &'a WidgetRegistry, base: &'a str) -> Self {
        Self { registry, base }
    }

    /// Build the template for `page`.
    ///
    /// Fails with [`Error::TemplateBuild`] if any widget on the page has a
    /// type missing from the registry.
    pub fn build(&self, page_name: &RouteName, page: &ContentPage) -> Result<Template> {
        let mut imports: Vec<TemplateImport> = Vec::new();
        let mut slots = Vec::with_capacity(page.widgets.len());

        for (position, instance) in page.widgets.iter().enumerate() {
            let widget = self
                .registry
                .get(&instance.content_type)
                .ok_or_else(|| Error::TemplateBuild {
                    page: page.label(),
                    reason: format!(
                        "widget #{} has unregistered type '{}'",
                        position, instance.content_type
                    ),
                })?;

            let slot = match imports.iter().position(|i| i.widget_type == widget.name) {
                Some(existing) => existing,
                None => {
                    imports.push(TemplateImport {
                        widget_type: widget.name.clone(),
                        renderer: widget.renderer.clone(),
                    });
                    imports.len() - 1
                }
            };
            slots.push(slot);
        }

        let fingerprint = fingerprint(self.base, &imports, &slots);
        Ok(Template {
            name: page_name.as_str().to_string(),
            base: self.base.to_string(),
            imports,
            slots,
            fingerprint,
        })
    }
}

fn fingerprint(base: &str, imports: &[TemplateImport], slots: &[usize]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    for import in imports {
        hasher.update(b"\n");
        hasher.update(import.widget_type.as_bytes());
        hasher.update(b"=");
        hasher.update(import.renderer.as_str().as_bytes());
    }
    hasher.update(b"\n");
    for slot in slots {
        hasher.update(slot.to_string().as_bytes());
        hasher.update(b",");
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}

/// Templates emitted by a build, keyed by module name.
#[derive(Debug, Default)]
pub struct TemplateCatalog {
    templates: Vec<(TemplateRef, Template)>,
    by_fingerprint: HashMap<String, usize>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template under `template_ref`, or select an equivalent one.
    ///
    /// Returns the reference the page should use and whether an existing
    /// template was reused. A reference already holding a different
    /// composition is refused.
    pub fn insert(
        &mut self,
        template_ref: TemplateRef,
        template: Template,
    ) -> Result<(TemplateRef, bool)> {
        if let Some(&index) = self.by_fingerprint.get(&template.fingerprint) {
            return Ok((self.templates[index].0.clone(), true));
        }
        if self.get(&template_ref).is_some() {
            return Err(Error::TemplateBuild {
                page: template.name,
                reason: format!(
                    "template module '{}' already holds a different composition",
                    template_ref
                ),
            });
        }

        self.by_fingerprint
            .insert(template.fingerprint.clone(), self.templates.len());
        self.templates.push((template_ref.clone(), template));
        Ok((template_ref, false))
    }

    pub fn get(&self, template_ref: &TemplateRef) -> Option<&Template> {
        self.templates
            .iter()
            .find(|(r, _)| r == template_ref)
            .map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TemplateRef, &Template)> {
        self.templates.iter().map(|(r, t)| (r, t))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
