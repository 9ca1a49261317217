//! Page registration pipeline.
//!
//! Compose the query, run it once, then turn every page of the result into a
//! template and a route. Query-level failures abort before anything is
//! registered. Per-page failures skip the page, or fail the build in strict
//! mode, again before anything is registered.

use crate::fragment::{BaseSelection, CombinedQuery, compose};
use crate::template::{Template, TemplateBuilder, TemplateCatalog};
use flow_pages_client::ContentQueryClient;
use flow_pages_core::{
    ContentPage, Error, PageRoute, ProjectConfig, Result, RouteName, RouteNames, RouteTable,
    WidgetRegistry,
};
use flow_pages_validator::{page_entries, parse_page};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Where the pipeline is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    QueryIssued,
    QueryResolved,
    IteratingPages,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RegistrarOptions {
    pub base_template: String,
    pub selection: BaseSelection,
    /// Build templates on the rayon pool
    pub parallel: bool,
    /// Fail the build on the first per-page error
    pub strict: bool,
}

impl RegistrarOptions {
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            base_template: config.site.base_template.clone(),
            selection: BaseSelection::from_config(&config.source),
            parallel: config.build.parallel,
            strict: config.build.strict,
        }
    }
}

impl Default for RegistrarOptions {
    fn default() -> Self {
        Self {
            base_template: "templates/Page".to_string(),
            selection: BaseSelection::default(),
            parallel: false,
            strict: false,
        }
    }
}

/// A page entry that did not get a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPage {
    /// Position of the entry in the query result
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub routes: usize,
    pub templates: usize,
    pub reused_templates: usize,
    pub null_entries: usize,
    pub skipped: Vec<SkippedPage>,
}

#[derive(Debug)]
pub struct BuildOutput {
    pub report: BuildReport,
    pub catalog: TemplateCatalog,
}

pub struct PageRegistrar<'a> {
    registry: &'a WidgetRegistry,
    options: RegistrarOptions,
    stage: Stage,
}

impl<'a> PageRegistrar<'a> {
    pub fn new(registry: &'a WidgetRegistry, options: RegistrarOptions) -> Self {
        Self {
            registry,
            options,
            stage: Stage::Init,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The combined query this registrar issues
    pub fn query(&self) -> CombinedQuery {
        compose(self.registry, &self.options.selection)
    }

    /// Run the whole pipeline, registering one route per valid page.
    pub async fn run<C, T>(&mut self, client: &C, table: &mut T) -> Result<BuildOutput>
    where
        C: ContentQueryClient + ?Sized,
        T: RouteTable,
    {
        let query = self.query();
        debug!(document = %query, "page query");

        self.stage = Stage::QueryIssued;
        let selection = &self.options.selection;
        let entries = match client
            .execute(query.document())
            .await
            .and_then(|response| page_entries(response, &selection.source, &selection.collection))
        {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "page query failed");
                self.stage = Stage::Failed;
                return Err(e);
            }
        };

        self.stage = Stage::QueryResolved;
        info!(entries = entries.len(), "page query resolved");

        self.stage = Stage::IteratingPages;
        match self.register_pages(entries, table) {
            Ok(output) => {
                self.stage = Stage::Done;
                info!(
                    routes = output.report.routes,
                    templates = output.report.templates,
                    skipped = output.report.skipped.len(),
                    "pages registered"
                );
                Ok(output)
            }
            Err(e) => {
                error!(error = %e, "page registration failed");
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    fn register_pages<T: RouteTable>(
        &self,
        entries: Vec<Option<Value>>,
        table: &mut T,
    ) -> Result<BuildOutput> {
        let mut report = BuildReport::default();
        let mut failures: Vec<(usize, Error)> = Vec::new();
        let mut paths = HashSet::new();
        let mut prepared: Vec<(usize, ContentPage)> = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let Some(value) = entry else {
                debug!(index, "skipping null page entry");
                report.null_entries += 1;
                continue;
            };

            let page = match parse_page(&value) {
                Ok(page) => page,
                Err(e) => {
                    failures.push((index, e));
                    continue;
                }
            };

            if !paths.insert(page.route_path.clone()) {
                failures.push((
                    index,
                    Error::DuplicateRoute {
                        path: page.route_path.clone(),
                        page: page.label(),
                    },
                ));
                continue;
            }

            debug!(page = %page.label(), "creating page");
            prepared.push((index, page));
        }

        // Route names are claimed only by pages that survive this phase.
        let builder = TemplateBuilder::new(self.registry, &self.options.base_template);
        let build =
            |page: &ContentPage| builder.build(&RouteName::from_path(&page.route_path), page);
        let built: Vec<Result<Template>> = if self.options.parallel {
            prepared.par_iter().map(|(_, page)| build(page)).collect()
        } else {
            prepared.iter().map(|(_, page)| build(page)).collect()
        };

        let mut ready = Vec::with_capacity(prepared.len());
        for ((index, page), template) in prepared.into_iter().zip(built) {
            match template {
                Ok(template) => ready.push((page, template)),
                Err(e) => failures.push((index, e)),
            }
        }

        failures.sort_by_key(|(index, _)| *index);
        if self.options.strict && !failures.is_empty() {
            let (_, e) = failures.remove(0);
            return Err(e);
        }
        for (index, e) in failures {
            warn!(index, error = %e, "skipping page");
            report.skipped.push(SkippedPage {
                index,
                reason: e.to_string(),
            });
        }

        let mut names = RouteNames::new();
        let mut catalog = TemplateCatalog::new();
        for (page, mut template) in ready {
            let name = names.claim(&page.route_path);
            template.name = name.as_str().to_string();
            let (template_ref, reused) = catalog.insert(name.template_ref(), template)?;
            if reused {
                debug!(page = %page.label(), template = %template_ref, "reusing template");
                report.reused_templates += 1;
            }
            table.register(PageRoute::for_page(&page, template_ref))?;
            report.routes += 1;
        }
        report.templates = catalog.len();

        Ok(BuildOutput { report, catalog })
    }
}
