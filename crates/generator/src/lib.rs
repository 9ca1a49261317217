// Query composition, per-page templates and route registration

pub mod fragment;
pub mod registrar;
pub mod template;

pub use fragment::{BaseSelection, CombinedQuery, FLOW_PART_FRAGMENT, compose, needed_fragments};
pub use registrar::{BuildOutput, BuildReport, PageRegistrar, RegistrarOptions, SkippedPage, Stage};
pub use template::{Template, TemplateBuilder, TemplateCatalog, TemplateImport};
