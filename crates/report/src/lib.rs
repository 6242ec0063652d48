pub mod assemble;
pub mod breakdown;
pub mod pipeline;
pub mod render;
pub mod template;

#[cfg(test)]
pub(crate) mod test_support;

pub use breakdown::{Breakdown, CategoryShare};
pub use pipeline::{PipelineError, ReportGenerator, ReportPipeline};
pub use render::{ChromiumRenderer, MockRenderEngine, RenderEngine, RenderError};
pub use template::{ReportContext, TemplateError, TemplateKind};
