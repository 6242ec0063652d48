use async_trait::async_trait;
use chrono::Local;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use thiserror::Error;

use summa_core::Money;
use summa_import::aggregate::{self, AggregateError};
use summa_import::normalize;
use summa_import::schema::SchemaError;
use summa_import::CanonicalNameMap;

use crate::assemble::{self, MergeError};
use crate::breakdown;
use crate::render::{RenderEngine, RenderError};
use crate::template::{render, ReportContext, TemplateKind};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("no transactions with positive amounts to report")]
    EmptyDataset,
    #[error(transparent)]
    Aggregate(AggregateError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the submission queue needs from a report builder.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Turns one uploaded spreadsheet into the final merged artifact and
    /// returns its path.
    async fn generate(&self, source: &Path) -> Result<PathBuf, PipelineError>;
}

/// Orchestrates: normalize → aggregate → breakdown → render three sections
/// → assemble. Exactly one report build runs at a time; the queue enforces
/// that by driving this from a single consumer task.
pub struct ReportPipeline<R: RenderEngine> {
    engine: R,
    names: CanonicalNameMap,
    threshold: Decimal,
    title_page: PathBuf,
    output_dir: PathBuf,
}

impl<R: RenderEngine> ReportPipeline<R> {
    pub fn new(
        engine: R,
        names: CanonicalNameMap,
        threshold: Decimal,
        title_page: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            names,
            threshold,
            title_page: title_page.into(),
            output_dir: output_dir.into(),
        }
    }

    async fn run(&self, source: &Path) -> Result<PathBuf, PipelineError> {
        let normalized = normalize::prepare_table(source)?;

        let table = match aggregate::aggregate_file(&normalized, &self.names) {
            Ok(table) => table,
            Err(AggregateError::EmptyDataset) => {
                // Abort with no artifact; the intermediate must not linger.
                let _ = tokio::fs::remove_file(&normalized).await;
                return Err(PipelineError::EmptyDataset);
            }
            Err(err) => return Err(PipelineError::Aggregate(err)),
        };

        let labels: Vec<Option<String>> =
            table.raw_labels.iter().cloned().map(Some).collect();
        let amounts: Vec<Option<Money>> =
            table.raw_amounts.iter().copied().map(Some).collect();
        let breakdown = breakdown::build(&labels, &amounts, self.threshold);

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let stem = artifact_stem(&table.account_name);
        let table_path = self.output_dir.join(format!("{stem}.pdf"));
        let companies_path = self.output_dir.join(format!("companies_{stem}.pdf"));
        let graph_path = self.output_dir.join(format!("graph_{stem}.pdf"));

        let ctx = ReportContext {
            account_name: &table.account_name,
            rows: &table.rows,
            counterparties: &table.counterparties,
            breakdown: &breakdown,
        };
        // The counterparty-list view binds no transaction rows.
        let roster_ctx = ReportContext { rows: &[], ..ctx };

        self.engine
            .render_pdf(&render(TemplateKind::Table, &ctx), &table_path)
            .await?;
        self.engine
            .render_pdf(&render(TemplateKind::CounterpartyList, &roster_ctx), &companies_path)
            .await?;
        self.engine
            .render_pdf(&render(TemplateKind::Graph, &ctx), &graph_path)
            .await?;

        let artifact =
            assemble::merge_sections(&self.title_page, &table_path, &companies_path, &graph_path)?;

        tokio::fs::remove_file(&normalized).await?;
        Ok(artifact)
    }
}

#[async_trait]
impl<R: RenderEngine> ReportGenerator for ReportPipeline<R> {
    async fn generate(&self, source: &Path) -> Result<PathBuf, PipelineError> {
        self.run(source).await
    }
}

fn artifact_stem(account_name: &str) -> String {
    let date = Local::now().format("%Y%m%d");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    sanitize_filename(&format!("Report_{account_name}_{date}_{}", &suffix[..5]))
}

/// Replaces characters the filesystem may reject with underscores.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}
