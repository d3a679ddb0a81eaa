//! Export orchestrator: one report model in, two named artifacts out.

use std::sync::Arc;

use crate::core::{ExportError, ExportResult, LayoutConfig};
use crate::generators::{DocxGenerator, PdfGenerator};
use crate::images::{ImageFetcher, ImageMaterializer};
use crate::models::ReportModel;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// One downloadable output, ready for the delivery collaborator.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub docx: Artifact,
    pub pdf: Artifact,
}

/// Drives both generators from one report model.
pub struct ReportExporter {
    materializer: ImageMaterializer,
    config: LayoutConfig,
}

impl ReportExporter {
    pub fn new() -> Self {
        ReportExporter {
            materializer: ImageMaterializer::new(),
            config: LayoutConfig::default(),
        }
    }

    /// Inject a fetcher, e.g. a stub in tests.
    pub fn with_fetcher(fetcher: Arc<dyn ImageFetcher>) -> Self {
        ReportExporter {
            materializer: ImageMaterializer::with_fetcher(fetcher),
            config: LayoutConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs materialization exactly once, then both generators concurrently
    /// over the shared read-only image slice. A failure in either stage
    /// fails the whole export; there is no silent partial success.
    pub async fn export(&self, model: &ReportModel) -> ExportResult<ExportBundle> {
        model.validate()?;

        tracing::info!(
            title = %model.title,
            images = model.images.len(),
            "starting report export"
        );

        let resolved = Arc::new(self.materializer.materialize(&model.images).await?);

        // Generation is CPU-bound; run it off the async runtime.
        let docx_model = model.clone();
        let docx_images = Arc::clone(&resolved);
        let docx_task = tokio::task::spawn_blocking(move || {
            DocxGenerator::new().generate(&docx_model, &docx_images)
        });

        let pdf_model = model.clone();
        let pdf_images = Arc::clone(&resolved);
        let pdf_config = self.config.clone();
        let pdf_task = tokio::task::spawn_blocking(move || {
            PdfGenerator::with_config(pdf_config).generate(&pdf_model, &pdf_images)
        });

        let (docx_joined, pdf_joined) = tokio::try_join!(docx_task, pdf_task)
            .map_err(|e| ExportError::Orchestration(format!("generator task failed: {}", e)))?;
        let docx_bytes = docx_joined?;
        let pdf_bytes = pdf_joined?;

        let stem = model.file_stem();
        tracing::info!(
            docx_bytes = docx_bytes.len(),
            pdf_bytes = pdf_bytes.len(),
            "report export finished"
        );

        Ok(ExportBundle {
            docx: Artifact {
                filename: format!("{}.docx", stem),
                content_type: DOCX_CONTENT_TYPE,
                bytes: docx_bytes,
            },
            pdf: Artifact {
                filename: format!("{}.pdf", stem),
                content_type: PDF_CONTENT_TYPE,
                bytes: pdf_bytes,
            },
        })
    }
}

impl Default for ReportExporter {
    fn default() -> Self {
        Self::new()
    }
}
