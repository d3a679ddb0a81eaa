use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use report_generator::{ReportExporter, ReportModel, ReportRequest};

/// Reads a report request JSON file and writes both artifacts to `output/`.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: export <report.json>")?;

    let payload = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path))?;
    let request: ReportRequest = serde_json::from_str(&payload).context("parsing report JSON")?;
    let model = ReportModel::from_request(request)?;

    let exporter = ReportExporter::new();
    let bundle = exporter.export(&model).await?;

    let out_dir = PathBuf::from("output");
    tokio::fs::create_dir_all(&out_dir).await?;

    let docx_path = out_dir.join(&bundle.docx.filename);
    tokio::fs::write(&docx_path, &bundle.docx.bytes).await?;
    tracing::info!(path = %docx_path.display(), "wrote flow document");

    let pdf_path = out_dir.join(&bundle.pdf.filename);
    tokio::fs::write(&pdf_path, &bundle.pdf.bytes).await?;
    tracing::info!(path = %pdf_path.display(), "wrote paginated document");

    Ok(())
}
