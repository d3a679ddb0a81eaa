pub mod core;
pub mod export;
pub mod generators;
pub mod images;
pub mod models;

// Re-export commonly used types
pub use crate::core::{ExportError, ExportResult, ImageError, LayoutConfig};
pub use export::{Artifact, ExportBundle, ReportExporter};
pub use generators::{DocxGenerator, PdfGenerator};
pub use images::{HttpFetcher, ImageFetcher, ImageMaterializer, ResolvedImage};
pub use models::{FeedbackEntry, ParticipationData, ReportModel, ReportRequest};
