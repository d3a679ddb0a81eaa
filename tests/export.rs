//! End-to-end export tests with a stubbed image store.

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::png::PngEncoder;
use image::ImageEncoder;

use report_generator::{
    ExportError, ImageError, ImageFetcher, ReportExporter, ReportModel, ReportRequest,
};

/// Serves a valid PNG for `valid` references, errors otherwise. Counts
/// fetches so tests can assert materialization runs exactly once per URL.
struct StubFetcher {
    fetches: AtomicUsize,
}

impl StubFetcher {
    fn new() -> Self {
        StubFetcher {
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if url.contains("valid") {
            Ok(png_fixture())
        } else {
            Err(ImageError::Reference(url.to_string()))
        }
    }
}

fn png_fixture() -> Vec<u8> {
    let rgb = image::RgbImage::from_pixel(8, 8, image::Rgb([120, 80, 40]));
    let mut bytes = Vec::new();
    PngEncoder::new(Cursor::new(&mut bytes))
        .write_image(rgb.as_raw(), 8, 8, image::ColorType::Rgb8)
        .unwrap();
    bytes
}

fn scenario_request() -> ReportRequest {
    serde_json::from_str(
        r#"{
            "title": "Intro to OS",
            "subjectName": "Operating Systems",
            "facultyName": "A. Kulkarni",
            "date": "2024-03-15",
            "objectives": ["Obj1", "Obj2"],
            "learningOutcomes": "Scheduling basics and context switches.",
            "participationData": {"totalStudents": 60, "materialProvided": 55, "participated": 48},
            "feedback": [{"rollNo": "101", "expectation": "Good"}],
            "images": ["https://img.example/valid.png", "https://img.example/broken.png"]
        }"#,
    )
    .unwrap()
}

fn document_xml(docx_bytes: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx_bytes.to_vec())).unwrap();
    let mut file = archive.by_name("word/document.xml").unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn end_to_end_scenario_produces_both_artifacts() {
    let fetcher = Arc::new(StubFetcher::new());
    let exporter = ReportExporter::with_fetcher(fetcher.clone());
    let model = ReportModel::from_request(scenario_request()).unwrap();

    let bundle = exporter.export(&model).await.unwrap();

    // Filenames derive from the title with whitespace collapsed.
    assert_eq!(bundle.docx.filename, "Intro_to_OS.docx");
    assert_eq!(bundle.pdf.filename, "Intro_to_OS.pdf");
    assert_eq!(bundle.pdf.content_type, "application/pdf");

    // Materialization ran once: two references, two fetches total.
    assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);

    // Flow artifact: two objective paragraphs, one embedded image, one
    // placeholder, a feedback heading but no itemized rows.
    let doc = document_xml(&bundle.docx.bytes);
    assert!(doc.contains("Obj1"));
    assert!(doc.contains("Obj2"));
    assert_eq!(doc.matches("<w:drawing>").count(), 1);
    assert_eq!(doc.matches("Error loading image.").count(), 1);
    assert!(doc.contains("Student Feedback Analysis:"));
    assert!(!doc.contains("Roll No: 101"));

    // Paginated artifact is a PDF.
    assert!(bundle.pdf.bytes.starts_with(b"%PDF"));
    assert!(!bundle.pdf.bytes.is_empty());
}

#[tokio::test]
async fn docx_output_is_byte_identical_across_runs() {
    let exporter = ReportExporter::with_fetcher(Arc::new(StubFetcher::new()));
    let model = ReportModel::from_request(scenario_request()).unwrap();

    let first = exporter.export(&model).await.unwrap();
    let second = exporter.export(&model).await.unwrap();

    // The PDF container carries a creation timestamp, so idempotence is
    // asserted on the flow artifact here and on the PDF layout in unit
    // tests.
    assert_eq!(first.docx.bytes, second.docx.bytes);
    assert_eq!(first.docx.filename, second.docx.filename);
    assert_eq!(first.pdf.filename, second.pdf.filename);
}

#[tokio::test]
async fn export_without_images_still_succeeds() {
    let mut request = scenario_request();
    request.images.clear();
    let model = ReportModel::from_request(request).unwrap();

    let exporter = ReportExporter::with_fetcher(Arc::new(StubFetcher::new()));
    let bundle = exporter.export(&model).await.unwrap();

    let doc = document_xml(&bundle.docx.bytes);
    assert_eq!(doc.matches("<w:drawing>").count(), 0);
    assert!(bundle.pdf.bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn all_failed_images_degrade_to_placeholders() {
    let mut request = scenario_request();
    request.images = vec![
        "https://img.example/broken1".to_string(),
        "https://img.example/broken2".to_string(),
    ];
    let model = ReportModel::from_request(request).unwrap();

    let exporter = ReportExporter::with_fetcher(Arc::new(StubFetcher::new()));
    let bundle = exporter.export(&model).await.unwrap();

    let doc = document_xml(&bundle.docx.bytes);
    assert_eq!(doc.matches("Error loading image.").count(), 2);
    assert_eq!(doc.matches("<w:drawing>").count(), 0);
}

#[tokio::test]
async fn invalid_model_fails_before_generation() {
    let mut request = scenario_request();
    request.title = "  ".to_string();
    let err = ReportModel::from_request(request).unwrap_err();
    assert!(matches!(err, ExportError::Validation(_)));
}
