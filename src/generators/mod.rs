pub mod docx;
pub mod pdf;

pub use docx::DocxGenerator;
pub use pdf::PdfGenerator;

// Fixed strings shared by both artifacts. Section headings and placeholder
// text must match exactly across formats; the differences (the DOCX-only
// institute line, the PDF-only academic year) are deliberate upstream
// behavior.
pub(crate) const INSTITUTE_LINE: &str = "PUNE INSTITUTE OF COMPUTER TECHNOLOGY";
pub(crate) const DEPARTMENT_LINE: &str = "Department: Information Technology";
pub(crate) const ACADEMIC_YEAR_LINE: &str = "Academic Year: 2023-2024";
pub(crate) const REPORT_TITLE: &str = "Teaching Activity Report";
pub(crate) const OBJECTIVES_HEADING: &str = "Objectives:";
pub(crate) const SNAPSHOTS_HEADING: &str = "Snapshots:";
pub(crate) const OUTCOMES_HEADING: &str = "Learning Outcomes:";
pub(crate) const FEEDBACK_HEADING: &str = "Student Feedback Analysis:";
pub(crate) const IMAGE_PLACEHOLDER: &str = "Error loading image.";
pub(crate) const NO_IMAGES_LINE: &str = "No images uploaded.";
