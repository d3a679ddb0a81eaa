//! Flow document generator (DOCX).
//!
//! Emits an ordered list of block elements and packages them as a minimal
//! WordprocessingML archive. There is no manual positioning here; the
//! consumer's word processor reflows everything.

use std::io::{Cursor, Write};

use image::ImageFormat;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::{ExportError, ExportResult};
use crate::images::ResolvedImage;
use crate::models::ReportModel;

use super::{
    DEPARTMENT_LINE, FEEDBACK_HEADING, IMAGE_PLACEHOLDER, INSTITUTE_LINE, OBJECTIVES_HEADING,
    OUTCOMES_HEADING, SNAPSHOTS_HEADING,
};

/// Inline image extent in the flow document, in pixels.
const IMAGE_WIDTH_PX: i64 = 100;
const IMAGE_HEIGHT_PX: i64 = 50;
/// 1 pixel at 96 dpi = 9525 EMU.
const EMU_PER_PX: i64 = 9525;

mod namespaces {
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    pub const WP: &str =
        "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
    pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    pub const RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
    pub const CONTENT_TYPES: &str =
        "http://schemas.openxmlformats.org/package/2006/content-types";
}

mod relationship_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
}

/// One block element of the flow document, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowBlock {
    Title(String),
    Heading(String),
    BoldParagraph(String),
    Paragraph(String),
    /// Inline image; `index` addresses the shared resolved-image slice.
    Image { index: usize },
    Spacer,
}

pub struct DocxGenerator;

impl DocxGenerator {
    pub fn new() -> Self {
        DocxGenerator
    }

    pub fn generate(
        &self,
        model: &ReportModel,
        resolved: &[ResolvedImage],
    ) -> ExportResult<Vec<u8>> {
        let blocks = build_blocks(model, resolved);
        package(&blocks, resolved)
    }
}

impl Default for DocxGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure assembly step: model -> ordered block list.
///
/// Image positions mirror the input reference list one-to-one; a failed
/// index contributes a placeholder paragraph, never a gap. Feedback rows are
/// intentionally not enumerated in this format (the paginated artifact lists
/// them) — documented upstream asymmetry.
pub fn build_blocks(model: &ReportModel, resolved: &[ResolvedImage]) -> Vec<FlowBlock> {
    let mut blocks = Vec::new();

    blocks.push(FlowBlock::Title(INSTITUTE_LINE.to_string()));
    blocks.push(FlowBlock::BoldParagraph(DEPARTMENT_LINE.to_string()));
    blocks.push(FlowBlock::Paragraph(format!(
        "Subject: {}",
        model.subject_name
    )));
    blocks.push(FlowBlock::Paragraph(format!(
        "Faculty: {}",
        model.faculty_name
    )));
    blocks.push(FlowBlock::Paragraph(format!("Date: {}", model.date_label())));
    blocks.push(FlowBlock::Paragraph(format!(
        "No. of Students Attended: {}",
        model.attendance_label()
    )));
    blocks.push(FlowBlock::Spacer);

    // Heading is emitted even for an empty objective list.
    blocks.push(FlowBlock::Heading(OBJECTIVES_HEADING.to_string()));
    for objective in &model.objectives {
        blocks.push(FlowBlock::Paragraph(objective.clone()));
    }
    blocks.push(FlowBlock::Spacer);

    blocks.push(FlowBlock::Heading(SNAPSHOTS_HEADING.to_string()));
    for (index, image) in resolved.iter().enumerate() {
        match image {
            ResolvedImage::Ready { .. } => blocks.push(FlowBlock::Image { index }),
            ResolvedImage::Failed => {
                blocks.push(FlowBlock::Paragraph(IMAGE_PLACEHOLDER.to_string()))
            }
        }
    }

    blocks.push(FlowBlock::Heading(OUTCOMES_HEADING.to_string()));
    blocks.push(FlowBlock::Paragraph(model.learning_outcomes.clone()));
    blocks.push(FlowBlock::Heading(FEEDBACK_HEADING.to_string()));

    blocks
}

struct MediaPart {
    rel_id: String,
    filename: String,
    bytes: Vec<u8>,
}

/// Serialize the block list into a DOCX (ZIP) package.
fn package(blocks: &[FlowBlock], resolved: &[ResolvedImage]) -> ExportResult<Vec<u8>> {
    // rId1 is reserved for styles.xml; media parts start at rId2. Only
    // ready images get a media part, keyed by their input index.
    let mut media: Vec<(usize, MediaPart)> = Vec::new();
    for (index, image) in resolved.iter().enumerate() {
        if let ResolvedImage::Ready { bytes, format } = image {
            let n = media.len() + 1;
            media.push((
                index,
                MediaPart {
                    rel_id: format!("rId{}", n + 1),
                    filename: format!("image{}.{}", n, extension_for(*format)),
                    bytes: bytes.clone(),
                },
            ));
        }
    }

    let document_xml = write_document_xml(blocks, &media);
    let styles_xml = write_styles_xml();
    let content_types_xml = write_content_types();
    let root_rels_xml = write_root_rels();
    let document_rels_xml = write_document_rels(&media);

    // Fixed timestamps keep the package byte-identical for identical input.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let err = |e: zip::result::ZipError| ExportError::generation("docx", e);
    let io_err = |e: std::io::Error| ExportError::generation("docx", e);

    zip.start_file("[Content_Types].xml", options).map_err(err)?;
    zip.write_all(content_types_xml.as_bytes()).map_err(io_err)?;

    zip.start_file("_rels/.rels", options).map_err(err)?;
    zip.write_all(root_rels_xml.as_bytes()).map_err(io_err)?;

    zip.start_file("word/document.xml", options).map_err(err)?;
    zip.write_all(document_xml.as_bytes()).map_err(io_err)?;

    zip.start_file("word/styles.xml", options).map_err(err)?;
    zip.write_all(styles_xml.as_bytes()).map_err(io_err)?;

    zip.start_file("word/_rels/document.xml.rels", options)
        .map_err(err)?;
    zip.write_all(document_rels_xml.as_bytes()).map_err(io_err)?;

    for (_, part) in &media {
        zip.start_file(format!("word/media/{}", part.filename), options)
            .map_err(err)?;
        zip.write_all(&part.bytes).map_err(io_err)?;
    }

    let cursor = zip.finish().map_err(err)?;
    Ok(cursor.into_inner())
}

fn write_document_xml(blocks: &[FlowBlock], media: &[(usize, MediaPart)]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<w:document xmlns:w="{}" xmlns:r="{}" xmlns:wp="{}" xmlns:a="{}">"#,
        namespaces::W,
        namespaces::R,
        namespaces::WP,
        namespaces::A,
    ));
    xml.push_str("<w:body>");

    for block in blocks {
        match block {
            FlowBlock::Title(text) => write_styled_paragraph(&mut xml, "Title", text),
            FlowBlock::Heading(text) => write_styled_paragraph(&mut xml, "Heading1", text),
            FlowBlock::BoldParagraph(text) => {
                xml.push_str("<w:p><w:r><w:rPr><w:b/></w:rPr>");
                write_text_element(&mut xml, text);
                xml.push_str("</w:r></w:p>");
            }
            FlowBlock::Paragraph(text) => {
                xml.push_str("<w:p><w:r>");
                write_text_element(&mut xml, text);
                xml.push_str("</w:r></w:p>");
            }
            FlowBlock::Image { index } => {
                if let Some((n, part)) = media
                    .iter()
                    .enumerate()
                    .find(|(_, (i, _))| i == index)
                    .map(|(n, (_, part))| (n, part))
                {
                    xml.push_str("<w:p><w:r>");
                    xml.push_str(&inline_drawing(
                        &part.rel_id,
                        n as i64 + 1,
                        &part.filename,
                        IMAGE_WIDTH_PX * EMU_PER_PX,
                        IMAGE_HEIGHT_PX * EMU_PER_PX,
                    ));
                    xml.push_str("</w:r></w:p>");
                }
            }
            FlowBlock::Spacer => xml.push_str("<w:p/>"),
        }
    }

    xml.push_str("</w:body>");
    xml.push_str("</w:document>");
    xml
}

fn write_styled_paragraph(xml: &mut String, style: &str, text: &str) {
    xml.push_str(&format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr><w:r>"#,
        style
    ));
    write_text_element(xml, text);
    xml.push_str("</w:r></w:p>");
}

fn write_text_element(xml: &mut String, text: &str) {
    xml.push_str(r#"<w:t xml:space="preserve">"#);
    xml.push_str(&escape_xml(text));
    xml.push_str("</w:t>");
}

/// Inline w:drawing element for an embedded picture.
fn inline_drawing(rel_id: &str, doc_pr_id: i64, name: &str, cx: i64, cy: i64) -> String {
    format!(
        r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/><wp:docPr id="{id}" name="{name}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="{a}" noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic xmlns:a="{a}"><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#,
        cx = cx,
        cy = cy,
        id = doc_pr_id,
        name = escape_xml(name),
        rel = rel_id,
        a = namespaces::A,
    )
}

fn write_styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{w}"><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:rPr><w:b/><w:sz w:val="56"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style></w:styles>"#,
        w = namespaces::W,
    )
}

fn write_content_types() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="{ct}"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Default Extension="gif" ContentType="image/gif"/><Default Extension="bmp" ContentType="image/bmp"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#,
        ct = namespaces::CONTENT_TYPES,
    )
}

fn write_root_rels() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{rels}"><Relationship Id="rId1" Type="{ty}" Target="word/document.xml"/></Relationships>"#,
        rels = namespaces::RELS,
        ty = relationship_types::OFFICE_DOCUMENT,
    )
}

fn write_document_rels(media: &[(usize, MediaPart)]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, namespaces::RELS));
    xml.push_str(&format!(
        r#"<Relationship Id="rId1" Type="{}" Target="styles.xml"/>"#,
        relationship_types::STYLES
    ));
    for (_, part) in media {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="media/{}"/>"#,
            part.rel_id,
            relationship_types::IMAGE,
            part.filename
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Gif => "gif",
        ImageFormat::Bmp => "bmp",
        // The materializer normalizes everything else to PNG.
        _ => "png",
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedbackEntry, ParticipationData};
    use std::io::Read;

    fn model() -> ReportModel {
        ReportModel {
            title: "Intro to OS".to_string(),
            subject_name: "Operating Systems".to_string(),
            faculty_name: "A. Kulkarni".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            objectives: vec!["Obj1".to_string(), "Obj2".to_string()],
            learning_outcomes: "Scheduling basics".to_string(),
            participation: ParticipationData {
                total_students: 60,
                material_provided: 55,
                participated: 48,
            },
            feedback: vec![FeedbackEntry {
                roll_no: "101".to_string(),
                expectation: "Good".to_string(),
            }],
            images: vec![],
        }
    }

    fn ready_image() -> ResolvedImage {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder;

        let rgb = image::RgbImage::new(4, 4);
        let mut bytes = Vec::new();
        PngEncoder::new(Cursor::new(&mut bytes))
            .write_image(rgb.as_raw(), 4, 4, image::ColorType::Rgb8)
            .unwrap();
        ResolvedImage::Ready {
            bytes,
            format: ImageFormat::Png,
        }
    }

    fn document_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut file = archive.by_name("word/document.xml").unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn paragraphs_between<'a>(
        blocks: &'a [FlowBlock],
        heading: &str,
    ) -> Vec<&'a FlowBlock> {
        let start = blocks
            .iter()
            .position(|b| matches!(b, FlowBlock::Heading(h) if h == heading))
            .unwrap();
        blocks[start + 1..]
            .iter()
            .take_while(|b| !matches!(b, FlowBlock::Heading(_) | FlowBlock::Spacer))
            .collect()
    }

    #[test]
    fn objectives_become_one_paragraph_each_in_order() {
        let blocks = build_blocks(&model(), &[]);
        let objs = paragraphs_between(&blocks, OBJECTIVES_HEADING);
        assert_eq!(
            objs,
            vec![
                &FlowBlock::Paragraph("Obj1".to_string()),
                &FlowBlock::Paragraph("Obj2".to_string()),
            ]
        );
    }

    #[test]
    fn empty_objectives_still_emit_heading() {
        let mut m = model();
        m.objectives.clear();
        let blocks = build_blocks(&m, &[]);
        assert!(blocks
            .iter()
            .any(|b| matches!(b, FlowBlock::Heading(h) if h == OBJECTIVES_HEADING)));
        assert!(paragraphs_between(&blocks, OBJECTIVES_HEADING).is_empty());
    }

    #[test]
    fn image_sequence_preserves_positions_including_failures() {
        let resolved = vec![ready_image(), ResolvedImage::Failed, ready_image()];
        let blocks = build_blocks(&model(), &resolved);
        let snapshots = paragraphs_between(&blocks, SNAPSHOTS_HEADING);
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0], &FlowBlock::Image { index: 0 });
        assert_eq!(
            snapshots[1],
            &FlowBlock::Paragraph(IMAGE_PLACEHOLDER.to_string())
        );
        assert_eq!(snapshots[2], &FlowBlock::Image { index: 2 });
    }

    #[test]
    fn feedback_heading_is_trailing_with_no_rows() {
        let blocks = build_blocks(&model(), &[]);
        assert_eq!(
            blocks.last(),
            Some(&FlowBlock::Heading(FEEDBACK_HEADING.to_string()))
        );
    }

    #[test]
    fn package_embeds_content_and_media() {
        let resolved = vec![ready_image(), ResolvedImage::Failed];
        let bytes = DocxGenerator::new().generate(&model(), &resolved).unwrap();

        let doc = document_xml(&bytes);
        assert!(doc.contains("Subject: Operating Systems"));
        assert!(doc.contains("No. of Students Attended: 60"));
        assert_eq!(doc.matches("<w:drawing>").count(), 1);
        assert_eq!(doc.matches(IMAGE_PLACEHOLDER).count(), 1);
        // Placeholder follows the successful image, same order as input.
        assert!(doc.find("<w:drawing>").unwrap() < doc.find(IMAGE_PLACEHOLDER).unwrap());

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("word/media/image1.png").is_ok());
        assert!(archive.by_name("word/styles.xml").is_ok());
    }

    #[test]
    fn text_is_escaped_for_the_format_only() {
        let mut m = model();
        m.subject_name = "C & C++ <Systems>".to_string();
        let bytes = DocxGenerator::new().generate(&m, &[]).unwrap();
        let doc = document_xml(&bytes);
        assert!(doc.contains("C &amp; C++ &lt;Systems&gt;"));
    }

    #[test]
    fn identical_input_yields_identical_bytes() {
        let resolved = vec![ready_image()];
        let gen = DocxGenerator::new();
        let first = gen.generate(&model(), &resolved).unwrap();
        let second = gen.generate(&model(), &resolved).unwrap();
        assert_eq!(first, second);
    }
}
