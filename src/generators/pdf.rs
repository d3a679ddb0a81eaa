//! Paginated document generator (PDF).
//!
//! Simulates a flow layout on a format with no native reflow. The layout
//! step is a pure function from the report model to a list of pages holding
//! absolutely positioned elements, threading an explicit page cursor instead
//! of hidden mutable state; rendering walks that list with printpdf.
//!
//! Coordinates in the layout are millimetres from the top-left of an A4
//! page. Conversion to PDF space (origin bottom-left) happens only in
//! `render`.

use printpdf::{image_crate, BuiltinFont, Image, ImageTransform, Mm, PdfDocument, PdfLayerReference};

use crate::core::{ExportError, ExportResult, LayoutConfig};
use crate::images::ResolvedImage;
use crate::models::ReportModel;

use super::{
    ACADEMIC_YEAR_LINE, DEPARTMENT_LINE, FEEDBACK_HEADING, IMAGE_PLACEHOLDER, NO_IMAGES_LINE,
    OBJECTIVES_HEADING, OUTCOMES_HEADING, REPORT_TITLE, SNAPSHOTS_HEADING,
};

const PT_TO_MM: f32 = 0.352_778;
const MM_PER_INCH: f32 = 25.4;
const RENDER_DPI: f32 = 300.0;

/// An absolutely positioned element. `y` is the distance from the page top.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacedElement {
    Text {
        x: f32,
        y: f32,
        font_size: f32,
        content: String,
    },
    /// `index` addresses the shared resolved-image slice.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        index: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<PlacedElement>,
}

/// Vertical cursor threaded through every section of the layout.
///
/// Policy: before emitting any line or block, if it would extend past
/// `page_bottom`, a new page is started first. The upstream implementation
/// skipped this check in the header and objectives sections; applying it
/// uniformly is a deliberate generalization (see DESIGN.md).
struct PageCursor<'a> {
    cfg: &'a LayoutConfig,
    done: Vec<Page>,
    current: Page,
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn new(cfg: &'a LayoutConfig) -> Self {
        PageCursor {
            cfg,
            done: Vec::new(),
            current: Page::default(),
            y: cfg.page_top,
        }
    }

    fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    /// Start a new page first if `height` would not fit above the bottom
    /// margin.
    fn ensure_room(&mut self, height: f32) {
        if self.y + height > self.cfg.page_bottom {
            self.done.push(std::mem::take(&mut self.current));
            self.y = self.cfg.page_top;
        }
    }

    fn text(&mut self, content: impl Into<String>, font_size: f32) {
        self.ensure_room(self.cfg.line_height);
        self.current.elements.push(PlacedElement::Text {
            x: self.cfg.margin_left,
            y: self.y,
            font_size,
            content: content.into(),
        });
    }

    /// Body-size text line followed by a standard line advance.
    fn line(&mut self, content: impl Into<String>) {
        self.text(content, self.cfg.body_font_size);
        self.advance(self.cfg.line_height);
    }

    fn image(&mut self, index: usize) {
        self.ensure_room(self.cfg.image_height);
        self.current.elements.push(PlacedElement::Image {
            x: self.cfg.margin_left,
            y: self.y,
            width: self.cfg.image_width,
            height: self.cfg.image_height,
            index,
        });
        self.advance(self.cfg.image_height + self.cfg.image_gap);
    }

    fn finish(mut self) -> Vec<Page> {
        self.done.push(self.current);
        self.done
    }
}

pub struct PdfGenerator {
    config: LayoutConfig,
}

impl PdfGenerator {
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        PdfGenerator { config }
    }

    pub fn generate(
        &self,
        model: &ReportModel,
        resolved: &[ResolvedImage],
    ) -> ExportResult<Vec<u8>> {
        let pages = layout(model, resolved, &self.config);
        render(&model.title, &pages, resolved, &self.config)
    }
}

impl Default for PdfGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure layout step: model -> positioned pages.
pub fn layout(model: &ReportModel, resolved: &[ResolvedImage], cfg: &LayoutConfig) -> Vec<Page> {
    let mut cur = PageCursor::new(cfg);

    // Header block at fixed offsets; it always fits on page one.
    cur.set_y(22.0);
    cur.text(REPORT_TITLE, cfg.title_font_size);
    cur.set_y(30.0);
    cur.line(DEPARTMENT_LINE);
    cur.line(ACADEMIC_YEAR_LINE);
    cur.line(format!("Subject: {}", model.subject_name));
    cur.line(format!("Faculty: {}", model.faculty_name));
    cur.line(format!("Date: {}", model.date_label()));
    cur.line(format!(
        "No. of Students Attended: {}",
        model.attendance_label()
    ));
    cur.set_y(70.0);

    cur.line(OBJECTIVES_HEADING);
    for (i, objective) in model.objectives.iter().enumerate() {
        cur.line(format!("{}. {}", i + 1, objective));
    }

    if resolved.is_empty() {
        cur.text(NO_IMAGES_LINE, cfg.body_font_size);
        cur.advance(cfg.placeholder_advance);
    } else {
        cur.advance(cfg.image_gap);
        cur.line(SNAPSHOTS_HEADING);
        for (index, image) in resolved.iter().enumerate() {
            match image {
                ResolvedImage::Ready { .. } => cur.image(index),
                ResolvedImage::Failed => {
                    // Keep the index visible in sequence; never skip it.
                    cur.text(IMAGE_PLACEHOLDER, cfg.body_font_size);
                    cur.advance(cfg.placeholder_advance);
                }
            }
        }
    }

    // Keep the heading attached to the first few wrapped lines.
    cur.ensure_room(20.0);
    cur.line(OUTCOMES_HEADING);
    for line in wrap_text(&model.learning_outcomes, cfg.wrap_width, cfg.body_font_size) {
        cur.line(line);
    }

    cur.advance(cfg.image_gap);
    cur.line(FEEDBACK_HEADING);
    for entry in &model.feedback {
        cur.line(format!("Roll No: {} - {}", entry.roll_no, entry.expectation));
    }

    cur.finish()
}

/// Greedy word wrap against an estimated average Helvetica advance width.
pub fn wrap_text(text: &str, max_width_mm: f32, font_size: f32) -> Vec<String> {
    let char_width = font_size * 0.5 * PT_TO_MM;
    let max_chars = ((max_width_mm / char_width).max(1.0)) as usize;

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            for piece in split_long_word(word, max_chars) {
                if current.is_empty() {
                    current = piece;
                } else if current.chars().count() + 1 + piece.chars().count() <= max_chars {
                    current.push(' ');
                    current.push_str(&piece);
                } else {
                    lines.push(std::mem::take(&mut current));
                    current = piece;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

fn split_long_word(word: &str, max_chars: usize) -> Vec<String> {
    if word.chars().count() <= max_chars {
        return vec![word.to_string()];
    }
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect())
        .collect()
}

fn render(
    title: &str,
    pages: &[Page],
    resolved: &[ResolvedImage],
    cfg: &LayoutConfig,
) -> ExportResult<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(cfg.page_width.into()),
        Mm(cfg.page_height.into()),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::generation("pdf", e))?;

    let mut page_refs = vec![(first_page, first_layer)];
    for _ in 1..pages.len() {
        page_refs.push(doc.add_page(
            Mm(cfg.page_width.into()),
            Mm(cfg.page_height.into()),
            "Layer 1",
        ));
    }

    for (page, (page_idx, layer_idx)) in pages.iter().zip(page_refs) {
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        for element in &page.elements {
            match element {
                PlacedElement::Text {
                    x,
                    y,
                    font_size,
                    content,
                } => {
                    layer.use_text(
                        content.clone(),
                        (*font_size).into(),
                        Mm((*x).into()),
                        Mm((cfg.page_height - y).into()),
                        &font,
                    );
                }
                PlacedElement::Image {
                    x,
                    y,
                    width,
                    height,
                    index,
                } => {
                    if let Some(ResolvedImage::Ready { bytes, .. }) = resolved.get(*index) {
                        place_image(
                            &layer,
                            bytes,
                            *x,
                            cfg.page_height - y - height,
                            *width,
                            *height,
                        )?;
                    }
                }
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| ExportError::generation("pdf", e))
}

/// Decode and place one image scaled to exactly `width` x `height` mm.
///
/// Decoding goes through printpdf's bundled image crate so the raster type
/// matches what `Image::from_dynamic_image` expects; the materializer has
/// already verified the bytes and normalized exotic formats to PNG.
fn place_image(
    layer: &PdfLayerReference,
    bytes: &[u8],
    x_mm: f32,
    y_mm: f32,
    width_mm: f32,
    height_mm: f32,
) -> ExportResult<()> {
    let decoded = image_crate::load_from_memory(bytes)
        .map_err(|e| ExportError::generation("pdf", e))?;
    let rgb = image_crate::DynamicImage::ImageRgb8(decoded.to_rgb8());
    let image = Image::from_dynamic_image(&rgb);

    let px_width = image.image.width.0 as f32;
    let px_height = image.image.height.0 as f32;
    let natural_width_mm = px_width * MM_PER_INCH / RENDER_DPI;
    let natural_height_mm = px_height * MM_PER_INCH / RENDER_DPI;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x_mm.into())),
            translate_y: Some(Mm(y_mm.into())),
            scale_x: Some((width_mm / natural_width_mm).into()),
            scale_y: Some((height_mm / natural_height_mm).into()),
            dpi: Some(RENDER_DPI.into()),
            ..Default::default()
        },
    );

    Ok(())
}
