/// Layout geometry for the paginated (PDF) artifact.
///
/// All distances are in millimetres, measured from the top-left corner of an
/// A4 page. The conversion to PDF coordinate space (origin bottom-left)
/// happens only at render time.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    /// Left margin shared by every line and image.
    pub margin_left: f32,
    /// Cursor position at the top of a fresh page.
    pub page_top: f32,
    /// No content may extend past this line; crossing it forces a page break.
    pub page_bottom: f32,
    pub line_height: f32,
    pub title_font_size: f32,
    pub body_font_size: f32,
    /// Placed size of a successfully materialized image.
    pub image_width: f32,
    pub image_height: f32,
    /// Gap left below an image before the next element.
    pub image_gap: f32,
    /// Vertical advance after an "Error loading image." placeholder line.
    pub placeholder_advance: f32,
    /// Column width the learning-outcomes text is wrapped to.
    pub wrap_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            page_width: 210.0,
            page_height: 297.0,
            margin_left: 14.0,
            page_top: 20.0,
            page_bottom: 280.0,
            line_height: 6.0,
            title_font_size: 18.0,
            body_font_size: 12.0,
            image_width: 80.0,
            image_height: 50.0,
            image_gap: 10.0,
            placeholder_advance: 10.0,
            wrap_width: 180.0,
        }
    }
}

impl LayoutConfig {
    pub fn builder() -> LayoutConfigBuilder {
        LayoutConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct LayoutConfigBuilder {
    page_bottom: Option<f32>,
    page_top: Option<f32>,
    line_height: Option<f32>,
    image_width: Option<f32>,
    image_height: Option<f32>,
    wrap_width: Option<f32>,
}

impl LayoutConfigBuilder {
    pub fn page_bottom(mut self, y: f32) -> Self {
        self.page_bottom = Some(y);
        self
    }

    pub fn page_top(mut self, y: f32) -> Self {
        self.page_top = Some(y);
        self
    }

    pub fn line_height(mut self, h: f32) -> Self {
        self.line_height = Some(h);
        self
    }

    pub fn image_size(mut self, width: f32, height: f32) -> Self {
        self.image_width = Some(width);
        self.image_height = Some(height);
        self
    }

    pub fn wrap_width(mut self, w: f32) -> Self {
        self.wrap_width = Some(w);
        self
    }

    pub fn build(self) -> LayoutConfig {
        let default = LayoutConfig::default();
        LayoutConfig {
            page_bottom: self.page_bottom.unwrap_or(default.page_bottom),
            page_top: self.page_top.unwrap_or(default.page_top),
            line_height: self.line_height.unwrap_or(default.line_height),
            image_width: self.image_width.unwrap_or(default.image_width),
            image_height: self.image_height.unwrap_or(default.image_height),
            wrap_width: self.wrap_width.unwrap_or(default.wrap_width),
            ..default
        }
    }
}
