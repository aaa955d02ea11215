//! Drawing collaborator interface.
//!
//! The render state machine only ever talks to a [`Canvas`]. [`PdfCanvas`]
//! (in [`crate::render`]) writes a real PDF; [`RecordingCanvas`] keeps a
//! [`DrawLog`] instead, which is what the tests inspect.
//!
//! [`PdfCanvas`]: crate::render::PdfCanvas

use std::path::Path;

use crate::draw_log::{DrawLog, DrawOp, PageLog};
use crate::error::CanvasError;
use crate::fonts::FontMetrics;
use crate::position::Point;

/// Document-level metadata handed to the canvas when it is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    /// Number of printed copies requested by the markup. Not interpreted by
    /// the renderer.
    pub copies: u32,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: "Report".to_string(),
            copies: 1,
        }
    }
}

/// A page-oriented drawing surface. Coordinates are PDF points with the
/// origin at the bottom-left of the page.
pub trait Canvas {
    /// What [`Canvas::save`] produces.
    type Output;

    /// Draw `text` with its baseline starting at `at`.
    fn draw_text(&mut self, at: Point, text: &str, face: &str, size: f32) -> Result<(), CanvasError>;

    /// Width of `text` in points. A pure function of its arguments.
    fn measure_text(&self, text: &str, face: &str, size: f32) -> f32;

    fn set_fill_color(&mut self, r: f32, g: f32, b: f32);

    fn set_line_width(&mut self, width: f32);

    /// Stroke the rectangle spanned by two opposite corners.
    fn draw_rect(&mut self, a: Point, b: Point);

    /// As [`Canvas::draw_rect`] with corners rounded to `radius`.
    fn draw_rounded_rect(&mut self, a: Point, b: Point, radius: f32);

    fn draw_line(&mut self, from: Point, to: Point);

    /// Place an image with its lower-left corner at `at`. Missing dimensions
    /// fall back to the image's natural size (one pixel per point).
    fn draw_image(
        &mut self,
        path: &Path,
        at: Point,
        width: Option<f32>,
        height: Option<f32>,
    ) -> Result<(), CanvasError>;

    /// Embed a font file so that `name` can be passed as a face.
    fn register_font(&mut self, name: &str, path: &Path) -> Result<(), CanvasError>;

    /// Finish the current page and start a new, empty one.
    fn show_page(&mut self);

    /// Number of finished pages.
    fn page_count(&self) -> usize;

    fn save(self, info: &DocumentInfo) -> Result<Self::Output, CanvasError>
    where
        Self: Sized;
}

/// A canvas that records every call into a [`DrawLog`].
pub struct RecordingCanvas {
    log: DrawLog,
    current: PageLog,
    metrics: FontMetrics,
}

impl RecordingCanvas {
    pub fn new(page_width_pt: f32, page_height_pt: f32) -> Self {
        Self {
            log: DrawLog::new(page_width_pt, page_height_pt),
            current: PageLog::default(),
            metrics: FontMetrics::default(),
        }
    }

    /// Pages finished so far (the page in progress is not included).
    pub fn log(&self) -> &DrawLog {
        &self.log
    }

    /// Operations recorded on the page in progress.
    pub fn pending_ops(&self) -> &[DrawOp] {
        &self.current.ops
    }

    fn record(&mut self, op: DrawOp) {
        self.current.ops.push(op);
    }
}

impl Canvas for RecordingCanvas {
    type Output = DrawLog;

    fn draw_text(&mut self, at: Point, text: &str, face: &str, size: f32) -> Result<(), CanvasError> {
        self.record(DrawOp::Text {
            x: at.x,
            y: at.y,
            text: text.to_string(),
            font: face.to_string(),
            size,
        });
        Ok(())
    }

    fn measure_text(&self, text: &str, face: &str, size: f32) -> f32 {
        self.metrics.measure(text, face, size)
    }

    fn set_fill_color(&mut self, r: f32, g: f32, b: f32) {
        self.record(DrawOp::FillColor { r, g, b });
    }

    fn set_line_width(&mut self, width: f32) {
        self.record(DrawOp::LineWidth { width });
    }

    fn draw_rect(&mut self, a: Point, b: Point) {
        self.record(DrawOp::Rect {
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
        });
    }

    fn draw_rounded_rect(&mut self, a: Point, b: Point, radius: f32) {
        self.record(DrawOp::RoundedRect {
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
            radius,
        });
    }

    fn draw_line(&mut self, from: Point, to: Point) {
        self.record(DrawOp::Line {
            x1: from.x,
            y1: from.y,
            x2: to.x,
            y2: to.y,
        });
    }

    fn draw_image(
        &mut self,
        path: &Path,
        at: Point,
        width: Option<f32>,
        height: Option<f32>,
    ) -> Result<(), CanvasError> {
        self.record(DrawOp::Image {
            path: path.display().to_string(),
            x: at.x,
            y: at.y,
            width,
            height,
        });
        Ok(())
    }

    fn register_font(&mut self, name: &str, path: &Path) -> Result<(), CanvasError> {
        let bytes = std::fs::read(path)?;
        if let Err(reason) = self.metrics.load(name, bytes) {
            log::debug!("recording canvas keeps default metrics for {name:?}: {reason}");
        }
        self.record(DrawOp::RegisterFont {
            name: name.to_string(),
            path: path.display().to_string(),
        });
        Ok(())
    }

    fn show_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.log.pages.push(page);
    }

    fn page_count(&self) -> usize {
        self.log.pages.len()
    }

    fn save(mut self, info: &DocumentInfo) -> Result<DrawLog, CanvasError> {
        self.log.title = info.title.clone();
        self.log.copies = info.copies;
        Ok(self.log)
    }
}
