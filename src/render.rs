//! PDF canvas – draws through `printpdf` (v0.8 ops-based API).
//!
//! Operations accumulate on the page in progress; `show_page` seals it and
//! opens the next one. Base-14 faces are written with WinAnsi encoding;
//! fonts registered from files are embedded.
//!
//! printpdf writes builtin-font text as raw UTF-8, so text outside ASCII is
//! encoded to WinAnsi here and emitted as a hex `Tj` string.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use printpdf::font::ParsedFont;
use printpdf::*;

use crate::canvas::{Canvas, DocumentInfo};
use crate::error::CanvasError;
use crate::fonts::FontMetrics;
use crate::position::Point as Cursor;

const PT_TO_MM: f32 = 0.352778;
/// Bézier handle length for a quarter circle, as a fraction of the radius.
const KAPPA: f32 = 0.552_284_8;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

pub struct PdfCanvas {
    doc: PdfDocument,
    page_width_pt: f32,
    page_height_pt: f32,
    pages: Vec<PdfPage>,
    ops: Vec<Op>,
    fonts: HashMap<String, FontId>,
    metrics: FontMetrics,
    images: HashMap<PathBuf, ImageResource>,
    fill: [f32; 3],
    line_width: f32,
}

impl PdfCanvas {
    pub fn new(title: &str, page_width_pt: f32, page_height_pt: f32) -> Self {
        let mut canvas = Self {
            doc: PdfDocument::new(title),
            page_width_pt,
            page_height_pt,
            pages: Vec::new(),
            ops: Vec::new(),
            fonts: HashMap::new(),
            metrics: FontMetrics::default(),
            images: HashMap::new(),
            fill: [0.0, 0.0, 0.0],
            line_width: 1.0,
        };
        canvas.ops = canvas.page_preamble();
        canvas
    }

    /// Graphics state carried over from the previous page.
    fn page_preamble(&self) -> Vec<Op> {
        vec![
            Op::SetFillColor {
                col: rgb(self.fill),
            },
            Op::SetOutlineColor {
                col: rgb([0.0, 0.0, 0.0]),
            },
            Op::SetOutlineThickness {
                pt: Pt(self.line_width),
            },
        ]
    }

    fn stroke_outline(&mut self, points: Vec<(Cursor, bool)>) {
        self.ops.push(Op::DrawLine {
            line: Line {
                points: points
                    .into_iter()
                    .map(|(p, bezier)| line_point(p, bezier))
                    .collect(),
                is_closed: true,
            },
        });
    }

    fn load_image(&mut self, path: &Path) -> Result<&ImageResource, CanvasError> {
        if !self.images.contains_key(path) {
            let image_err = |reason: String| CanvasError::Image {
                path: path.to_path_buf(),
                reason,
            };
            let bytes = fs::read(path)?;

            // Decode with the `image` crate to obtain pixel dimensions.
            let dyn_img =
                ::image::load_from_memory(&bytes).map_err(|e| image_err(e.to_string()))?;
            let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

            // Register with printpdf as a reusable XObject.
            let mut warnings: Vec<PdfWarnMsg> = Vec::new();
            let raw = RawImage::decode_from_bytes(&bytes, &mut warnings)
                .map_err(|e| image_err(e.to_string()))?;
            let xobj_id = self.doc.add_image(&raw);
            log::debug!("embedded image {} ({px_width}×{px_height})", path.display());

            self.images.insert(
                path.to_path_buf(),
                ImageResource {
                    xobj_id,
                    px_width,
                    px_height,
                },
            );
        }
        self.images
            .get(path)
            .ok_or_else(|| CanvasError::Pdf(format!("image cache lost {}", path.display())))
    }
}

impl Canvas for PdfCanvas {
    type Output = Vec<u8>;

    fn draw_text(&mut self, at: Cursor, text: &str, face: &str, size: f32) -> Result<(), CanvasError> {
        let pos = printpdf::Point {
            x: Pt(at.x),
            y: Pt(at.y),
        };
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor { pos });
        if let Some(font) = builtin_font(face) {
            self.ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(size),
                font,
            });
            if text.is_ascii() {
                self.ops.push(Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(text.to_string())],
                    font,
                });
            } else {
                // Empty write keeps the font in the page resources.
                self.ops.push(Op::WriteTextBuiltinFont {
                    items: Vec::new(),
                    font,
                });
                self.ops.push(Op::Unknown {
                    key: "Tj".to_string(),
                    value: vec![DictItem::String {
                        data: winansi_bytes(text),
                        literal: false,
                    }],
                });
            }
        } else {
            let font = self
                .fonts
                .get(face)
                .cloned()
                .ok_or_else(|| CanvasError::UnknownFont(face.to_string()))?;
            self.ops.push(Op::SetFontSize {
                size: Pt(size),
                font: font.clone(),
            });
            self.ops.push(Op::WriteText {
                items: vec![TextItem::Text(text.to_string())],
                font,
            });
        }
        self.ops.push(Op::EndTextSection);
        Ok(())
    }

    fn measure_text(&self, text: &str, face: &str, size: f32) -> f32 {
        self.metrics.measure(text, face, size)
    }

    fn set_fill_color(&mut self, r: f32, g: f32, b: f32) {
        self.fill = [r, g, b];
        self.ops.push(Op::SetFillColor { col: rgb(self.fill) });
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
        self.ops.push(Op::SetOutlineThickness { pt: Pt(width) });
    }

    fn draw_rect(&mut self, a: Cursor, b: Cursor) {
        let (lo, hi) = normalise(a, b);
        self.stroke_outline(vec![
            (Cursor::new(lo.x, lo.y), false),
            (Cursor::new(hi.x, lo.y), false),
            (Cursor::new(hi.x, hi.y), false),
            (Cursor::new(lo.x, hi.y), false),
        ]);
    }

    fn draw_rounded_rect(&mut self, a: Cursor, b: Cursor, radius: f32) {
        self.stroke_outline(rounded_outline(a, b, radius));
    }

    fn draw_line(&mut self, from: Cursor, to: Cursor) {
        self.ops.push(Op::DrawLine {
            line: Line {
                points: vec![line_point(from, false), line_point(to, false)],
                is_closed: false,
            },
        });
    }

    fn draw_image(
        &mut self,
        path: &Path,
        at: Cursor,
        width: Option<f32>,
        height: Option<f32>,
    ) -> Result<(), CanvasError> {
        let res = self.load_image(path)?;
        // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px_dim.
        let scale = |want: Option<f32>, px: u32| match want {
            Some(pt) if px > 0 => pt / px as f32,
            _ => 1.0,
        };
        let op = Op::UseXobject {
            id: res.xobj_id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(at.x)),
                translate_y: Some(Pt(at.y)),
                dpi: Some(72.0),
                scale_x: Some(scale(width, res.px_width)),
                scale_y: Some(scale(height, res.px_height)),
                rotate: None,
            },
        };
        self.ops.push(op);
        Ok(())
    }

    fn register_font(&mut self, name: &str, path: &Path) -> Result<(), CanvasError> {
        let font_err = |reason: String| CanvasError::Font {
            name: name.to_string(),
            reason,
        };
        let bytes = fs::read(path)?;
        let mut warnings = Vec::new();
        let parsed = ParsedFont::from_bytes(&bytes, 0, &mut warnings)
            .ok_or_else(|| font_err(format!("{} is not a usable font file", path.display())))?;
        self.metrics.load(name, bytes).map_err(font_err)?;
        let id = self.doc.add_font(&parsed);
        self.fonts.insert(name.to_string(), id);
        Ok(())
    }

    fn show_page(&mut self) {
        let preamble = self.page_preamble();
        let ops = std::mem::replace(&mut self.ops, preamble);
        let page = PdfPage::new(
            Mm(self.page_width_pt * PT_TO_MM),
            Mm(self.page_height_pt * PT_TO_MM),
            ops,
        );
        self.pages.push(page);
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save(mut self, info: &DocumentInfo) -> Result<Vec<u8>, CanvasError> {
        // Ensure at least one page.
        if self.pages.is_empty() {
            self.show_page();
        }
        log::debug!(
            "saving {:?}: {} page(s), {} copies",
            info.title,
            self.pages.len(),
            info.copies
        );
        self.doc.with_pages(self.pages);
        // The WinAnsi `Tj` strings are custom operations.
        let options = PdfSaveOptions {
            secure: false,
            ..PdfSaveOptions::default()
        };
        Ok(self.doc.save(&options, &mut Vec::new()))
    }
}

fn rgb(c: [f32; 3]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn line_point(p: Cursor, bezier: bool) -> LinePoint {
    LinePoint {
        p: printpdf::Point {
            x: Pt(p.x),
            y: Pt(p.y),
        },
        bezier,
    }
}

/// Lower-left and upper-right corners of the rectangle spanned by `a`, `b`.
fn normalise(a: Cursor, b: Cursor) -> (Cursor, Cursor) {
    (
        Cursor::new(a.x.min(b.x), a.y.min(b.y)),
        Cursor::new(a.x.max(b.x), a.y.max(b.y)),
    )
}

/// Closed outline of a rounded rectangle, counter-clockwise from the start
/// of the bottom edge. `true` marks a Bézier handle; each corner is one
/// cubic curve.
fn rounded_outline(a: Cursor, b: Cursor, radius: f32) -> Vec<(Cursor, bool)> {
    let (lo, hi) = normalise(a, b);
    let r = radius.min((hi.x - lo.x) / 2.0).min((hi.y - lo.y) / 2.0).max(0.0);
    let k = r * KAPPA;
    let p = |x: f32, y: f32| (Cursor::new(x, y), false);
    let h = |x: f32, y: f32| (Cursor::new(x, y), true);
    vec![
        p(lo.x + r, lo.y),
        p(hi.x - r, lo.y),
        h(hi.x - r + k, lo.y),
        h(hi.x, lo.y + r - k),
        p(hi.x, lo.y + r),
        p(hi.x, hi.y - r),
        h(hi.x, hi.y - r + k),
        h(hi.x - r + k, hi.y),
        p(hi.x - r, hi.y),
        p(lo.x + r, hi.y),
        h(lo.x + r - k, hi.y),
        h(lo.x, hi.y - r + k),
        p(lo.x, hi.y - r),
        p(lo.x, lo.y + r),
        h(lo.x, lo.y + r - k),
        h(lo.x + r - k, lo.y),
        p(lo.x + r, lo.y),
    ]
}

/// Map a base-14 face name to printpdf's builtin font.
fn builtin_font(face: &str) -> Option<BuiltinFont> {
    let font = match face {
        "Courier" => BuiltinFont::Courier,
        "Courier-Bold" => BuiltinFont::CourierBold,
        "Courier-Oblique" => BuiltinFont::CourierOblique,
        "Courier-BoldOblique" => BuiltinFont::CourierBoldOblique,
        "Helvetica" => BuiltinFont::Helvetica,
        "Helvetica-Bold" => BuiltinFont::HelveticaBold,
        "Helvetica-Oblique" => BuiltinFont::HelveticaOblique,
        "Helvetica-BoldOblique" => BuiltinFont::HelveticaBoldOblique,
        "Times-Roman" => BuiltinFont::TimesRoman,
        "Times-Bold" => BuiltinFont::TimesBold,
        "Times-Italic" => BuiltinFont::TimesItalic,
        "Times-BoldItalic" => BuiltinFont::TimesBoldItalic,
        "Symbol" => BuiltinFont::Symbol,
        "ZapfDingbats" => BuiltinFont::ZapfDingbats,
        _ => return None,
    };
    Some(font)
}

/// Encode text as Windows-1252 (WinAnsiEncoding) bytes. Characters with no
/// WinAnsi code become `?`.
fn winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{00A0}' => 0x20,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_pdf(bytes: &[u8]) {
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn save_without_pages_still_writes_one() {
        let canvas = PdfCanvas::new("t", 595.28, 841.89);
        let bytes = canvas.save(&DocumentInfo::default()).unwrap();
        valid_pdf(&bytes);
    }

    #[test]
    fn text_and_shapes_produce_pages() {
        let mut canvas = PdfCanvas::new("t", 595.28, 841.89);
        canvas
            .draw_text(Cursor::new(20.0, 800.0), "Hello", "Helvetica-Bold", 12.0)
            .unwrap();
        canvas.draw_rect(Cursor::new(10.0, 10.0), Cursor::new(50.0, 60.0));
        canvas.draw_rounded_rect(Cursor::new(10.0, 10.0), Cursor::new(50.0, 60.0), 10.8);
        canvas.show_page();
        canvas.draw_line(Cursor::new(0.0, 0.0), Cursor::new(100.0, 100.0));
        canvas.show_page();
        assert_eq!(canvas.page_count(), 2);
        valid_pdf(&canvas.save(&DocumentInfo::default()).unwrap());
    }

    #[test]
    fn unregistered_face_is_an_error() {
        let mut canvas = PdfCanvas::new("t", 100.0, 100.0);
        let err = canvas
            .draw_text(Cursor::new(0.0, 0.0), "x", "Vera", 10.0)
            .unwrap_err();
        assert!(matches!(err, CanvasError::UnknownFont(_)));
    }

    #[test]
    fn bad_font_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        fs::write(&path, b"garbage").unwrap();
        let mut canvas = PdfCanvas::new("t", 100.0, 100.0);
        assert!(matches!(
            canvas.register_font("bad.ttf", &path),
            Err(CanvasError::Font { .. })
        ));
    }

    #[test]
    fn rounded_outline_is_closed_with_curved_corners() {
        let pts = rounded_outline(Cursor::new(50.0, 60.0), Cursor::new(10.0, 10.0), 10.8);
        assert_eq!(pts.len(), 17);
        assert_eq!(pts.iter().filter(|(_, handle)| *handle).count(), 8);
        assert_eq!(pts.first(), pts.last());
        for (p, _) in &pts {
            assert!(p.x >= 10.0 - 1e-3 && p.x <= 50.0 + 1e-3);
            assert!(p.y >= 10.0 - 1e-3 && p.y <= 60.0 + 1e-3);
        }
        // Starts on the bottom edge, one radius in from the left.
        assert_eq!(pts[0].0, Cursor::new(20.8, 10.0));
    }

    #[test]
    fn winansi_maps_specials() {
        assert_eq!(winansi_bytes("a€é"), vec![b'a', 0x80, 0xE9]);
        assert_eq!(winansi_bytes("日\u{0081}"), b"??".to_vec());
    }

    #[test]
    fn accented_text_is_written_as_winansi_bytes() {
        let mut canvas = PdfCanvas::new("t", 200.0, 200.0);
        canvas
            .draw_text(Cursor::new(10.0, 100.0), "Café", "Courier", 10.0)
            .unwrap();
        assert!(canvas.ops.iter().any(|op| matches!(
            op,
            Op::Unknown { key, value } if key == "Tj"
                && matches!(value.as_slice(), [DictItem::String { data, .. }] if data == b"Caf\xE9")
        )));
        canvas.show_page();
        valid_pdf(&canvas.save(&DocumentInfo::default()).unwrap());
    }

    #[test]
    fn graphics_state_is_replayed_on_new_pages() {
        let mut canvas = PdfCanvas::new("t", 200.0, 200.0);
        canvas.set_line_width(3.0);
        canvas.show_page();
        assert!(canvas
            .ops
            .iter()
            .any(|op| matches!(op, Op::SetOutlineThickness { pt } if *pt == Pt(3.0))));
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn builtin_names_cover_the_registry() {
        let registry = crate::fonts::FontRegistry::default();
        for family in ["courier", "helvetica", "times", "symbol", "dingbat"] {
            for (bold, italic) in [(false, false), (true, false), (false, true), (true, true)] {
                let face = registry.resolve(family, bold, italic).unwrap();
                assert!(builtin_font(face).is_some(), "{face}");
            }
        }
    }
}
