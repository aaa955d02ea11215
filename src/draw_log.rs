//! Draw log – a serialisable record of everything sent to a canvas, page by
//! page. This is the "frozen" form of a render, used for inspection and for
//! tests that need to know exactly what was drawn where.

use serde::{Deserialize, Serialize};

/// A complete recorded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawLog {
    #[serde(default = "DrawLog::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Requested number of printed copies.
    #[serde(default = "DrawLog::default_copies")]
    pub copies: u32,
    /// Finished pages, in order.
    pub pages: Vec<PageLog>,
}

/// Everything drawn on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLog {
    pub ops: Vec<DrawOp>,
}

/// One canvas call. Coordinates are PDF points, origin bottom-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        font: String,
        size: f32,
    },
    FillColor {
        r: f32,
        g: f32,
        b: f32,
    },
    LineWidth {
        width: f32,
    },
    Rect {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    RoundedRect {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        radius: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Image {
        path: String,
        x: f32,
        y: f32,
        width: Option<f32>,
        height: Option<f32>,
    },
    RegisterFont {
        name: String,
        path: String,
    },
}

impl DrawLog {
    pub fn new(page_width_pt: f32, page_height_pt: f32) -> Self {
        Self {
            title: Self::default_title(),
            page_width_pt,
            page_height_pt,
            copies: Self::default_copies(),
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Report".to_string()
    }

    fn default_copies() -> u32 {
        1
    }

    /// All text drawn, in order, across every page.
    pub fn texts(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}
