//! Pipeline – ties together compiling, dispatch and rendering into a single
//! function call.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::canvas::RecordingCanvas;
use crate::compiler::{Command, Compiler, DEFAULT_MAX_INCLUDE_DEPTH};
use crate::dispatch::DispatchTable;
use crate::draw_log::DrawLog;
use crate::error::ForgeError;
use crate::fonts::{DEFAULT_FAMILY, DEFAULT_SIZE};
use crate::locator::SearchPathLocator;
use crate::machine::{PageSetup, RenderState, CM};
use crate::render::PdfCanvas;

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width and height swapped.
    Landscape,
}

/// Configuration for the PDF generation pipeline. Lengths are in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata (default: "Report").
    pub title: String,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    /// Page orientation; swaps effective width/height when `Landscape`.
    pub orientation: PageOrientation,
    pub left_margin: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub font_family: String,
    pub font_size: f32,
    /// Extra directories searched for includes, pictures and fonts.
    pub search_paths: Vec<PathBuf>,
    pub max_include_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "Report".to_string(),
            page_width: 595.28,
            page_height: 841.89,
            orientation: PageOrientation::Portrait,
            left_margin: 0.7 * CM,
            top_margin: 0.75 * CM,
            bottom_margin: 1.0 * CM,
            font_family: DEFAULT_FAMILY.to_string(),
            font_size: DEFAULT_SIZE,
            search_paths: Vec::new(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl PipelineConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    /// The 590 × 890 pt page of the legacy report printer.
    pub fn legacy_page() -> Self {
        Self {
            page_width: 590.0,
            page_height: 890.0,
            ..Self::default()
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ForgeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ForgeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ForgeError> {
        if self.page_width <= 0.0 || self.page_height <= 0.0 {
            return Err(ForgeError::Config(format!(
                "page size must be positive, got {} x {}",
                self.page_width, self.page_height
            )));
        }
        if self.font_size <= 0.0 {
            return Err(ForgeError::Config(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        if self.top_margin + self.bottom_margin >= self.effective_height() {
            return Err(ForgeError::Config(
                "vertical margins leave no room on the page".to_string(),
            ));
        }
        Ok(())
    }

    /// Geometry and initial style handed to the render state machine.
    pub fn page_setup(&self) -> PageSetup {
        PageSetup {
            title: self.title.clone(),
            width: self.effective_width(),
            height: self.effective_height(),
            left_margin: self.left_margin,
            top_margin: self.top_margin,
            bottom_margin: self.bottom_margin,
            font_family: self.font_family.clone(),
            font_size: self.font_size,
        }
    }

    pub fn locator(&self) -> SearchPathLocator {
        SearchPathLocator::standard(&self.search_paths)
    }
}

/// A rendered document.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub pages: usize,
    /// Copy count requested by the markup; reported, not applied.
    pub copies: u32,
}

/// Markup → command list, with includes expanded.
pub fn compile_markup(markup: &str, config: &PipelineConfig) -> Result<Vec<Command>, ForgeError> {
    let locator = config.locator();
    let commands = Compiler::new(&locator)
        .with_max_include_depth(config.max_include_depth)
        .compile(markup)?;
    log::debug!("compiled {} command(s)", commands.len());
    Ok(commands)
}

/// Full pipeline: markup string → PDF bytes.
pub fn generate_pdf(markup: &str, config: &PipelineConfig) -> Result<RenderOutput, ForgeError> {
    config.validate()?;
    let commands = compile_markup(markup, config)?;

    let setup = config.page_setup();
    let table = DispatchTable::standard();
    let locator = config.locator();
    let canvas = PdfCanvas::new(&setup.title, setup.width, setup.height);

    let mut state = RenderState::new(canvas, &setup, &table, &locator)?;
    state.run(&commands)?;
    let rendered = state.finish()?;

    Ok(RenderOutput {
        bytes: rendered.output,
        pages: rendered.pages,
        copies: rendered.copies,
    })
}

/// Run the pipeline against a [`RecordingCanvas`] – useful for testing.
pub fn render_to_log(markup: &str, config: &PipelineConfig) -> Result<DrawLog, ForgeError> {
    config.validate()?;
    let commands = compile_markup(markup, config)?;

    let setup = config.page_setup();
    let table = DispatchTable::standard();
    let locator = config.locator();
    let canvas = RecordingCanvas::new(setup.width, setup.height);

    let mut state = RenderState::new(canvas, &setup, &table, &locator)?;
    state.run(&commands)?;
    Ok(state.finish()?.output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_basic() {
        let out = generate_pdf("{$BOLDON}Hello\nWorld\n", &PipelineConfig::default()).unwrap();
        assert_eq!(out.pages, 1);
        assert_eq!(out.copies, 1);
        assert_eq!(&out.bytes[0..5], b"%PDF-");
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let config = PipelineConfig {
            orientation: PageOrientation::Landscape,
            ..PipelineConfig::default()
        };
        let setup = config.page_setup();
        assert_eq!(setup.width, 841.89);
        assert_eq!(setup.height, 595.28);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            PipelineConfig::from_json(r#"{"title": "Inventory", "orientation": "landscape"}"#)
                .unwrap();
        assert_eq!(config.title, "Inventory");
        assert_eq!(config.orientation, PageOrientation::Landscape);
        assert_eq!(config.font_family, "courier");
        assert_eq!(config.max_include_depth, DEFAULT_MAX_INCLUDE_DEPTH);

        let back = PipelineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn bad_config_is_rejected() {
        assert!(matches!(
            PipelineConfig::from_json(r#"{"font_size": 0}"#),
            Err(ForgeError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json("not json"),
            Err(ForgeError::Config(_))
        ));
    }

    #[test]
    fn legacy_page_size() {
        let config = PipelineConfig::legacy_page();
        assert_eq!((config.page_width, config.page_height), (590.0, 890.0));
    }
}
