//! Font state, family → face resolution, and text measurement.
//!
//! The PDF base-14 families are known up front. Any other family is loaded
//! on demand from a TrueType file found through the file locator; its one
//! face is then used for every bold/italic combination.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::RenderError;
use crate::locator::FileLocator;

/// Family used when nothing else has been selected.
pub const DEFAULT_FAMILY: &str = "courier";
/// Point size used when nothing else has been selected.
pub const DEFAULT_SIZE: f32 = 10.0;

/// Face names indexed by `bold as usize | (italic as usize) << 1`.
const BUILTIN_FAMILIES: [(&str, [&str; 4]); 5] = [
    (
        "courier",
        ["Courier", "Courier-Bold", "Courier-Oblique", "Courier-BoldOblique"],
    ),
    (
        "helvetica",
        [
            "Helvetica",
            "Helvetica-Bold",
            "Helvetica-Oblique",
            "Helvetica-BoldOblique",
        ],
    ),
    (
        "times",
        ["Times-Roman", "Times-Bold", "Times-Italic", "Times-BoldItalic"],
    ),
    ("symbol", ["Symbol", "Symbol", "Symbol", "Symbol"]),
    (
        "dingbat",
        ["ZapfDingbats", "ZapfDingbats", "ZapfDingbats", "ZapfDingbats"],
    ),
];

/// The active text style.
#[derive(Debug, Clone, PartialEq)]
pub struct FontState {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
    pub size: f32,
}

impl Default for FontState {
    fn default() -> Self {
        Self {
            family: DEFAULT_FAMILY.to_string(),
            bold: false,
            italic: false,
            size: DEFAULT_SIZE,
        }
    }
}

fn variant_index(bold: bool, italic: bool) -> usize {
    (bold as usize) | ((italic as usize) << 1)
}

/// Maps `(family, bold, italic)` to a concrete face name.
#[derive(Debug, Clone)]
pub struct FontRegistry {
    families: HashMap<String, [String; 4]>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        let families = BUILTIN_FAMILIES
            .iter()
            .map(|(family, faces)| (family.to_string(), faces.map(str::to_string)))
            .collect();
        Self { families }
    }
}

impl FontRegistry {
    fn key(family: &str) -> String {
        family.trim().to_ascii_lowercase()
    }

    pub fn is_known(&self, family: &str) -> bool {
        self.families.contains_key(&Self::key(family))
    }

    /// Concrete face name for a style. Pure: never registers anything.
    pub fn resolve(&self, family: &str, bold: bool, italic: bool) -> Result<&str, RenderError> {
        self.families
            .get(&Self::key(family))
            .map(|faces| faces[variant_index(bold, italic)].as_str())
            .ok_or_else(|| RenderError::UnknownFont(family.to_string()))
    }

    /// Make sure `family` can be resolved, locating a font file for it if it
    /// is not yet known. Returns the file that must be embedded, if any.
    pub fn ensure_family(
        &mut self,
        family: &str,
        locator: &dyn FileLocator,
    ) -> Result<Option<PathBuf>, RenderError> {
        if self.is_known(family) {
            return Ok(None);
        }
        let path = locator.locate(family)?;
        log::debug!("registering font {family:?} from {}", path.display());
        let face = family.trim().to_string();
        self.families
            .insert(Self::key(family), std::array::from_fn(|_| face.clone()));
        Ok(Some(path))
    }
}

/// Advance metrics of an embedded face.
#[derive(Clone)]
struct EmbeddedMetrics {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    bytes: Vec<u8>,
    units_per_em: f32,
}

/// Measures text for base-14 and embedded faces.
#[derive(Clone, Default)]
pub struct FontMetrics {
    embedded: HashMap<String, EmbeddedMetrics>,
}

impl FontMetrics {
    /// Parse a TrueType/OpenType font and remember its advances under `name`.
    pub fn load(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), String> {
        let face =
            ttf_parser::Face::parse(&bytes, 0).map_err(|e| format!("Failed to parse font: {e}"))?;
        let units_per_em = face.units_per_em() as f32;
        self.embedded.insert(
            name.to_string(),
            EmbeddedMetrics {
                bytes,
                units_per_em,
            },
        );
        Ok(())
    }

    /// Width of `text` in points.
    pub fn measure(&self, text: &str, face: &str, size: f32) -> f32 {
        let Some(data) = self.embedded.get(face) else {
            return text.chars().count() as f32 * size * builtin_advance(face);
        };
        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(parsed) => {
                let scale = size / data.units_per_em;
                text.chars()
                    .map(|ch| match parsed.glyph_index(ch) {
                        Some(gid) => parsed.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => size * 0.5,
                    })
                    .sum()
            }
            Err(_) => text.chars().count() as f32 * size * 0.5,
        }
    }
}

/// Average advance (in em) for a base-14 face. Courier is exact.
fn builtin_advance(face: &str) -> f32 {
    let bold = face.contains("Bold");
    if face.starts_with("Courier") || face == "Symbol" || face == "ZapfDingbats" {
        0.6
    } else if face.starts_with("Times") {
        if bold { 0.5 } else { 0.45 }
    } else if bold {
        0.55
    } else {
        0.5
    }
}
