//! Command dispatch table – maps tag names to render operations.
//!
//! The table is built once and never changes. Several spellings may map to
//! the same [`Operation`] (`BOLDON` and `B1`, `SF` and `SETFONT`, …).

use std::collections::HashMap;

use crate::error::RenderError;

/// Corner style for a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corners {
    Square,
    Rounded,
}

/// Every behaviour the render state machine knows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    /// Reset the cursor to the top-left writable corner.
    PrintInit,
    PrintEnd,
    /// Draw text at the cursor.
    Output,
    /// End the current text line.
    LineEnd,
    Bold(bool),
    Italic(bool),
    /// Set the font size; `None` reads the size from the arguments.
    FontSize(Option<f32>),
    FontName,
    FillColor,
    Copies,
    BoxStart,
    BoxEnd(Corners),
    LineStart,
    LineStop,
    LineWidth,
    NewPage,
    Picture,
    Up,
    Down,
    MoveAbsolute,
    MoveRelative,
    Right,
    LeftMargin,
    PushPosition,
    PopPosition,
}

/// Name used for compiled literal text.
pub const PRINTSTRING: &str = "printstring";
/// Name used for compiled line ends.
pub const NEWLINE: &str = "newline";

const STANDARD: &[(&str, Operation)] = &[
    ("PRINTINIT", Operation::PrintInit),
    ("PRINTEND", Operation::PrintEnd),
    ("LEND", Operation::LineEnd),
    (NEWLINE, Operation::LineEnd),
    (PRINTSTRING, Operation::Output),
    ("SHOWLINE", Operation::Output),
    ("LMARGIN", Operation::LeftMargin),
    ("PUSHPOS", Operation::PushPosition),
    ("POPPOS", Operation::PopPosition),
    ("BOLDON", Operation::Bold(true)),
    ("B1", Operation::Bold(true)),
    ("BOLDOFF", Operation::Bold(false)),
    ("B0", Operation::Bold(false)),
    ("ITALICON", Operation::Italic(true)),
    ("I1", Operation::Italic(true)),
    ("ITALICOFF", Operation::Italic(false)),
    ("I0", Operation::Italic(false)),
    ("SETFONT16", Operation::FontSize(Some(16.0))),
    ("SETFONT12", Operation::FontSize(Some(12.0))),
    ("SETFONT10", Operation::FontSize(Some(10.0))),
    ("SETFONT8", Operation::FontSize(Some(8.0))),
    ("SETFONT6", Operation::FontSize(Some(6.0))),
    ("SETFONT", Operation::FontSize(None)),
    ("SF", Operation::FontSize(None)),
    ("FONTNAME", Operation::FontName),
    ("SETCOLOR", Operation::FillColor),
    ("COPIES", Operation::Copies),
    ("BOXS", Operation::BoxStart),
    ("RBOXS", Operation::BoxStart),
    ("BOXE", Operation::BoxEnd(Corners::Square)),
    ("RBOXE", Operation::BoxEnd(Corners::Rounded)),
    ("LINES", Operation::LineStart),
    ("L1", Operation::LineStart),
    ("LINEE", Operation::LineStop),
    ("L0", Operation::LineStop),
    ("LINEWIDTH", Operation::LineWidth),
    ("LW", Operation::LineWidth),
    ("NEWPAGE", Operation::NewPage),
    ("PIC", Operation::Picture),
    ("UP", Operation::Up),
    ("DOWN", Operation::Down),
    ("MA", Operation::MoveAbsolute),
    ("MR", Operation::MoveRelative),
    ("RIGHT", Operation::Right),
];

/// Immutable name → operation map.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    ops: HashMap<&'static str, Operation>,
}

impl DispatchTable {
    /// The full report vocabulary.
    pub fn standard() -> Self {
        Self {
            ops: STANDARD.iter().copied().collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<Operation, RenderError> {
        self.ops
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::UnknownCommand(name.to_string()))
    }
}
