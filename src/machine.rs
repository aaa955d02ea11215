//! Render state machine – executes compiled commands against a [`Canvas`].
//!
//! The machine owns everything that changes while a document is drawn: the
//! cursor and its save stack, the font, the left margin, box and line
//! anchors, the copy count and the pending page break. Commands are applied
//! strictly in order; the first failure aborts the document.

use std::collections::HashMap;

use crate::args::Args;
use crate::canvas::{Canvas, DocumentInfo};
use crate::compiler::Command;
use crate::dispatch::{Corners, DispatchTable, Operation};
use crate::error::RenderError;
use crate::fonts::{FontRegistry, FontState};
use crate::locator::{strip_quotes, FileLocator};
use crate::pagination::{baseline, line_fits, PageState};
use crate::position::{Point, Position};

/// Points per centimetre.
pub const CM: f32 = 72.0 / 2.54;
/// Corner radius of rounded boxes (0.15 in).
pub const ROUND_RADIUS: f32 = 1.5 * 72.0 / 10.0;
/// Anchor name used when a box or line tag is given no name.
pub const DEFAULT_ANCHOR: &str = "0";
/// Character whose width defines one `RIGHT` column.
const COLUMN_FILLER: &str = "_";

/// Page geometry and initial style for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSetup {
    pub title: String,
    pub width: f32,
    pub height: f32,
    pub left_margin: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub font_family: String,
    pub font_size: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            title: "Report".to_string(),
            width: 595.28,
            height: 841.89,
            left_margin: 0.7 * CM,
            top_margin: 0.75 * CM,
            bottom_margin: 1.0 * CM,
            font_family: crate::fonts::DEFAULT_FAMILY.to_string(),
            font_size: crate::fonts::DEFAULT_SIZE,
        }
    }
}

/// Left margin with its remembered default.
#[derive(Debug, Clone)]
struct Margins {
    left: f32,
    left_default: Option<f32>,
    top: f32,
    bottom: f32,
}

/// The finished document.
#[derive(Debug)]
pub struct Rendered<O> {
    pub output: O,
    pub pages: usize,
    pub copies: u32,
}

pub struct RenderState<'a, C: Canvas> {
    canvas: C,
    table: &'a DispatchTable,
    locator: &'a dyn FileLocator,
    title: String,
    page_height: f32,
    pos: Position,
    font: FontState,
    registry: FontRegistry,
    margins: Margins,
    pages: PageState,
    boxes: HashMap<String, Point>,
    lines: HashMap<String, Point>,
    copies: u32,
}

impl<'a, C: Canvas> RenderState<'a, C> {
    pub fn new(
        canvas: C,
        setup: &PageSetup,
        table: &'a DispatchTable,
        locator: &'a dyn FileLocator,
    ) -> Result<Self, RenderError> {
        if setup.font_size <= 0.0 {
            return Err(RenderError::InvalidArgument {
                command: "setup".to_string(),
                value: setup.font_size.to_string(),
                reason: "font size must be positive".to_string(),
            });
        }
        let mut state = Self {
            canvas,
            table,
            locator,
            title: setup.title.clone(),
            page_height: setup.height,
            pos: Position::new(setup.left_margin, setup.height - setup.top_margin),
            font: FontState {
                size: setup.font_size,
                ..FontState::default()
            },
            registry: FontRegistry::default(),
            margins: Margins {
                left: setup.left_margin,
                left_default: None,
                top: setup.top_margin,
                bottom: setup.bottom_margin,
            },
            pages: PageState::new(),
            boxes: HashMap::new(),
            lines: HashMap::new(),
            copies: 1,
        };
        state.select_family(&setup.font_family)?;
        Ok(state)
    }

    pub fn position(&self) -> Point {
        self.pos.point()
    }

    pub fn font(&self) -> &FontState {
        &self.font
    }

    pub fn left_margin(&self) -> f32 {
        self.margins.left
    }

    pub fn page_state(&self) -> &PageState {
        &self.pages
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn copies(&self) -> u32 {
        self.copies
    }

    /// Top-left writable corner of a fresh page.
    fn top_left(&self) -> Point {
        Point::new(self.margins.left, self.page_height - self.margins.top)
    }

    /// Execute a command sequence in order.
    pub fn run(&mut self, commands: &[Command]) -> Result<(), RenderError> {
        for (index, command) in commands.iter().enumerate() {
            log::trace!("#{index} {}", command.label());
            self.execute(command).map_err(|e| {
                log::error!(
                    "failure executing {} (command #{index}): {e}",
                    command.label()
                );
                RenderError::AtCommand {
                    index,
                    command: command.label(),
                    source: Box::new(e),
                }
            })?;
        }
        Ok(())
    }

    /// Execute a single command.
    pub fn execute(&mut self, command: &Command) -> Result<(), RenderError> {
        match command {
            Command::Literal { text } => self.output(text),
            Command::Newline => {
                self.line_end();
                Ok(())
            }
            Command::Invoke { name, args } => {
                let op = self.table.lookup(name)?;
                self.apply(op, name, args)
            }
        }
    }

    /// Flush the last page and hand the document to the canvas.
    pub fn finish(mut self) -> Result<Rendered<C::Output>, RenderError> {
        self.pages.finish(&mut self.canvas);
        let pages = self.canvas.page_count();
        let copies = self.copies;
        let info = DocumentInfo {
            title: self.title,
            copies,
        };
        log::info!("rendered {pages} page(s), {copies} copies requested");
        let output = self.canvas.save(&info)?;
        Ok(Rendered {
            output,
            pages,
            copies,
        })
    }

    fn apply(&mut self, op: Operation, name: &str, args: &Args) -> Result<(), RenderError> {
        match op {
            Operation::PrintInit => {
                let top = self.top_left();
                self.pos.set(top.x, top.y);
            }
            Operation::PrintEnd => {}
            Operation::Output => self.output(args.value(0, "line").unwrap_or_default())?,
            Operation::LineEnd => self.line_end(),
            Operation::Bold(on) => self.font.bold = on,
            Operation::Italic(on) => self.font.italic = on,
            Operation::FontSize(fixed) => {
                let size = match fixed {
                    Some(size) => size,
                    None => args.float(name, 0, "size")?,
                };
                if size <= 0.0 {
                    return Err(invalid(name, size, "font size must be positive"));
                }
                self.font.size = size;
            }
            Operation::FontName => {
                let family = strip_quotes(args.text(name, 0, "name")?).trim().to_string();
                self.select_family(&family)?;
            }
            Operation::FillColor => {
                let r = args.float(name, 0, "r")?;
                let g = args.float(name, 1, "g")?;
                let b = args.float(name, 2, "b")?;
                self.canvas.set_fill_color(r, g, b);
            }
            Operation::Copies => {
                let copies = args.int(name, 0, "numcopies")?;
                self.copies =
                    u32::try_from(copies).map_err(|e| invalid(name, copies, &e.to_string()))?;
            }
            Operation::BoxStart => {
                let key = anchor_name(args, "boxname");
                log::debug!("box {key:?} start at {:?}", self.pos.point());
                self.boxes.insert(key, self.pos.point());
            }
            Operation::BoxEnd(corners) => self.box_end(&anchor_name(args, "boxname"), corners),
            Operation::LineStart => {
                let key = anchor_name(args, "linename");
                self.lines.insert(key, self.pos.point());
            }
            Operation::LineStop => self.line_stop(&anchor_name(args, "linename")),
            Operation::LineWidth => {
                let width = args.float(name, 0, "width")?;
                if width < 0.0 {
                    return Err(invalid(name, width, "line width cannot be negative"));
                }
                self.canvas.set_line_width(width);
            }
            Operation::NewPage => self.new_page(),
            Operation::Picture => self.picture(name, args)?,
            Operation::Up => {
                let step = self.line_step(name, args)?;
                self.pos.y += step;
                self.pos.x = self.margins.left;
            }
            Operation::Down => {
                let step = self.line_step(name, args)?;
                self.pos.y -= step;
                self.pos.x = self.margins.left;
            }
            Operation::MoveAbsolute => {
                if let Some(x) = args.opt_float(name, 0, "x")? {
                    self.pos.x = x * CM;
                }
                if let Some(y) = args.opt_float(name, 1, "y")? {
                    self.pos.y = self.page_height - y * CM;
                }
            }
            Operation::MoveRelative => {
                self.pos.x += args.float(name, 0, "x")?;
                self.pos.y -= args.float(name, 1, "y")?;
            }
            Operation::Right => {
                let columns = args.int(name, 0, "c")?.max(0) as f32;
                let face = self.face()?;
                let column = self.canvas.measure_text(COLUMN_FILLER, &face, self.font.size);
                self.pos.x = self.margins.left + columns * column;
            }
            Operation::LeftMargin => {
                let default = *self.margins.left_default.get_or_insert(self.margins.left);
                self.margins.left = match args.opt_float(name, 0, "margin")? {
                    Some(cm) => cm * CM,
                    None => default,
                };
            }
            Operation::PushPosition => self.pos.push(),
            Operation::PopPosition => self.pos.pop()?,
        }
        Ok(())
    }

    fn face(&self) -> Result<String, RenderError> {
        self.registry
            .resolve(&self.font.family, self.font.bold, self.font.italic)
            .map(str::to_string)
    }

    fn select_family(&mut self, family: &str) -> Result<(), RenderError> {
        if let Some(path) = self.registry.ensure_family(family, self.locator)? {
            let face = self.registry.resolve(family, false, false)?.to_string();
            self.canvas.register_font(&face, &path)?;
        }
        self.font.family = family.to_string();
        Ok(())
    }

    /// `lines × fsize` for `UP`/`DOWN`; `fsize` defaults to the current size.
    fn line_step(&self, name: &str, args: &Args) -> Result<f32, RenderError> {
        let lines = args.int(name, 0, "lines")?;
        let size = args
            .opt_float(name, 1, "fsize")?
            .unwrap_or(self.font.size);
        Ok(lines as f32 * size)
    }

    /// Text emission. Text ending in a line break ends the line instead of
    /// advancing the cursor.
    fn output(&mut self, text: &str) -> Result<(), RenderError> {
        if text.is_empty() {
            return Ok(());
        }
        match text.strip_suffix('\n') {
            Some(body) => {
                self.draw_text(body)?;
                self.line_end();
            }
            None => {
                let width = self.draw_text(text)?;
                self.pos.x += width;
            }
        }
        Ok(())
    }

    /// Draw at the cursor and return the drawn width.
    fn draw_text(&mut self, text: &str) -> Result<f32, RenderError> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let size = self.font.size;
        if !line_fits(self.pos.y, size, self.margins.bottom) {
            log::debug!("no room for a {size}pt line at y={}, new page", self.pos.y);
            self.new_page();
        }
        let face = self.face()?;
        self.pages.before_draw(&mut self.canvas);
        let at = Point::new(self.pos.x, baseline(self.pos.y, size));
        self.canvas.draw_text(at, text, &face, size)?;
        Ok(self.canvas.measure_text(text, &face, size))
    }

    /// Move to the start of the next line, breaking the page when that line
    /// would not fit.
    fn line_end(&mut self) {
        let size = self.font.size;
        let next = self.pos.y - size;
        if line_fits(next, size, self.margins.bottom) {
            self.pos.y = next;
            self.pos.x = self.margins.left;
        } else {
            log::debug!("current pos {next} leaves no room for a {size}pt line, new page");
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        self.pages.request_break();
        let top = self.top_left();
        self.pos.set(top.x, top.y);
    }

    fn box_end(&mut self, key: &str, corners: Corners) {
        let Some(start) = self.boxes.get(key).copied() else {
            log::warn!("box {key:?} ended but never started");
            return;
        };
        self.pages.before_draw(&mut self.canvas);
        let end = self.pos.point();
        log::debug!("box {key:?} from {start:?} to {end:?}");
        match corners {
            Corners::Square => self.canvas.draw_rect(start, end),
            Corners::Rounded => self.canvas.draw_rounded_rect(start, end, ROUND_RADIUS),
        }
    }

    fn line_stop(&mut self, key: &str) {
        let Some(start) = self.lines.get(key).copied() else {
            log::warn!("line {key:?} ended but never started");
            return;
        };
        self.pages.before_draw(&mut self.canvas);
        self.canvas.draw_line(start, self.pos.point());
    }

    fn picture(&mut self, name: &str, args: &Args) -> Result<(), RenderError> {
        let path = self.locator.locate(args.text(name, 0, "fname")?)?;
        let width = args.opt_float(name, 1, "imgwidth")?;
        let height = args.opt_float(name, 2, "imgheight")?;
        self.pages.before_draw(&mut self.canvas);
        let at = Point::new(self.pos.x, self.pos.y - height.unwrap_or(0.0));
        self.canvas.draw_image(&path, at, width, height)?;
        Ok(())
    }
}

fn anchor_name(args: &Args, key: &str) -> String {
    args.value(0, key)
        .map(strip_quotes)
        .unwrap_or(DEFAULT_ANCHOR)
        .to_string()
}

fn invalid(command: &str, value: impl ToString, reason: &str) -> RenderError {
    RenderError::InvalidArgument {
        command: command.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
