//! Markup compiler – converts raw report lines into an ordered command list.
//!
//! A tag is `{$NAME}` or `{$NAME(params)}` and may appear anywhere on a line.
//! Text around tags becomes [`Command::Literal`], each tag becomes
//! [`Command::Invoke`], and a line that ended with a line terminator gets a
//! trailing [`Command::Newline`]. `INCLUDE(file)` is expanded here, at compile
//! time, by compiling the located file in place.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::args::{bind, Args};
use crate::error::CompileError;
use crate::locator::FileLocator;

const TAG_OPEN: &str = "{$";
const TAG_CLOSE: char = '}';
const INCLUDE: &str = "INCLUDE";

/// Default limit on nested `INCLUDE`s.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// One compiled unit of work for the render state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Literal { text: String },
    Newline,
    Invoke { name: String, args: Args },
}

impl Command {
    pub fn literal(text: impl Into<String>) -> Self {
        Command::Literal { text: text.into() }
    }

    pub fn invoke(name: impl Into<String>, args: Args) -> Self {
        Command::Invoke {
            name: name.into(),
            args,
        }
    }

    /// Short human-readable label used in error messages and logs.
    pub fn label(&self) -> String {
        match self {
            Command::Literal { text } => format!("text {text:?}"),
            Command::Newline => "newline".to_string(),
            Command::Invoke { name, args } if args.is_empty() => name.clone(),
            Command::Invoke { name, args } => format!("{name}({})", args.to_params()),
        }
    }
}

/// Serialise a compiled command list as pretty JSON.
pub fn commands_to_json(commands: &[Command]) -> String {
    serde_json::to_string_pretty(commands).unwrap_or_default()
}

/// Decode raw input bytes, dropping anything that is not valid UTF-8.
pub fn decode_input(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\u{FFFD}', "")
}

/// Strip control characters (form feed, shift-in/out, escape, …) but keep tabs.
fn strip_controls(line: &str) -> String {
    line.chars()
        .filter(|&c| c == '\t' || !c.is_control())
        .collect()
}

/// Compiles markup, resolving includes through a [`FileLocator`].
pub struct Compiler<'a> {
    locator: &'a dyn FileLocator,
    max_include_depth: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(locator: &'a dyn FileLocator) -> Self {
        Self {
            locator,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    /// Compile a whole document.
    pub fn compile(&self, source: &str) -> Result<Vec<Command>, CompileError> {
        self.compile_lines(source.split_inclusive('\n'))
    }

    /// Compile pre-split lines; each line keeps its own terminator, if any.
    pub fn compile_lines<'s, I>(&self, lines: I) -> Result<Vec<Command>, CompileError>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut out = Vec::new();
        for (i, line) in lines.into_iter().enumerate() {
            self.compile_line(line, i + 1, 0, &mut out)?;
        }
        Ok(out)
    }

    /// Compile a file from disk.
    pub fn compile_file(&self, path: &Path) -> Result<Vec<Command>, CompileError> {
        let mut out = Vec::new();
        self.compile_file_into(path, 0, &mut out)?;
        Ok(out)
    }

    fn compile_file_into(
        &self,
        path: &Path,
        depth: usize,
        out: &mut Vec<Command>,
    ) -> Result<(), CompileError> {
        let bytes = fs::read(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = decode_input(&bytes);
        for (i, line) in text.split_inclusive('\n').enumerate() {
            self.compile_line(line, i + 1, depth, out)?;
        }
        Ok(())
    }

    fn compile_line(
        &self,
        raw: &str,
        line_no: usize,
        depth: usize,
        out: &mut Vec<Command>,
    ) -> Result<(), CompileError> {
        if raw.is_empty() {
            return Ok(());
        }
        let has_newline = raw.ends_with('\n');
        let line = strip_controls(raw);
        let line = line.trim_end();

        let mut cursor = 0;
        while let Some(offset) = line[cursor..].find(TAG_OPEN) {
            let open = cursor + offset;
            if open > cursor {
                out.push(Command::literal(&line[cursor..open]));
            }
            let body_start = open + TAG_OPEN.len();
            let close = line[body_start..]
                .find(TAG_CLOSE)
                .map(|i| body_start + i)
                .ok_or(CompileError::UnterminatedTag {
                    line: line_no,
                    column: line[..open].chars().count() + 1,
                })?;
            self.compile_tag(&line[body_start..close], line_no, depth, out)?;
            cursor = close + TAG_CLOSE.len_utf8();
        }
        if cursor < line.len() {
            out.push(Command::literal(&line[cursor..]));
        }

        if has_newline {
            out.push(Command::Newline);
        }
        Ok(())
    }

    fn compile_tag(
        &self,
        body: &str,
        line_no: usize,
        depth: usize,
        out: &mut Vec<Command>,
    ) -> Result<(), CompileError> {
        let body = body.trim();
        let malformed = || CompileError::MalformedTag {
            line: line_no,
            tag: body.to_string(),
        };

        let (name, args) = match body.find('(') {
            None => (body, Args::default()),
            Some(p) => {
                let params = body[p + 1..]
                    .trim_end()
                    .strip_suffix(')')
                    .ok_or_else(malformed)?;
                (body[..p].trim(), bind(params))
            }
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(malformed());
        }

        if name == INCLUDE {
            let file = args.positional.first().ok_or_else(malformed)?;
            return self.include(file, line_no, depth, out);
        }

        out.push(Command::invoke(name, args));
        Ok(())
    }

    fn include(
        &self,
        file: &str,
        line_no: usize,
        depth: usize,
        out: &mut Vec<Command>,
    ) -> Result<(), CompileError> {
        if depth >= self.max_include_depth {
            return Err(CompileError::IncludeTooDeep {
                file: file.to_string(),
                depth: self.max_include_depth,
            });
        }
        let path = self
            .locator
            .locate(file)
            .map_err(|source| CompileError::Include {
                line: line_no,
                source,
            })?;
        log::debug!("including {}", path.display());
        self.compile_file_into(&path, depth + 1, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::SearchPathLocator;

    fn compile(source: &str) -> Result<Vec<Command>, CompileError> {
        let locator = SearchPathLocator::default();
        Compiler::new(&locator).compile(source)
    }

    fn sf(size: &str) -> Command {
        Command::invoke(
            "SF",
            Args {
                positional: vec![size.to_string()],
                ..Args::default()
            },
        )
    }

    #[test]
    fn splits_text_and_tags() {
        let cmds = compile("A{$SF(12)}B{$SF(14)}C\n").unwrap();
        assert_eq!(
            cmds,
            vec![
                Command::literal("A"),
                sf("12"),
                Command::literal("B"),
                sf("14"),
                Command::literal("C"),
                Command::Newline,
            ]
        );
    }

    #[test]
    fn consecutive_tags_and_bare_names() {
        let cmds = compile("{$BOLDON}{$ITALICON}x{$BOLDOFF}").unwrap();
        assert_eq!(
            cmds,
            vec![
                Command::invoke("BOLDON", Args::default()),
                Command::invoke("ITALICON", Args::default()),
                Command::literal("x"),
                Command::invoke("BOLDOFF", Args::default()),
            ]
        );
    }

    #[test]
    fn blank_line_is_only_a_newline() {
        assert_eq!(compile("\n").unwrap(), vec![Command::Newline]);
        assert!(compile("").unwrap().is_empty());
    }

    #[test]
    fn control_characters_are_stripped() {
        let cmds = compile("a\u{0c}b\u{1b}\u{0f}c\r\n").unwrap();
        assert_eq!(cmds, vec![Command::literal("abc"), Command::Newline]);
    }

    #[test]
    fn trailing_whitespace_is_trimmed_but_leading_kept() {
        let cmds = compile("   Total   \n").unwrap();
        assert_eq!(cmds, vec![Command::literal("   Total"), Command::Newline]);
    }

    #[test]
    fn unterminated_tag_fails() {
        let err = compile("ok\nabc{$SF(12)\n").unwrap_err();
        assert!(
            matches!(err, CompileError::UnterminatedTag { line: 2, column: 4 }),
            "{err:?}"
        );
    }

    #[test]
    fn missing_close_paren_fails() {
        let err = compile("{$SF(12}").unwrap_err();
        assert!(matches!(err, CompileError::MalformedTag { .. }), "{err:?}");
        let err = compile("{$}").unwrap_err();
        assert!(matches!(err, CompileError::MalformedTag { .. }), "{err:?}");
    }

    #[test]
    fn include_is_inlined() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("header.txt"), "Head{$SF(8)}\n").unwrap();
        let locator = SearchPathLocator::new([dir.path()]);
        let cmds = Compiler::new(&locator)
            .compile("{$INCLUDE(\"header.txt\")}Body\n")
            .unwrap();
        assert_eq!(
            cmds,
            vec![
                Command::literal("Head"),
                sf("8"),
                Command::Newline,
                Command::literal("Body"),
                Command::Newline,
            ]
        );
    }

    #[test]
    fn missing_include_fails_at_compile_time() {
        let dir = tempfile::tempdir().unwrap();
        let locator = SearchPathLocator::new([dir.path()]);
        let err = Compiler::new(&locator)
            .compile("{$INCLUDE(nothere.txt)}\n")
            .unwrap_err();
        assert!(matches!(err, CompileError::Include { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn self_include_hits_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("loop.txt"), "x{$INCLUDE(loop.txt)}\n").unwrap();
        let locator = SearchPathLocator::new([dir.path()]);
        let err = Compiler::new(&locator)
            .with_max_include_depth(4)
            .compile("{$INCLUDE(loop.txt)}")
            .unwrap_err();
        assert!(
            matches!(err, CompileError::IncludeTooDeep { depth: 4, .. }),
            "{err:?}"
        );
    }

    #[test]
    fn labels_render_arguments() {
        let cmds = compile("{$MA(2, y=3)}").unwrap();
        assert_eq!(cmds[0].label(), "MA(2, y=3)");
    }
}
