//! Error types for every stage of the report pipeline.
//!
//! Nothing in the core recovers from an error: compile failures abort before
//! any drawing happens, and render failures abort the document at the
//! offending command.

use std::path::PathBuf;

use thiserror::Error;

/// The file locator could not find a file.
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("could not find {name:?} in any of: {}", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" : ")
}

/// Raised while turning markup into commands.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("line {line}, column {column}: tag is missing its closing brace")]
    UnterminatedTag { line: usize, column: usize },

    #[error("line {line}: malformed tag {tag:?}")]
    MalformedTag { line: usize, tag: String },

    #[error("line {line}: include failed: {source}")]
    Include {
        line: usize,
        #[source]
        source: LocateError,
    },

    #[error("include of {file:?} exceeds the maximum nesting depth of {depth}")]
    IncludeTooDeep { file: String, depth: usize },

    #[error("could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raised by a drawing backend.
#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("font {name:?} could not be loaded: {reason}")]
    Font { name: String, reason: String },

    #[error("image {} could not be used: {reason}", .path.display())]
    Image { path: PathBuf, reason: String },

    #[error("font {0:?} has not been registered with the canvas")]
    UnknownFont(String),

    #[error("PDF writer error: {0}")]
    Pdf(String),
}

/// Raised while executing compiled commands.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("command {0:?} has not been registered")]
    UnknownCommand(String),

    #[error(transparent)]
    FileNotFound(#[from] LocateError),

    #[error("could not restore position because nothing has been saved")]
    StackUnderflow,

    #[error("{command}: invalid argument {value:?} ({reason})")]
    InvalidArgument {
        command: String,
        value: String,
        reason: String,
    },

    #[error("{command}: missing argument {name:?}")]
    MissingArgument { command: String, name: String },

    #[error("unknown font family {0:?}")]
    UnknownFont(String),

    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error("command #{index} ({command}) failed: {source}")]
    AtCommand {
        index: usize,
        command: String,
        #[source]
        source: Box<RenderError>,
    },
}

impl RenderError {
    /// The innermost error, with any command-position wrapping removed.
    pub fn root(&self) -> &RenderError {
        match self {
            RenderError::AtCommand { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A comprehensive error type for the whole markup → PDF pipeline.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("compile failed: {0}")]
    Compile(#[from] CompileError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ForgeError {
    fn from(e: serde_json::Error) -> Self {
        ForgeError::Config(e.to_string())
    }
}
