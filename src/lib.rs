//! # report-forge – Tag-markup → PDF report pipeline
//!
//! Converts line-oriented report markup (plain text interleaved with
//! `{$NAME(params)}` tags) into PDF documents. The pipeline stages are:
//!
//! 1. **Compile** – markup → flat command list, includes expanded ([`compiler`], [`args`])
//! 2. **Dispatch** – tag name → operation ([`dispatch`])
//! 3. **Execute** – cursor, fonts, anchors and page breaks ([`machine`], [`pagination`])
//! 4. **Draw** – emit PDF bytes via printpdf ([`render`]) or record a
//!    [`draw_log::DrawLog`] ([`canvas`])
//!
//! [`pipeline`] wires the stages together behind [`generate_pdf`].

pub mod args;
pub mod canvas;
pub mod compiler;
pub mod dispatch;
pub mod draw_log;
pub mod error;
pub mod fonts;
pub mod locator;
pub mod machine;
pub mod pagination;
pub mod pipeline;
pub mod position;
pub mod render;
pub mod templates;

// Re-exports for convenience
pub use error::{CompileError, ForgeError, RenderError};
pub use pipeline::{generate_pdf, render_to_log, PageOrientation, PipelineConfig, RenderOutput};
