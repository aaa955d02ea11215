//! Pagination – decides when a page is full and commits page breaks lazily.
//!
//! A break request (explicit `NEWPAGE`, or a line that no longer fits) only
//! marks a break as pending. The physical `show_page` is issued by the next
//! call that actually draws something, and only if the page being left has
//! marks on it. A document that ends right after a break therefore never
//! gains a blank trailing page.

use crate::canvas::Canvas;

/// Text baseline sits this fraction of the font size below the line top.
pub const BASELINE_RATIO: f32 = 0.75;

/// Whether a text line of `size` whose top is at `top` fits above the
/// bottom margin.
pub fn line_fits(top: f32, size: f32, bottom_margin: f32) -> bool {
    top - size >= bottom_margin
}

/// Baseline for a text line whose top is at `top`.
pub fn baseline(top: f32, size: f32) -> f32 {
    top - size * BASELINE_RATIO
}


/// The two-flag page break state machine.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    /// A page break has been requested but not yet committed.
    start_newpage: bool,
    /// Something has been drawn since the last committed page break.
    printing_begun: bool,
    finished: bool,
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_break_pending(&self) -> bool {
        self.start_newpage
    }

    /// Mark a page break as pending.
    pub fn request_break(&mut self) {
        if !self.printing_begun {
            log::debug!("page break requested but nothing has been drawn on this page");
        }
        self.start_newpage = true;
    }

    /// Call before every drawing operation. Commits a pending break if the
    /// page being left has content. Returns whether a page was emitted.
    pub fn before_draw<C: Canvas>(&mut self, canvas: &mut C) -> bool {
        let mut emitted = false;
        if self.start_newpage {
            self.start_newpage = false;
            if self.printing_begun {
                canvas.show_page();
                emitted = true;
                log::debug!("page {} committed", canvas.page_count());
            }
        }
        self.printing_begun = true;
        emitted
    }

    /// Flush the last page. Issues exactly one `show_page`, however often it
    /// is called.
    pub fn finish<C: Canvas>(&mut self, canvas: &mut C) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.start_newpage = false;
        canvas.show_page();
    }
}
