//! Cursor position in PDF points (origin bottom-left, y grows upwards).

use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The current cursor plus a LIFO stack of saved cursors.
#[derive(Debug, Clone, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    saved: Vec<Point>,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            saved: Vec::new(),
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Move without touching the saved stack.
    pub fn set(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn push(&mut self) {
        self.saved.push(self.point());
    }

    pub fn pop(&mut self) -> Result<(), RenderError> {
        let p = self.saved.pop().ok_or(RenderError::StackUnderflow)?;
        self.set(p.x, p.y);
        Ok(())
    }
}
