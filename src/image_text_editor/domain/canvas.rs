use serde::Serialize;

pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 72;

// Overlays may not start closer than this to the right/bottom edge
const EDGE_RESERVE: u32 = 100;

/// Logical frame dimensions. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// 3:4 portrait frame.
    pub const REFERENCE: CanvasSize = CanvasSize::new(600, 800);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn max_x(&self) -> i32 {
        self.width.saturating_sub(EDGE_RESERVE) as i32
    }

    pub fn max_y(&self) -> i32 {
        self.height.saturating_sub(EDGE_RESERVE) as i32
    }

    pub fn clamp_x(&self, x: i32) -> i32 {
        x.clamp(0, self.max_x())
    }

    pub fn clamp_y(&self, y: i32) -> i32 {
        y.clamp(0, self.max_y())
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::REFERENCE
    }
}

pub fn clamp_font_size(size: u32) -> u32 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}
