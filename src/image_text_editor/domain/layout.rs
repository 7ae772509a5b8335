use crate::domain::canvas::CanvasSize;

/// Extra vertical space between consecutive content lines, on top of the font size.
pub const LINE_GAP: i32 = 10;

/// Placement of a bitmap scaled so that it covers the whole canvas. The axis
/// that overflows is cropped evenly on both sides; nothing is letterboxed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    pub scale: f64,
    pub draw_x: f64,
    pub draw_y: f64,
    pub draw_width: f64,
    pub draw_height: f64,
}

impl CoverFit {
    pub fn compute(canvas: CanvasSize, bitmap_width: u32, bitmap_height: u32) -> Self {
        let (cw, ch) = (canvas.width as f64, canvas.height as f64);
        // Decoders never hand out zero-sized images, but keep the division sane
        let (bw, bh) = (bitmap_width.max(1) as f64, bitmap_height.max(1) as f64);

        let scale = (cw / bw).max(ch / bh);
        let draw_width = bw * scale;
        let draw_height = bh * scale;
        Self {
            scale,
            draw_x: (cw - draw_width) / 2.0,
            draw_y: (ch - draw_height) / 2.0,
            draw_width,
            draw_height,
        }
    }
}

/// Top anchor of every line of a multi-line block.
pub fn line_offsets(y: i32, font_size: u32, line_count: usize) -> impl Iterator<Item = i32> {
    let step = font_size as i32 + LINE_GAP;
    (0..line_count).map(move |i| {
        let i = i32::try_from(i).unwrap_or(i32::MAX);
        y.saturating_add(i.saturating_mul(step))
    })
}
