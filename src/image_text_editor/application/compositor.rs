use crate::domain::bitmap::Bitmap;
use crate::domain::canvas::CanvasSize;
use crate::domain::color::Color;
use crate::domain::draw_target::{DrawTarget, TextShadow};
use crate::domain::error::DomainError;
use crate::domain::layout::{line_offsets, CoverFit};
use crate::domain::overlay_style::OverlayStyle;

/// Everything a frame depends on. Rendering the same scene twice yields the
/// same pixels.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub canvas: CanvasSize,
    pub bitmap: Option<&'a Bitmap>,
    pub title: &'a OverlayStyle,
    pub content: &'a OverlayStyle,
}

/// Draws the whole frame from scratch: background, cover-fitted bitmap, title,
/// then content on top.
pub fn compose<T: DrawTarget + ?Sized>(
    scene: &Scene<'_>,
    target: &mut T,
) -> Result<(), DomainError> {
    target.fill_background(Color::BACKGROUND);

    if let Some(bitmap) = scene.bitmap {
        let placement = CoverFit::compute(scene.canvas, bitmap.width(), bitmap.height());
        tracing::trace!(
            scale = placement.scale,
            draw_x = placement.draw_x,
            draw_y = placement.draw_y,
            "Drawing cover-fitted bitmap"
        );
        target.draw_bitmap(bitmap, &placement);
    }

    if scene.title.is_visible() {
        // A title is a single line. Like canvas fillText, every line break
        // character becomes its own space, so "\r\n" draws two.
        let line = scene.title.text.replace(['\n', '\r'], " ");
        draw_block(target, scene.title, std::iter::once(line.as_str()))?;
    }

    if scene.content.is_visible() {
        let lines = scene
            .content
            .text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line));
        draw_block(target, scene.content, lines)?;
    }

    Ok(())
}

fn draw_block<'l, T: DrawTarget + ?Sized>(
    target: &mut T,
    style: &OverlayStyle,
    lines: impl Iterator<Item = &'l str>,
) -> Result<(), DomainError> {
    tracing::trace!(font = %style.css_font(), x = style.x, y = style.y, "Drawing text block");
    target.set_font(style.font_size, style.font_family);
    target.set_fill_color(style.color);
    target.set_shadow(Some(TextShadow::LEGIBILITY));

    let lines: Vec<&str> = lines.collect();
    let result = lines
        .iter()
        .zip(line_offsets(style.y, style.font_size, lines.len()))
        .try_for_each(|(line, y)| target.fill_text(line, style.x, y));

    // Reset even on failure so a shadow never leaks into later drawing
    target.set_shadow(None);
    result
}
