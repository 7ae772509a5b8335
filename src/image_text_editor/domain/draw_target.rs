use crate::domain::bitmap::Bitmap;
use crate::domain::color::Color;
use crate::domain::error::DomainError;
use crate::domain::font_family::FontFamily;
use crate::domain::layout::CoverFit;

/// Drop shadow applied to text while it is set on a [`DrawTarget`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextShadow {
    pub color: Color,
    pub blur: f32,
    pub offset_x: i32,
    pub offset_y: i32,
}

impl TextShadow {
    /// Dark, soft shadow that keeps light text readable over busy photos.
    pub const LEGIBILITY: TextShadow = TextShadow {
        color: Color::new(0, 0, 0, 204),
        blur: 10.0,
        offset_x: 2,
        offset_y: 2,
    };
}

/// The slice of a 2D canvas API the compositor draws through. Font, fill color
/// and shadow are sticky state, like on an HTML canvas context: they stay in
/// effect until set again.
#[cfg_attr(test, mockall::automock)]
pub trait DrawTarget {
    fn fill_background(&mut self, color: Color);

    fn draw_bitmap(&mut self, bitmap: &Bitmap, placement: &CoverFit);

    fn set_font(&mut self, size: u32, family: FontFamily);

    fn set_fill_color(&mut self, color: Color);

    fn set_shadow(&mut self, shadow: Option<TextShadow>);

    /// Draws one line of text with its top edge at `y`.
    fn fill_text(&mut self, text: &str, x: i32, y: i32) -> Result<(), DomainError>;
}
