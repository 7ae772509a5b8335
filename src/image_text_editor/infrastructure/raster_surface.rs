use super::font_book::FontBook;
use crate::domain::bitmap::Bitmap;
use crate::domain::canvas::CanvasSize;
use crate::domain::color::Color;
use crate::domain::draw_target::{DrawTarget, TextShadow};
use crate::domain::error::DomainError;
use crate::domain::font_family::FontFamily;
use crate::domain::layout::CoverFit;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::rect::Rect;
use rusttype::{point, Font, PositionedGlyph, Scale};

/// A [`DrawTarget`] that paints into an RGBA pixel buffer.
pub struct RasterSurface<'f> {
    frame: RgbaImage,
    fonts: &'f FontBook,
    font: (u32, FontFamily),
    fill: Color,
    shadow: Option<TextShadow>,
}

impl<'f> RasterSurface<'f> {
    pub fn new(canvas: CanvasSize, fonts: &'f FontBook) -> Self {
        Self {
            frame: RgbaImage::new(canvas.width, canvas.height),
            fonts,
            font: (10, FontFamily::default()),
            fill: Color::new(0, 0, 0, 255),
            shadow: None,
        }
    }

    pub fn into_frame(self) -> RgbaImage {
        self.frame
    }
}

impl DrawTarget for RasterSurface<'_> {
    fn fill_background(&mut self, color: Color) {
        let (w, h) = self.frame.dimensions();
        draw_filled_rect_mut(&mut self.frame, Rect::at(0, 0).of_size(w, h), color.to_rgba());
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, placement: &CoverFit) {
        let (frame_w, frame_h) = (self.frame.width() as f64, self.frame.height() as f64);

        // Only the part of the scaled bitmap that lands on the frame is resampled
        let dest_x0 = placement.draw_x.max(0.0).floor();
        let dest_y0 = placement.draw_y.max(0.0).floor();
        let dest_x1 = (placement.draw_x + placement.draw_width).min(frame_w).ceil();
        let dest_y1 = (placement.draw_y + placement.draw_height).min(frame_h).ceil();
        if dest_x1 <= dest_x0 || dest_y1 <= dest_y0 || placement.scale <= 0.0 {
            return;
        }

        let src = bitmap.pixels();
        let (src_w, src_h) = (src.width(), src.height());
        if src_w == 0 || src_h == 0 {
            return;
        }
        let to_src = |dest: f64, origin: f64| (dest - origin) / placement.scale;
        let sx0 = (to_src(dest_x0, placement.draw_x).floor().max(0.0) as u32).min(src_w - 1);
        let sy0 = (to_src(dest_y0, placement.draw_y).floor().max(0.0) as u32).min(src_h - 1);
        let sx1 = (to_src(dest_x1, placement.draw_x).ceil() as u32).clamp(sx0 + 1, src_w);
        let sy1 = (to_src(dest_y1, placement.draw_y).ceil() as u32).clamp(sy0 + 1, src_h);

        let region = imageops::crop_imm(src, sx0, sy0, sx1 - sx0, sy1 - sy0).to_image();
        let dest_w = (dest_x1 - dest_x0) as u32;
        let dest_h = (dest_y1 - dest_y0) as u32;
        let scaled = imageops::resize(&region, dest_w, dest_h, FilterType::Triangle);
        composite_over(&mut self.frame, &scaled, dest_x0 as i64, dest_y0 as i64);
    }

    fn set_font(&mut self, size: u32, family: FontFamily) {
        self.font = (size, family);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn set_shadow(&mut self, shadow: Option<TextShadow>) {
        self.shadow = shadow;
    }

    fn fill_text(&mut self, text: &str, x: i32, y: i32) -> Result<(), DomainError> {
        let fonts = self.fonts;
        let (size, family) = self.font;
        let font = fonts.resolve(family)?;
        let scale = em_scale(font, size as f32);
        let frame = Bounds::of_frame(&self.frame);

        // How far the shadow can reach beyond the glyphs themselves
        let spread = self.shadow.map(shadow_spread).unwrap_or(0);
        if !line_may_touch(frame, font, scale, x, y, spread) {
            return Ok(());
        }

        let glyphs = layout_line(font, scale, x, y, frame.max_x.saturating_add(spread), text);
        let Some(bounds) = Bounds::of_glyphs(&glyphs) else {
            return Ok(());
        };

        if let Some(shadow) = self.shadow {
            let pad = blur_padding(shadow.blur);
            let region = bounds
                .translate(shadow.offset_x, shadow.offset_y)
                .pad(pad)
                .intersect(frame.pad(pad));
            if let Some(region) = region {
                let mut layer = RgbaImage::new(region.width(), region.height());
                blend_glyphs(
                    &mut layer,
                    &glyphs,
                    shadow.offset_x - region.min_x,
                    shadow.offset_y - region.min_y,
                    shadow.color,
                );
                // Canvas shadowBlur is twice the gaussian standard deviation
                let sigma = shadow.blur / 2.0;
                if sigma > 0.0 {
                    layer = gaussian_blur_f32(&layer, sigma);
                }
                composite_over(&mut self.frame, &layer, region.min_x as i64, region.min_y as i64);
            }
        }

        if bounds.intersect(frame).is_some() {
            blend_glyphs(&mut self.frame, &glyphs, 0, 0, self.fill);
        }
        Ok(())
    }
}

/// Pixel rectangle, min inclusive and max exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl Bounds {
    fn of_frame(frame: &RgbaImage) -> Self {
        Self { min_x: 0, min_y: 0, max_x: frame.width() as i32, max_y: frame.height() as i32 }
    }

    fn of_glyphs(glyphs: &[PositionedGlyph<'_>]) -> Option<Self> {
        glyphs
            .iter()
            .filter_map(|g| g.pixel_bounding_box())
            .map(|bb| Self { min_x: bb.min.x, min_y: bb.min.y, max_x: bb.max.x, max_y: bb.max.y })
            .reduce(|a, b| Self {
                min_x: a.min_x.min(b.min_x),
                min_y: a.min_y.min(b.min_y),
                max_x: a.max_x.max(b.max_x),
                max_y: a.max_y.max(b.max_y),
            })
    }

    fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            min_x: self.min_x.saturating_add(dx),
            min_y: self.min_y.saturating_add(dy),
            max_x: self.max_x.saturating_add(dx),
            max_y: self.max_y.saturating_add(dy),
        }
    }

    fn pad(self, by: i32) -> Self {
        Self {
            min_x: self.min_x.saturating_sub(by),
            min_y: self.min_y.saturating_sub(by),
            max_x: self.max_x.saturating_add(by),
            max_y: self.max_y.saturating_add(by),
        }
    }

    fn intersect(self, other: Self) -> Option<Self> {
        let clipped = Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        (clipped.min_x < clipped.max_x && clipped.min_y < clipped.max_y).then_some(clipped)
    }

    fn width(&self) -> u32 {
        (self.max_x - self.min_x) as u32
    }

    fn height(&self) -> u32 {
        (self.max_y - self.min_y) as u32
    }
}

/// Gaussian kernels are negligible past three standard deviations.
fn blur_padding(blur: f32) -> i32 {
    (1.5 * blur.max(0.0)).ceil() as i32
}

fn shadow_spread(shadow: TextShadow) -> i32 {
    blur_padding(shadow.blur) + shadow.offset_x.abs().max(shadow.offset_y.abs())
}

/// Cheap vertical and right-edge test done before any glyph is laid out.
/// A whole line height of slack covers glyphs that overshoot the ascent or
/// descent.
fn line_may_touch(
    frame: Bounds,
    font: &Font<'_>,
    scale: Scale,
    x: i32,
    y: i32,
    spread: i32,
) -> bool {
    let v = font.v_metrics(scale);
    let line_height = (v.ascent - v.descent).ceil().max(1.0) as i32;
    let slack = spread.saturating_add(line_height);
    y.saturating_sub(slack) < frame.max_y
        && y.saturating_add(line_height).saturating_add(slack) > frame.min_y
        && x.saturating_sub(spread) < frame.max_x
}

/// rusttype scales by ascent-to-descent height; CSS font sizes are em sizes.
fn em_scale(font: &Font<'_>, px: f32) -> Scale {
    let units_per_em = font.units_per_em() as f32;
    let v = font.v_metrics_unscaled();
    let height = v.ascent - v.descent;
    if units_per_em <= 0.0 || height <= 0.0 {
        return Scale::uniform(px);
    }
    Scale::uniform(px * height / units_per_em)
}

/// Lays out one line with its top edge at `y` (baseline at y + ascent).
/// Layout stops at the first glyph whose pen position is past `max_x`.
fn layout_line<'f>(
    font: &Font<'f>,
    scale: Scale,
    x: i32,
    y: i32,
    max_x: i32,
    text: &str,
) -> Vec<PositionedGlyph<'f>> {
    let origin = point(x as f32, y as f32 + font.v_metrics(scale).ascent);
    font.layout(text, scale, origin)
        .take_while(|glyph| glyph.position().x < max_x as f32)
        .collect()
}

/// Blends laid-out glyphs into `img`, shifted by (dx, dy).
fn blend_glyphs(
    img: &mut RgbaImage,
    glyphs: &[PositionedGlyph<'_>],
    dx: i32,
    dy: i32,
    color: Color,
) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let opacity = color.a as f32 / 255.0;

    for glyph in glyphs {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = gx as i32 + bb.min.x + dx;
            let py = gy as i32 + bb.min.y + dy;
            if px < 0 || py < 0 || px >= w || py >= h {
                return;
            }
            let alpha = coverage.min(1.0) * opacity;
            if alpha <= 0.0 {
                return;
            }
            blend_pixel(img.get_pixel_mut(px as u32, py as u32), color, alpha);
        });
    }
}

/// Source-over composite of `top` onto `bottom` with its origin at (x, y).
fn composite_over(bottom: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let (bw, bh) = (bottom.width() as i64, bottom.height() as i64);
    for (tx, ty, p) in top.enumerate_pixels() {
        let (px, py) = (x + tx as i64, y + ty as i64);
        if p[3] == 0 || px < 0 || py < 0 || px >= bw || py >= bh {
            continue;
        }
        let color = Color::new(p[0], p[1], p[2], 255);
        blend_pixel(bottom.get_pixel_mut(px as u32, py as u32), color, p[3] as f32 / 255.0);
    }
}

fn blend_pixel(dst: &mut Rgba<u8>, color: Color, src_a: f32) {
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    let mix = |s: u8, d: u8| {
        ((s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        mix(color.r, dst[0]),
        mix(color.g, dst[1]),
        mix(color.b, dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}
