use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::canvas::{clamp_font_size, CanvasSize};
use crate::domain::color::Color;
use crate::domain::font_family::FontFamily;

/// One positioned, styled block of text drawn over the background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub text: String,
    pub x: i32,
    pub y: i32,
    pub font_size: u32,
    pub font_family: FontFamily,
    pub color: Color,
}

impl OverlayStyle {
    pub fn default_title() -> Self {
        Self {
            text: String::new(),
            x: 50,
            y: 100,
            font_size: 48,
            font_family: FontFamily::Inter,
            color: Color::WHITE,
        }
    }

    pub fn default_content() -> Self {
        Self {
            text: String::new(),
            x: 50,
            y: 200,
            font_size: 24,
            font_family: FontFamily::Inter,
            color: Color::WHITE,
        }
    }

    /// Canvas-style font shorthand, e.g. `48px Inter, sans-serif`.
    pub fn css_font(&self) -> String {
        format!("{}px {}", self.font_size, self.font_family.css_stack())
    }

    pub fn is_visible(&self) -> bool {
        !self.text.is_empty()
    }

    /// Returns a copy with the patch applied and every numeric field clamped to
    /// the range the canvas allows.
    pub fn apply(&self, patch: &OverlayPatch, canvas: CanvasSize) -> Self {
        let mut next = self.clone();
        if let Some(text) = &patch.text {
            next.text = text.clone();
        }
        if let Some(x) = patch.x {
            next.x = x;
        }
        if let Some(y) = patch.y {
            next.y = y;
        }
        if let Some(font_size) = patch.font_size {
            next.font_size = font_size;
        }
        if let Some(font_family) = patch.font_family {
            next.font_family = font_family;
        }
        if let Some(color) = patch.color {
            next.color = color;
        }

        next.x = canvas.clamp_x(next.x);
        next.y = canvas.clamp_y(next.y);
        next.font_size = clamp_font_size(next.font_size);
        next
    }
}

/// Partial update of an [`OverlayStyle`]; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverlayPatch {
    pub text: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub font_size: Option<u32>,
    pub font_family: Option<FontFamily>,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlaySlot {
    Title,
    Content,
}

impl fmt::Display for OverlaySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlaySlot::Title => f.write_str("title"),
            OverlaySlot::Content => f.write_str("content"),
        }
    }
}
