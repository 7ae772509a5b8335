use std::fmt;

use serde::{Deserialize, Serialize};

/// The font stacks offered by the font picker. Serialized as the CSS stack
/// string so clients can hand the value straight to a `font` declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    #[serde(rename = "Inter, sans-serif")]
    Inter,
    #[serde(rename = "Georgia, serif")]
    Georgia,
    #[serde(rename = "Courier New, monospace")]
    CourierNew,
    #[serde(rename = "Comic Sans MS, cursive")]
    ComicSans,
    #[serde(rename = "Impact, fantasy")]
    Impact,
}

impl FontFamily {
    pub const ALL: [FontFamily; 5] = [
        FontFamily::Inter,
        FontFamily::Georgia,
        FontFamily::CourierNew,
        FontFamily::ComicSans,
        FontFamily::Impact,
    ];

    pub fn css_stack(self) -> &'static str {
        match self {
            FontFamily::Inter => "Inter, sans-serif",
            FontFamily::Georgia => "Georgia, serif",
            FontFamily::CourierNew => "Courier New, monospace",
            FontFamily::ComicSans => "Comic Sans MS, cursive",
            FontFamily::Impact => "Impact, fantasy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FontFamily::Inter => "Default sans-serif",
            FontFamily::Georgia => "Serif",
            FontFamily::CourierNew => "Monospace",
            FontFamily::ComicSans => "Handwriting",
            FontFamily::Impact => "Bold display",
        }
    }

    /// Font file names tried in order when resolving this family against a
    /// fonts directory. The primary face comes first, then a generic face
    /// standing in for the CSS fallback keyword.
    pub fn candidate_files(self) -> &'static [&'static str] {
        match self {
            FontFamily::Inter => &["Inter-Regular.ttf", "Inter.ttf", "DejaVuSans.ttf"],
            FontFamily::Georgia => &["Georgia.ttf", "georgia.ttf", "DejaVuSerif.ttf"],
            FontFamily::CourierNew => &["Courier New.ttf", "cour.ttf", "DejaVuSansMono.ttf"],
            FontFamily::ComicSans => &["Comic Sans MS.ttf", "comic.ttf", "DejaVuSans.ttf"],
            FontFamily::Impact => &["Impact.ttf", "impact.ttf", "DejaVuSans-Bold.ttf"],
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_stack())
    }
}
