use thiserror::Error;

use crate::domain::font_family::FontFamily;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid color {0:?}: expected #rgb, #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    // The font directory has no face that can stand in for this family
    #[error("No font face available for {0}")]
    FontUnavailable(FontFamily),
}
