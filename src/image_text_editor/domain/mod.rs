pub mod bitmap;
pub mod canvas;
pub mod color;
pub mod draw_target;
pub mod error;
pub mod font_family;
pub mod image_decoder_trait;
pub mod layout;
pub mod overlay_style;
