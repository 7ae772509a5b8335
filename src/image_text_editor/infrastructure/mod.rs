pub mod axum_handler;
pub mod config;
pub mod error;
pub mod font_book;
pub mod image_decoder;
pub mod logging;
pub mod png_exporter;
pub mod raster_surface;
