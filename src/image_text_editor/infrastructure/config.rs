use super::image_decoder::DecodeLimits;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime settings. Every flag can also come from an `EDITOR_*` variable.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Image text overlay editor server", long_about = None)]
pub struct Settings {
    /// Address the HTTP server listens on
    #[arg(long, env = "EDITOR_BIND", default_value = "0.0.0.0:3300")]
    pub bind: SocketAddr,

    /// Directory holding the .ttf/.otf faces used for overlays; a system face
    /// is used when it has none
    #[arg(long, env = "EDITOR_FONTS_DIR", default_value = "fonts")]
    pub fonts_dir: PathBuf,

    /// Front-end build served for every non-API path
    #[arg(long, env = "EDITOR_STATIC_DIR", default_value = "frontend/build")]
    pub static_dir: PathBuf,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "EDITOR_MAX_UPLOAD_BYTES", default_value_t = 20 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Largest accepted image width or height, in pixels
    #[arg(long, env = "EDITOR_MAX_IMAGE_DIMENSION", default_value_t = 16_384)]
    pub max_image_dimension: u32,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "EDITOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "EDITOR_LOG_JSON")]
    pub log_json: bool,
}

impl Settings {
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits { max_dimension: self.max_image_dimension }
    }
}
