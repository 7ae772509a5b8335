use super::error::InfrastructureError;
use image::{ImageFormat as InnerImageFormat, RgbaImage};
use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

pub const PNG_CONTENT_TYPE: &str = "image/png";

pub fn encode_png(frame: &RgbaImage) -> Result<Vec<u8>, InfrastructureError> {
    let mut buffer = Cursor::new(Vec::new());
    frame
        .write_to(&mut buffer, InnerImageFormat::Png)
        .map_err(InfrastructureError::ImageLibError)?;
    Ok(buffer.into_inner())
}

/// `edited-image-<unix-epoch-ms>.png`
pub fn export_file_name(at: SystemTime) -> String {
    let millis = at.duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
    format!("edited-image-{}.png", millis)
}
