use super::error::InfrastructureError;
use crate::domain::bitmap::Bitmap;
use crate::domain::image_decoder_trait::ImageDecoder;
use image::ImageFormat as InnerImageFormat;
use std::io::Cursor;

pub const ACCEPTED_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Raw bytes of an upload together with the media type the client declared.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUpload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeLimits {
    pub max_dimension: u32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self { max_dimension: 16_384 }
    }
}

pub struct DefaultImageDecoder {
    limits: DecodeLimits,
}

impl DefaultImageDecoder {
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    fn check_dimensions(&self, bytes: &[u8]) -> Result<(), InfrastructureError> {
        let (width, height) = image::io::Reader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        let limit = self.limits.max_dimension;
        if width > limit || height > limit {
            return Err(InfrastructureError::ImageTooLarge { width, height, limit });
        }
        Ok(())
    }
}

/// Strips parameters (`; charset=...`) and checks the type is one we accept.
fn accepted_mime(mime_type: &str) -> Result<String, InfrastructureError> {
    let essence = mime_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if ACCEPTED_MIME_TYPES.contains(&essence.as_str()) {
        Ok(essence)
    } else {
        Err(InfrastructureError::UnsupportedFormat(mime_type.to_string()))
    }
}

impl ImageDecoder for DefaultImageDecoder {
    fn decode(&self, mime_type: &str, bytes: &[u8]) -> Result<Bitmap, InfrastructureError> {
        accepted_mime(mime_type)?;

        // The declared type only gates the upload; the content decides the codec,
        // so a PNG labelled image/jpeg still decodes like it would in a browser.
        let reader = image::io::Reader::new(Cursor::new(bytes)).with_guessed_format()?;
        match reader.format() {
            Some(InnerImageFormat::Png) | Some(InnerImageFormat::Jpeg) => {}
            Some(other) => {
                return Err(InfrastructureError::UnsupportedFormat(format!("{:?}", other)))
            }
            None => {
                return Err(InfrastructureError::DecodingError(
                    "unrecognised image data".to_string(),
                ))
            }
        }

        self.check_dimensions(bytes)?;
        let image = reader.decode()?;
        tracing::debug!(width = image.width(), height = image.height(), "Decoded upload");
        Ok(Bitmap::new(image.to_rgba8()))
    }
}

/// Splits a `data:<mime>;base64,<payload>` URL, as produced by a browser
/// FileReader, into its media type and decoded bytes.
pub fn decode_data_url(url: &str) -> Result<RawUpload, InfrastructureError> {
    let invalid =
        |why: &str| InfrastructureError::DecodingError(format!("Invalid data URL: {}", why));
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| invalid("missing data: scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("missing comma"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("payload is not base64"))?;

    let bytes = base64::decode(payload.trim()).map_err(InfrastructureError::Base64DecodeError)?;
    Ok(RawUpload { mime_type: mime_type.to_string(), bytes })
}
