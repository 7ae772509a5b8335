use crate::domain::bitmap::Bitmap;
use crate::infrastructure::error::InfrastructureError;

/// Turns the raw bytes of an upload into a drawable bitmap.
#[cfg_attr(test, mockall::automock)]
pub trait ImageDecoder {
    fn decode(&self, mime_type: &str, bytes: &[u8]) -> Result<Bitmap, InfrastructureError>;
}
