use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("Unsupported image type {0:?}: only image/jpeg and image/png are accepted")]
    UnsupportedFormat(String),

    #[error("Image is {width}x{height}, larger than the {limit}px limit")]
    ImageTooLarge { width: u32, height: u32, limit: u32 },

    #[error("Data decoding failed: {0}")]
    DecodingError(String),

    #[error("Underlying image library error: {0}")]
    ImageLibError(#[from] image::ImageError),

    #[error("Underlying I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),
}
