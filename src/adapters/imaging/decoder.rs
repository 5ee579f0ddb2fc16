use image::RgbImage;

use crate::application::ports::ImageDecoderPort;
use crate::domain::errors::{DomainError, DomainResult};

/// Decodes any format the `image` crate recognises into RGB8.
#[derive(Debug, Default, Clone)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    pub fn new() -> Self { Self }
}

impl ImageDecoderPort for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> DomainResult<RgbImage> {
        if bytes.is_empty() {
            return Err(DomainError::InvalidInput("image is empty".into()));
        }
        let img = image::load_from_memory(bytes).map_err(|e| DomainError::Decode(e.to_string()))?;
        Ok(img.to_rgb8())
    }
}
