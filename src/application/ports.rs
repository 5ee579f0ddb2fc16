use async_trait::async_trait;
use image::RgbImage;

use crate::domain::{detection::RawDetection, errors::DomainResult, model::ModelId};

/// Detector de objetos sobre píxeles ya decodificados.
/// Las implementaciones deben tolerar llamadas desde peticiones concurrentes.
#[async_trait]
pub trait DetectorPort: Send + Sync {
    async fn detect(&self, image: RgbImage) -> DomainResult<Vec<RawDetection>>;
}

pub trait ImageDecoderPort: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> DomainResult<RgbImage>;
}

#[async_trait]
pub trait ModelCatalogPort: Send + Sync {
    async fn validate_model(&self, model: &ModelId) -> DomainResult<()>;
}
