use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::{
    application::{
        dto::{BatchItem, BatchOutcome, ErrorBody, ModelInfoResponse, UploadedImage},
        ports::{DetectorPort, ImageDecoderPort},
    },
    domain::{
        errors::{DomainError, DomainResult},
        model::InferenceConfig,
        product::{ProductResult, ResponseBuilder},
    },
};

/// Caso de uso de escaneo: decodificar → detectar → construir el resultado.
///
/// El detector se inyecta una vez al arrancar. Es `None` si el modelo no pudo
/// cargarse; en ese caso todo escaneo falla con [`DomainError::ModelUnavailable`].
#[derive(Clone)]
pub struct ScanService {
    detector: Option<Arc<dyn DetectorPort>>,
    decoder: Arc<dyn ImageDecoderPort>,
    builder: ResponseBuilder,
    inference: InferenceConfig,
}

impl ScanService {
    pub fn new(
        detector: Option<Arc<dyn DetectorPort>>,
        decoder: Arc<dyn ImageDecoderPort>,
        builder: ResponseBuilder,
        inference: InferenceConfig,
    ) -> Self {
        Self { detector, decoder, builder, inference }
    }

    pub fn model_loaded(&self) -> bool {
        self.detector.is_some()
    }

    pub fn model_path(&self) -> &str {
        &self.inference.model.onnx_path
    }

    pub fn model_info(&self) -> ModelInfoResponse {
        ModelInfoResponse {
            model: self.inference.model.clone(),
            model_loaded: self.model_loaded(),
            params: self.inference.params.clone(),
            categories: self.builder.heuristics().categories.names.clone(),
        }
    }

    pub async fn scan(&self, bytes: Vec<u8>) -> DomainResult<ProductResult> {
        let detector = self.detector.clone().ok_or(DomainError::ModelUnavailable)?;

        let started = Instant::now();
        let decoder = self.decoder.clone();
        let image = tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .map_err(|e| DomainError::OperationFailed(format!("decode task failed: {e}")))??;
        let (width, height) = image.dimensions();

        let detections = detector.detect(image).await?;
        let result = self.builder.build(&detections);

        debug!(
            width,
            height,
            detections = detections.len(),
            category = %result.category,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan complete"
        );
        Ok(result)
    }

    /// Escanea cada archivo en orden. Un archivo que falla se convierte en un
    /// elemento de error sin abortar el resto del lote.
    pub async fn scan_batch(&self, files: Vec<UploadedImage>) -> DomainResult<Vec<BatchItem>> {
        if !self.model_loaded() {
            return Err(DomainError::ModelUnavailable);
        }

        let mut items = Vec::with_capacity(files.len());
        for file in files {
            let outcome = match self.scan(file.bytes).await {
                Ok(result) => BatchOutcome::Scanned(result),
                Err(e) => {
                    warn!("⚠️ Falló el elemento del lote {}: {}", file.filename, e);
                    BatchOutcome::Failed(ErrorBody::new(e.to_string()))
                }
            };
            items.push(BatchItem { filename: file.filename, outcome });
        }
        Ok(items)
    }
}
