use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{
    errors::{DomainError, DomainResult},
    model::{ModelId, YoloParams},
    product::ProductResult,
};

/// JSON body accepted by `/predict` as an alternative to a multipart upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictImageRequest {
    #[serde(default)]
    pub image: Option<String>,
}

impl PredictImageRequest {
    /// Decodes the base64 payload. A data-URI header (`data:image/png;base64,`)
    /// is dropped up to the first comma, and line wrapping or other ASCII
    /// whitespace inside the payload is ignored.
    pub fn decode_image(&self) -> DomainResult<Vec<u8>> {
        let raw = self
            .image
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DomainError::InvalidInput("No image provided".into()))?;

        let payload = match raw.split_once(',') {
            Some((_, data)) => data,
            None => raw,
        };
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

        STANDARD
            .decode(compact)
            .map_err(|e| DomainError::InvalidInput(format!("invalid base64 image: {e}")))
    }
}

/// One file of a batch upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { success: false, error: error.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Scanned(ProductResult),
    Failed(ErrorBody),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub filename: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<BatchItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub model: ModelId,
    pub model_loaded: bool,
    pub params: YoloParams,
    pub categories: BTreeMap<usize, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}
