use axum::{
    extract::{multipart::MultipartRejection, FromRequest, Multipart, Request, State},
    http::header,
    Json,
};
use tracing::debug;

use crate::adapters::http::error::{ApiError, ApiResult};
use crate::adapters::http::state::HttpState;
use crate::application::dto::{
    BatchResponse, HealthResponse, ModelInfoResponse, PredictImageRequest, RootResponse, UploadedImage,
};
use crate::domain::{errors::DomainError, product::ProductResult};

const IMAGE_FIELD: &str = "image";
const BATCH_FIELD: &str = "images";

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse { message: "Jewelry Scanner API - running".to_string() })
}

pub async fn health(State(st): State<HttpState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: st.scan.model_loaded(),
        model_path: st.scan.model_path().to_string(),
    })
}

pub async fn model_info(State(st): State<HttpState>) -> Json<ModelInfoResponse> {
    Json(st.scan.model_info())
}

/// `POST /predict` with either a multipart `image` file or `{"image": "<base64>"}`.
pub async fn predict(State(st): State<HttpState>, req: Request) -> ApiResult<Json<ProductResult>> {
    let bytes = read_image(req).await?;
    debug!("predict: {} bytes received", bytes.len());
    Ok(Json(st.scan.scan(bytes).await?))
}

pub async fn predict_batch(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<BatchResponse>> {
    let mut multipart = multipart?;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(BATCH_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await?;
        files.push(UploadedImage { filename, bytes: bytes.to_vec() });
    }

    if files.is_empty() {
        return Err(DomainError::InvalidInput("No images provided".into()).into());
    }

    debug!("predict_batch: {} files", files.len());
    let results = st.scan.scan_batch(files).await?;
    Ok(Json(BatchResponse { results }))
}

async fn read_image(req: Request) -> ApiResult<Vec<u8>> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &()).await?;
        while let Some(field) = multipart.next_field().await? {
            if field.name() == Some(IMAGE_FIELD) {
                return Ok(field.bytes().await?.to_vec());
            }
        }
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<PredictImageRequest>::from_request(req, &()).await?;
        return Ok(body.decode_image()?);
    }

    Err(ApiError::Domain(DomainError::InvalidInput("No image provided".into())))
}
