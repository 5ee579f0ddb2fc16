//! HTTP surface tests: the real router, decoder and response builder with a
//! scripted detector standing in for the ONNX model.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

use jewel_scanner::adapters::http::{router, state::HttpState, HttpOptions};
use jewel_scanner::adapters::imaging::decoder::ImageCrateDecoder;
use jewel_scanner::application::{ports::DetectorPort, services::ScanService};
use jewel_scanner::domain::{
    detection::{BoundingBox, RawDetection},
    errors::{DomainError, DomainResult},
    heuristics::Heuristics,
    model::{InferenceConfig, ModelId, YoloParams},
    product::ResponseBuilder,
};

const BOUNDARY: &str = "jewelscannerboundary";

struct ScriptedDetector(Vec<RawDetection>);

#[async_trait]
impl DetectorPort for ScriptedDetector {
    async fn detect(&self, _image: RgbImage) -> DomainResult<Vec<RawDetection>> {
        Ok(self.0.clone())
    }
}

struct BrokenDetector;

#[async_trait]
impl DetectorPort for BrokenDetector {
    async fn detect(&self, _image: RgbImage) -> DomainResult<Vec<RawDetection>> {
        Err(DomainError::Inference("tensor shape mismatch".into()))
    }
}

fn det(class_id: usize, confidence: f32) -> RawDetection {
    RawDetection::new(class_id, confidence, BoundingBox { x1: 2.0, y1: 3.0, x2: 20.0, y2: 30.0 })
}

fn app(detector: Option<Arc<dyn DetectorPort>>) -> Router {
    app_with_options(detector, &HttpOptions::default())
}

fn app_with_options(detector: Option<Arc<dyn DetectorPort>>, options: &HttpOptions) -> Router {
    let scan = ScanService::new(
        detector,
        Arc::new(ImageCrateDecoder::new()),
        ResponseBuilder::new(Arc::new(Heuristics::default())),
        InferenceConfig {
            model: ModelId::from_path("models/test.onnx"),
            params: YoloParams::default(),
        },
    );
    router(HttpState { scan: Arc::new(scan) }, options)
}

fn app_detecting(detections: Vec<RawDetection>) -> Router {
    app(Some(Arc::new(ScriptedDetector(detections))))
}

fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb([200, 180, 40]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn multipart_request(uri: &str, field: &str, files: &[(&str, Vec<u8>)]) -> Request<Body> {
    let mut body = Vec::new();
    for (filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, json: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_model_state() {
    let (status, body) = send(app_detecting(vec![]), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_path"], "models/test.onnx");

    let (_, body) = send(app(None), get("/health")).await;
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn root_and_model_info() {
    let (status, body) = send(app_detecting(vec![]), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Jewelry Scanner"));

    let (status, body) = send(app_detecting(vec![]), get("/model")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"]["name"], "test");
    assert_eq!(body["params"]["input_size"], 640);
    assert_eq!(body["categories"]["1"], "Necklace");
}

#[tokio::test]
async fn predict_multipart_selects_best_detection() {
    let app = app_detecting(vec![det(0, 0.9), det(1, 0.95)]);
    let request = multipart_request("/predict", "image", &[("ring.png", png_bytes())]);

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["product_name"], "Necklace");
    assert_eq!(body["category"], "Necklace");
    assert!((body["confidence"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    assert_eq!(body["authenticity"], "High Confidence - Likely Authentic");
    assert_eq!(body["detections"].as_array().unwrap().len(), 2);
    assert_eq!(body["detections"][0]["category"], "Ring");
}

#[tokio::test]
async fn predict_json_base64_with_data_uri() {
    let app = app_detecting(vec![det(99, 0.5)]);
    let payload = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));

    let (status, body) = send(app, json_request("/predict", serde_json::json!({ "image": payload }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "Class_99");
    assert_eq!(body["authenticity"], "Low Confidence - Expert Review Recommended");
    assert_eq!(body["estimated_value"], "$375.00 - $562.50");
}

#[tokio::test]
async fn predict_without_detections_returns_sentinel() {
    let app = app_detecting(vec![]);
    let request = multipart_request("/predict", "image", &[("empty.png", png_bytes())]);

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["product_name"], "No jewelry detected");
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["estimated_value"], "N/A");
}

#[tokio::test]
async fn predict_without_image_is_bad_request() {
    let (status, body) = send(app_detecting(vec![]), json_request("/predict", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("No image provided"));

    let request = multipart_request("/predict", "photo", &[("x.png", png_bytes())]);
    let (status, _) = send(app_detecting(vec![]), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let plain = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello"))
        .unwrap();
    let (status, _) = send(app_detecting(vec![]), plain).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn predict_with_undecodable_image_is_bad_request() {
    let request = multipart_request("/predict", "image", &[("bad.png", b"not really a png".to_vec())]);
    let (status, body) = send(app_detecting(vec![det(0, 0.9)]), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("decode"));
}

#[tokio::test]
async fn predict_without_model_is_unavailable() {
    let request = multipart_request("/predict", "image", &[("ring.png", png_bytes())]);
    let (status, body) = send(app(None), request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Model not loaded");
}

#[tokio::test]
async fn inference_failure_is_server_error() {
    let request = multipart_request("/predict", "image", &[("ring.png", png_bytes())]);
    let (status, body) = send(app(Some(Arc::new(BrokenDetector))), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("tensor shape mismatch"));
}

#[tokio::test]
async fn batch_keeps_per_file_results() {
    let app = app_detecting(vec![det(2, 0.7)]);
    let request = multipart_request(
        "/predict_batch",
        "images",
        &[("a.png", png_bytes()), ("broken.jpg", b"garbage".to_vec()), ("c.png", png_bytes())],
    );

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0]["filename"], "a.png");
    assert_eq!(results[0]["category"], "Earring");
    assert_eq!(results[0]["authenticity"], "Medium Confidence - Needs Verification");

    assert_eq!(results[1]["filename"], "broken.jpg");
    assert_eq!(results[1]["success"], false);
    assert!(results[1]["error"].is_string());

    assert_eq!(results[2]["filename"], "c.png");
    assert_eq!(results[2]["success"], true);
}

#[tokio::test]
async fn batch_without_images_is_bad_request() {
    let request = multipart_request("/predict_batch", "image", &[("a.png", png_bytes())]);
    let (status, body) = send(app_detecting(vec![]), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("No images provided"));

    let (status, body) = send(app_detecting(vec![]), json_request("/predict_batch", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let options = HttpOptions { max_body_bytes: 1024, ..HttpOptions::default() };
    let detector: Arc<dyn DetectorPort> = Arc::new(ScriptedDetector(vec![det(0, 0.9)]));

    let request = multipart_request("/predict", "image", &[("big.png", vec![0u8; 4096])]);
    let (status, body) = send(app_with_options(Some(detector.clone()), &options), request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);

    let request = multipart_request("/predict_batch", "images", &[("big.png", vec![0u8; 4096])]);
    let (status, _) = send(app_with_options(Some(detector.clone()), &options), request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let payload = STANDARD.encode(vec![0u8; 4096]);
    let request = json_request("/predict", serde_json::json!({ "image": payload }));
    let (status, _) = send(app_with_options(Some(detector), &options), request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn small_upload_fits_under_custom_limit() {
    let options = HttpOptions { max_body_bytes: 64 * 1024, ..HttpOptions::default() };
    let app = app_with_options(Some(Arc::new(ScriptedDetector(vec![det(1, 0.9)]))), &options);
    let request = multipart_request("/predict", "image", &[("ring.png", png_bytes())]);
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "Necklace");
}

fn with_origin(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn cors_origin_list_is_enforced() {
    let options = HttpOptions {
        cors_origins: vec!["http://shop.test".to_string(), "http://admin.test".to_string()],
        ..HttpOptions::default()
    };

    let response = app_with_options(None, &options)
        .oneshot(with_origin("/health", "http://admin.test"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://admin.test"
    );

    let response = app_with_options(None, &options)
        .oneshot(with_origin("/health", "http://evil.test"))
        .await
        .unwrap();
    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn cors_wildcard_allows_any_origin() {
    let response = app(None)
        .oneshot(with_origin("/health", "http://anywhere.test"))
        .await
        .unwrap();
    assert_eq!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
}

#[test]
fn shipped_heuristics_file_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/heuristics.php.json");
    let h = jewel_scanner::config::load_heuristics(&path).unwrap();
    assert_eq!(h.categories.resolve(4), "Watch");
    assert_eq!(h.valuation.estimate("Ring", 1.0).to_string(), "₱5,000.00 - ₱7,500.00");
}
