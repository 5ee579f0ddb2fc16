pub mod error;
pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, routing::{get, post}, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::adapters::http::state::HttpState;

#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// `*` permite cualquier origen.
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            cors_origins: vec!["*".to_string()],
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

pub fn router(state: HttpState, options: &HttpOptions) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/model", get(routes::model_info))
        .route("/predict", post(routes::predict))
        .route("/predict_batch", post(routes::predict_batch))
        .layer(DefaultBodyLimit::max(options.max_body_bytes))
        .layer(cors_layer(&options.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("⚠️ Origen CORS inválido ignorado: {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
