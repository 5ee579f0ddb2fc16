//! Jewelry detection service: a YOLO/ONNX detector behind an axum API that
//! reduces each image to a single product result.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;

/// Installs the fmt subscriber, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
