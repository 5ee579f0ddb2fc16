//! Process configuration.
//!
//! Server settings come from `SCANNER_*` environment variables; the result
//! heuristics (category names, authenticity bands, value table) come from an
//! optional JSON file so they can be retuned without a rebuild.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::adapters::http::HttpOptions;
use crate::domain::{
    errors::DomainError,
    heuristics::Heuristics,
    model::{InferenceConfig, ModelId, YoloParams},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid heuristics: {0}")]
    Invalid(#[from] DomainError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub model_path: String,
    pub params: YoloParams,
    pub http: HttpOptions,
    pub heuristics_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: "models/best.onnx".to_string(),
            params: YoloParams::default(),
            http: HttpOptions::default(),
            heuristics_path: None,
        }
    }
}

impl AppConfig {
    /// Reads `SCANNER_*` after loading a `.env` from the working directory, if any.
    /// Variables already exported take precedence over the file.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unparseable values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();

        Self {
            host: lookup("SCANNER_HOST").unwrap_or(d.host),
            port: parse_or(&lookup, "SCANNER_PORT", d.port),
            model_path: lookup("SCANNER_MODEL_PATH").unwrap_or(d.model_path),
            params: YoloParams {
                input_size: parse_or(&lookup, "SCANNER_INPUT_SIZE", d.params.input_size),
                conf_threshold: parse_or(&lookup, "SCANNER_CONF_THRESHOLD", d.params.conf_threshold),
                iou_threshold: parse_or(&lookup, "SCANNER_IOU_THRESHOLD", d.params.iou_threshold),
                max_detections: parse_or(&lookup, "SCANNER_MAX_DETECTIONS", d.params.max_detections),
            },
            http: HttpOptions {
                cors_origins: lookup("SCANNER_CORS_ORIGINS")
                    .map(|s| s.split(',').map(|o| o.trim().to_string()).filter(|o| !o.is_empty()).collect())
                    .unwrap_or(d.http.cors_origins),
                max_body_bytes: parse_or(&lookup, "SCANNER_MAX_BODY_BYTES", d.http.max_body_bytes),
            },
            heuristics_path: lookup("SCANNER_HEURISTICS").filter(|s| !s.trim().is_empty()).map(PathBuf::from),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn inference(&self) -> InferenceConfig {
        InferenceConfig {
            model: ModelId::from_path(self.model_path.clone()),
            params: self.params.clone(),
        }
    }

    pub fn load_heuristics(&self) -> Result<Heuristics, ConfigError> {
        match &self.heuristics_path {
            Some(path) => load_heuristics(path),
            None => Ok(Heuristics::default()),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Reads and validates a heuristics JSON file. Omitted fields keep their defaults.
pub fn load_heuristics(path: &Path) -> Result<Heuristics, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let heuristics: Heuristics =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    heuristics.validate()?;
    Ok(heuristics)
}
