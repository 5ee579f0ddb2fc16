use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::application::ports::DetectorPort;
use crate::adapters::onnx::yolo_engine::OnnxYoloEngine;
use crate::domain::{
    detection::RawDetection,
    errors::{DomainError, DomainResult},
    model::InferenceConfig,
};

/// Handle compartido a la sesión YOLO cargada.
///
/// `Session::run` necesita `&mut`, así que las peticiones se turnan en el lock
/// del motor. La inferencia corre en el pool bloqueante de Tokio.
pub struct OnnxDetector {
    engine: Arc<Mutex<OnnxYoloEngine>>,
    config: InferenceConfig,
}

/// Tiempos medidos sobre una serie de inferencias.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchStats {
    pub runs: usize,
    pub avg_ms: f64,
    pub fps: f64,
}

impl BenchStats {
    pub fn from_durations(durations: &[Duration]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }
        let total: Duration = durations.iter().sum();
        let avg_ms = total.as_secs_f64() * 1000.0 / durations.len() as f64;
        let fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { f64::INFINITY };
        Some(Self { runs: durations.len(), avg_ms, fps })
    }
}

impl OnnxDetector {
    pub fn load(config: InferenceConfig) -> DomainResult<Self> {
        let engine = OnnxYoloEngine::load(&config.model.onnx_path)
            .map_err(|e| DomainError::OperationFailed(format!("loading {}: {e:#}", config.model.onnx_path)))?;
        info!("🧠 Modelo YOLO '{}' cargado desde {}", config.model.name, config.model.onnx_path);
        Ok(Self { engine: Arc::new(Mutex::new(engine)), config })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Inferencia en el hilo actual (CLI, benchmarks).
    pub fn detect_blocking(&self, image: &RgbImage) -> DomainResult<Vec<RawDetection>> {
        run(&self.engine, image, &self.config)
    }

    /// Número de clases de la cabeza de detección; `None` hasta la primera inferencia.
    pub fn num_classes(&self) -> Option<usize> {
        lock_engine(&self.engine).num_classes()
    }

    /// Imagen sintética del tamaño de entrada del modelo.
    pub fn dummy_image(&self) -> RgbImage {
        let size = self.config.params.input_size.max(1);
        RgbImage::from_fn(size, size, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8]))
    }

    /// Ejecuta `runs` inferencias sobre la imagen sintética y mide la media.
    pub fn benchmark(&self, runs: usize) -> DomainResult<Option<BenchStats>> {
        let image = self.dummy_image();
        let mut durations = Vec::with_capacity(runs);
        for _ in 0..runs {
            let started = Instant::now();
            self.detect_blocking(&image)?;
            durations.push(started.elapsed());
        }
        Ok(BenchStats::from_durations(&durations))
    }
}

/// Un pánico dentro de `infer` envenena el mutex; el motor sigue siendo usable.
fn lock_engine<T>(engine: &Mutex<T>) -> MutexGuard<'_, T> {
    engine.lock().unwrap_or_else(|poisoned| {
        warn!("⚠️ Lock de inferencia envenenado; recuperando el motor");
        engine.clear_poison();
        poisoned.into_inner()
    })
}

fn run(engine: &Mutex<OnnxYoloEngine>, image: &RgbImage, config: &InferenceConfig) -> DomainResult<Vec<RawDetection>> {
    lock_engine(engine)
        .infer(image, &config.params)
        .map_err(|e| DomainError::Inference(format!("{e:#}")))
}

#[async_trait]
impl DetectorPort for OnnxDetector {
    async fn detect(&self, image: RgbImage) -> DomainResult<Vec<RawDetection>> {
        let engine = self.engine.clone();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || run(&engine, &image, &config))
            .await
            .map_err(|e| DomainError::OperationFailed(format!("inference task failed: {e}")))?
    }
}
