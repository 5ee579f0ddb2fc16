use std::sync::Arc;
use crate::application::services::ScanService;

/// Estado compartido para los manejadores HTTP de Axum.
/// Siguiendo la Arquitectura Hexagonal, el estado contiene los casos de uso, no los adaptadores.
#[derive(Clone)]
pub struct HttpState {
    /// Servicio de escaneo (decodificar, detectar, construir el resultado).
    pub scan: Arc<ScanService>,
}
