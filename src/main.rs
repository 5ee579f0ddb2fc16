use anyhow::Context;
use std::sync::Arc;

use jewel_scanner::adapters::{
    http::{router, state::HttpState},
    imaging::decoder::ImageCrateDecoder,
    onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog},
};
use jewel_scanner::application::{
    ports::{DetectorPort, ModelCatalogPort},
    services::ScanService,
};
use jewel_scanner::config::AppConfig;
use jewel_scanner::domain::product::ResponseBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    jewel_scanner::init_tracing();

    // 2. Configuración (.env + variables SCANNER_*) y heurísticas de resultado
    let config = AppConfig::from_env();
    let heuristics = config.load_heuristics().context("loading heuristics")?;
    let inference = config.inference();

    // 3. Cargar el modelo una sola vez. Si falta o está roto, el servidor arranca
    //    igualmente con model_loaded=false para que /health lo reporte.
    tracing::info!("🔧 Modelo: {}", inference.model.onnx_path);
    let detector: Option<Arc<dyn DetectorPort>> = match OnnxModelCatalog::new().validate_model(&inference.model).await {
        Ok(()) => match OnnxDetector::load(inference.clone()) {
            Ok(d) => Some(Arc::new(d)),
            Err(e) => {
                tracing::error!("❌ No se pudo cargar el modelo: {}", e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("⚠️ {}; define SCANNER_MODEL_PATH con un export YOLO .onnx", e);
            None
        }
    };

    // 4. Caso de uso + estado HTTP
    let scan = ScanService::new(
        detector,
        Arc::new(ImageCrateDecoder::new()),
        ResponseBuilder::new(Arc::new(heuristics)),
        inference,
    );
    let state = HttpState { scan: Arc::new(scan) };
    let app = router(state, &config.http);

    // 5. Lanzar el servidor
    let addr = config.bind_addr();
    tracing::info!("🚀 Escáner de joyería escuchando en http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
