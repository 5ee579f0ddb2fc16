//! Offline check of a YOLO export: model info, a timing run on a synthetic
//! image, then every image in a folder through the detector with the
//! resulting product JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use jewel_scanner::adapters::{
    imaging::{decoder::ImageCrateDecoder, files::list_images},
    onnx::{detector::OnnxDetector, model_catalog::OnnxModelCatalog},
};
use jewel_scanner::application::ports::{ImageDecoderPort, ModelCatalogPort};
use jewel_scanner::config::load_heuristics;
use jewel_scanner::domain::{
    heuristics::Heuristics,
    model::{InferenceConfig, ModelId, YoloParams},
    product::ResponseBuilder,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Modelo YOLO exportado a ONNX
    #[arg(long, value_name = "FILE")]
    model: String,

    /// Carpeta con imágenes .jpg/.jpeg/.png
    #[arg(long, value_name = "DIR", default_value = "test_images")]
    dir: PathBuf,

    /// Umbral de confianza (0.0 - 1.0)
    #[arg(long, default_value = "0.25", value_name = "THRESHOLD")]
    confidence: f32,

    /// Umbral IoU de NMS (0.0 - 1.0)
    #[arg(long, default_value = "0.45", value_name = "THRESHOLD")]
    iou: f32,

    /// Tamaño de entrada del modelo
    #[arg(long, default_value = "640", value_name = "PIXELS")]
    imgsz: u32,

    /// Inferencias cronometradas sobre la imagen sintética (0 desactiva)
    #[arg(long, default_value = "10", value_name = "RUNS")]
    bench: usize,

    /// JSON de heurísticas (categorías, bandas de autenticidad, tabla de valores)
    #[arg(long, value_name = "FILE")]
    heuristics: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    jewel_scanner::init_tracing();
    let args = Args::parse();

    let heuristics = match &args.heuristics {
        Some(path) => load_heuristics(path)?,
        None => Heuristics::default(),
    };
    let config = InferenceConfig {
        model: ModelId::from_path(args.model.clone()),
        params: YoloParams {
            input_size: args.imgsz,
            conf_threshold: args.confidence,
            iou_threshold: args.iou,
            ..YoloParams::default()
        },
    };

    // 1. Validar y cargar el modelo
    OnnxModelCatalog::new().validate_model(&config.model).await?;
    let detector = OnnxDetector::load(config)?;
    println!("✓ Model loaded: {}", args.model);

    // 2. Prueba de humo con imagen sintética (también fija el número de clases)
    let dummy = detector.dummy_image();
    let smoke = detector.detect_blocking(&dummy).context("inference on synthetic image")?;
    println!(
        "✓ Synthetic {}x{} inference OK ({} detections)",
        dummy.width(),
        dummy.height(),
        smoke.len()
    );

    // 3. Información del modelo
    let categories = &heuristics.categories.names;
    println!("\nModel information:");
    match detector.num_classes() {
        Some(n) => println!("  - Number of classes (output shape): {n}"),
        None => println!("  - Number of classes: unknown"),
    }
    println!("  - Class names: {:?}", categories);
    println!("  - Input size: {}", detector.config().params.input_size);

    // 4. Rendimiento
    if let Some(stats) = detector.benchmark(args.bench)? {
        println!("\nPerformance ({} runs):", stats.runs);
        println!("  - Average inference time: {:.2} ms", stats.avg_ms);
        println!("  - FPS: {:.2}", stats.fps);
    }

    // 5. Imágenes de prueba
    let images = match list_images(&args.dir) {
        Ok(images) => images,
        Err(e) => {
            tracing::warn!("⚠️ No se pudo leer {}: {}", args.dir.display(), e);
            Vec::new()
        }
    };
    if images.is_empty() {
        println!(
            "\nNo test images in {}; the synthetic image run above is the only check.",
            args.dir.display()
        );
        return Ok(());
    }
    println!("\nFound {} images to test\n", images.len());

    let decoder = ImageCrateDecoder::new();
    let builder = ResponseBuilder::new(Arc::new(heuristics));
    let bands = &builder.heuristics().authenticity;

    for path in &images {
        println!("== {}", path.display());
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let rgb = match decoder.decode(&bytes) {
            Ok(rgb) => rgb,
            Err(e) => {
                println!("   skipped: {e}\n");
                continue;
            }
        };

        let detections = detector.detect_blocking(&rgb)?;
        let result = builder.build(&detections);

        let mut ranked: Vec<_> = result.detections.iter().collect();
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        for (i, det) in ranked.iter().enumerate() {
            println!(
                "{:>3}. {:<6} {} {:.1}%  [{:.1}, {:.1}, {:.1}, {:.1}]",
                i + 1,
                bands.classify(det.confidence).tag(),
                det.category.to_uppercase(),
                det.confidence * 100.0,
                det.bbox.x1,
                det.bbox.y1,
                det.bbox.x2,
                det.bbox.y2,
            );
        }
        if ranked.is_empty() {
            println!("   no jewelry detected");
        }
        println!("{}\n", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
