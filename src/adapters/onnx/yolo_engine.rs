use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use std::fs;

use crate::domain::detection::{non_max_suppression, BoundingBox, RawDetection};
use crate::domain::model::YoloParams;

/// YOLOv8/11 detection head exported to ONNX: output `[1, 4 + classes, candidates]`.
pub struct OnnxYoloEngine {
    session: Session,
    // Se conoce tras la primera inferencia (dimensión 1 de la salida menos las 4 de la caja).
    num_classes: Option<usize>,
}

impl OnnxYoloEngine {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path).with_context(|| format!("reading model {path}"))?;
        let session = builder.commit_from_memory(&model_bytes)?;

        Ok(Self { session, num_classes: None })
    }

    pub fn num_classes(&self) -> Option<usize> {
        self.num_classes
    }

    pub fn infer(&mut self, rgb: &RgbImage, params: &YoloParams) -> Result<Vec<RawDetection>> {
        let imgsz = params.input_size as usize;
        if imgsz == 0 {
            bail!("input size must be positive");
        }
        let resized = image::imageops::resize(rgb, imgsz as u32, imgsz as u32, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
        for (x, y, pixel) in resized.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Value::from_array((input_shape, input.into_raw_vec()))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.into_iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[1] <= 4 {
            bail!("unexpected YOLO output shape {:?}", dims);
        }
        self.num_classes = Some(dims[1] - 4);
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0);

        let num_candidates = view.shape()[1];
        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;

        let mut candidates = Vec::new();

        for i in 0..num_candidates {
            let scores = view.slice(s![4.., i]);
            let Some((class_id, &max_score)) = scores
                .indexed_iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            else {
                continue;
            };

            if max_score > params.conf_threshold {
                let cx = view[[0, i]];
                let cy = view[[1, i]];
                let w = view[[2, i]];
                let h = view[[3, i]];

                candidates.push(RawDetection::new(
                    class_id,
                    max_score.clamp(0.0, 1.0),
                    BoundingBox {
                        x1: (cx - w / 2.0) * sx,
                        y1: (cy - h / 2.0) * sy,
                        x2: (cx + w / 2.0) * sx,
                        y2: (cy + h / 2.0) * sy,
                    },
                ));
            }
        }

        let mut detections = non_max_suppression(candidates, params.iou_threshold);
        detections.truncate(params.max_detections);
        Ok(detections)
    }
}
