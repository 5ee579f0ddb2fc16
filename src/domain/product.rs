use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::detection::{select_best, BoundingBox, RawDetection};
use super::heuristics::Heuristics;

/// A detection as returned to callers, with its resolved category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledDetection {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResult {
    pub success: bool,
    pub product_name: String,
    pub category: String,
    pub confidence: f32,
    pub authenticity: String,
    pub estimated_value: String,
    pub detections: Vec<LabeledDetection>,
}

/// Reduces the detections of one image to a single [`ProductResult`].
///
/// Pure and total: the best detection (first maximum) drives every derived
/// field, and an empty input yields the configured "no detection" sentinel.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    heuristics: Arc<Heuristics>,
}

impl ResponseBuilder {
    pub fn new(heuristics: Arc<Heuristics>) -> Self {
        Self { heuristics }
    }

    pub fn heuristics(&self) -> &Heuristics {
        &self.heuristics
    }

    pub fn build(&self, detections: &[RawDetection]) -> ProductResult {
        let h = &self.heuristics;
        let labeled: Vec<LabeledDetection> = detections
            .iter()
            .map(|d| LabeledDetection {
                class_id: d.class_id,
                confidence: d.confidence,
                bbox: d.bbox,
                category: h.categories.resolve(d.class_id),
            })
            .collect();

        let Some(idx) = select_best(detections) else {
            let text = &h.no_detection;
            return ProductResult {
                success: false,
                product_name: text.product_name.clone(),
                category: text.category.clone(),
                confidence: 0.0,
                authenticity: text.authenticity.clone(),
                estimated_value: text.estimated_value.clone(),
                detections: labeled,
            };
        };

        let best = &labeled[idx];
        ProductResult {
            success: true,
            product_name: best.category.clone(),
            category: best.category.clone(),
            confidence: best.confidence,
            authenticity: h.authenticity.describe(best.confidence),
            estimated_value: h.valuation.estimate(&best.category, best.confidence).to_string(),
            detections: labeled,
        }
    }
}
