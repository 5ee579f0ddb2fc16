//! Presentation heuristics for scan results.
//!
//! The authenticity label and the value range are display heuristics carried
//! over from the demo. Neither is a real authentication or valuation; they are
//! configurable so deployments can retune them without touching detection code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::errors::{DomainError, DomainResult};

/// Class id → display category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTable {
    pub names: BTreeMap<usize, String>,
    pub fallback_prefix: String,
}

impl Default for CategoryTable {
    fn default() -> Self {
        let names = [(0, "Ring"), (1, "Necklace"), (2, "Earring")]
            .into_iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect();
        Self { names, fallback_prefix: "Class_".to_string() }
    }
}

impl CategoryTable {
    /// Unknown ids resolve to `<prefix><id>`.
    pub fn resolve(&self, class_id: usize) -> String {
        match self.names.get(&class_id) {
            Some(name) => name.clone(),
            None => format!("{}{}", self.fallback_prefix, class_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    pub fn tag(&self) -> &'static str {
        match self {
            ConfidenceBand::Low => "LOW",
            ConfidenceBand::Medium => "MEDIUM",
            ConfidenceBand::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticityBands {
    /// Strictly above this → high band.
    pub high_above: f32,
    /// Strictly above this (and not high) → medium band.
    pub medium_above: f32,
    pub high_label: String,
    pub medium_label: String,
    pub low_label: String,
}

impl Default for AuthenticityBands {
    fn default() -> Self {
        Self {
            high_above: 0.85,
            medium_above: 0.65,
            high_label: "High Confidence - Likely Authentic".to_string(),
            medium_label: "Medium Confidence - Needs Verification".to_string(),
            low_label: "Low Confidence - Expert Review Recommended".to_string(),
        }
    }
}

impl AuthenticityBands {
    pub fn classify(&self, confidence: f32) -> ConfidenceBand {
        if confidence > self.high_above {
            ConfidenceBand::High
        } else if confidence > self.medium_above {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn label(&self, band: ConfidenceBand) -> &str {
        match band {
            ConfidenceBand::High => &self.high_label,
            ConfidenceBand::Medium => &self.medium_label,
            ConfidenceBand::Low => &self.low_label,
        }
    }

    pub fn describe(&self, confidence: f32) -> String {
        self.label(self.classify(confidence)).to_string()
    }

    fn validate(&self) -> DomainResult<()> {
        for (name, v) in [("high_above", self.high_above), ("medium_above", self.medium_above)] {
            if !(0.0..=1.0).contains(&v) {
                return Err(DomainError::InvalidInput(format!("authenticity.{name} must be within [0, 1], got {v}")));
            }
        }
        if self.medium_above > self.high_above {
            return Err(DomainError::InvalidInput(format!(
                "authenticity.medium_above ({}) exceeds high_above ({})",
                self.medium_above, self.high_above
            )));
        }
        Ok(())
    }
}

/// Estimated value bounds for one result, already scaled by confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
    symbol: String,
    thousands_separator: Option<char>,
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{sym}{} - {sym}{}",
            format_amount(self.low, self.thousands_separator),
            format_amount(self.high, self.thousands_separator),
            sym = self.symbol
        )
    }
}

fn format_amount(amount: f64, separator: Option<char>) -> String {
    let fixed = format!("{amount:.2}");
    let Some(sep) = separator else { return fixed };

    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(fixed.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(sep);
        }
        grouped.push(*ch);
    }
    format!("{grouped}.{frac_part}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueTable {
    pub base: BTreeMap<String, f64>,
    pub default_base: f64,
    pub currency_symbol: String,
    pub thousands_separator: Option<char>,
}

impl Default for ValueTable {
    fn default() -> Self {
        let base = [("Ring", 500.0), ("Necklace", 800.0), ("Bracelet", 600.0), ("Earring", 400.0), ("Watch", 1200.0)]
            .into_iter()
            .map(|(name, v)| (name.to_string(), v))
            .collect();
        Self {
            base,
            default_base: 500.0,
            currency_symbol: "$".to_string(),
            thousands_separator: None,
        }
    }
}

impl ValueTable {
    /// `low = base * (0.5 + 0.5 * c)`, `high = 1.5 * low`.
    pub fn estimate(&self, category: &str, confidence: f32) -> ValueRange {
        let base = self.base.get(category).copied().unwrap_or(self.default_base);
        let c = f64::from(confidence.clamp(0.0, 1.0));
        let low = base * (0.5 + 0.5 * c);
        ValueRange {
            low,
            high: low * 1.5,
            symbol: self.currency_symbol.clone(),
            thousands_separator: self.thousands_separator,
        }
    }

    fn validate(&self) -> DomainResult<()> {
        let entries = self.base.iter().map(|(k, v)| (k.as_str(), *v));
        for (name, v) in entries.chain(std::iter::once(("default_base", self.default_base))) {
            if !v.is_finite() || v < 0.0 {
                return Err(DomainError::InvalidInput(format!("valuation base for {name} must be a non-negative number, got {v}")));
            }
        }
        Ok(())
    }
}

/// Placeholder text for images without any detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoDetectionText {
    pub product_name: String,
    pub category: String,
    pub authenticity: String,
    pub estimated_value: String,
}

impl Default for NoDetectionText {
    fn default() -> Self {
        Self {
            product_name: "No jewelry detected".to_string(),
            category: "Unknown".to_string(),
            authenticity: "Unable to determine".to_string(),
            estimated_value: "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Heuristics {
    pub categories: CategoryTable,
    pub authenticity: AuthenticityBands,
    pub valuation: ValueTable,
    pub no_detection: NoDetectionText,
}

impl Heuristics {
    pub fn validate(&self) -> DomainResult<()> {
        self.authenticity.validate()?;
        self.valuation.validate()
    }
}
