//! Detection model cards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a detection model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelStatus {
    Active,
    Training,
    Inactive,
    Error,
}

impl ModelStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Training => "Training",
            Self::Inactive => "Inactive",
            Self::Error => "Error",
        }
    }
}

/// Evaluation metrics, stored as percentages (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// A deployed or in-training detection model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiModel {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: String,
    pub algorithm: String,
    pub status: ModelStatus,
    pub metrics: ModelMetrics,
    pub last_trained: DateTime<Utc>,
    pub predictions: u64,
    pub false_positives: u64,
    pub version: String,
    pub training_data: String,
    /// Mean inference latency in milliseconds.
    pub inference_time: f64,
    pub model_size: String,
}

impl AiModel {
    pub fn matches_query(&self, query_lower: &str) -> bool {
        if query_lower.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(query_lower)
            || self.model_type.to_lowercase().contains(query_lower)
            || self.algorithm.to_lowercase().contains(query_lower)
    }
}

/// Enumerated choices offered by the model Configure dialog.
pub const CONFIGURE_OPTIONS: &[&str] = &[
    "Adjust detection threshold",
    "Update training parameters",
    "Modify feature selection",
    "Set alert sensitivity",
    "Configure data preprocessing",
];

/// Formats offered by the model Export dialog.
pub const EXPORT_FORMATS: &[&str] = &[
    "ONNX",
    "TensorFlow",
    "PyTorch",
    "Scikit-learn",
    "JSON Config",
];
