use serde::{Deserialize, Serialize};

use super::Recommendation;

/// One candidate label with its confidence and origin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub food_name: String,
    pub confidence: f32,
    pub origin: String,
}

/// Result of classifying a single uploaded photo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub food_name: String,
    pub origin: String,
    pub confidence: f32,
    /// Best three candidates, highest confidence first
    pub top_predictions: Vec<Prediction>,
}

/// Response body of the detect endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectResponse {
    pub detection: Detection,
    pub recommendations: Vec<Recommendation>,
}
