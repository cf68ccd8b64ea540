use std::sync::Arc;

use crate::{
    config::{Config, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TOP_N},
    error::AppResult,
    services::{artifacts, FoodDetector, OnnxClassifier, Recommender},
};

/// Shared application state
///
/// Everything in here is loaded once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<FoodDetector>,
    pub recommender: Arc<Recommender>,
    pub default_top_n: usize,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Creates state around an already built detector and recommender
    pub fn new(detector: FoodDetector, recommender: Recommender) -> Self {
        Self {
            detector: Arc::new(detector),
            recommender: Arc::new(recommender),
            default_top_n: DEFAULT_TOP_N,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_default_top_n(mut self, default_top_n: usize) -> Self {
        self.default_top_n = default_top_n;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Loads the model and data artifacts named in the config
    pub fn load(config: &Config) -> AppResult<Self> {
        let classifier = OnnxClassifier::load(&config.model_path)?;
        let labels = artifacts::load_labels(&config.labels_path)?;
        let origins = artifacts::load_origins(&config.origins_path)?;
        let recommender = artifacts::load_recommender(&config.recommender_path)?;

        let detector = FoodDetector::new(Arc::new(classifier), labels, origins, config.input_size)
            .with_softmax(config.classifier_apply_softmax);

        Ok(Self::new(detector, recommender)
            .with_default_top_n(config.default_top_n)
            .with_max_upload_bytes(config.max_upload_bytes))
    }
}
