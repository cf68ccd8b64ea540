use serde::Deserialize;

/// Recommendations returned when the caller doesn't ask for a count
pub const DEFAULT_TOP_N: usize = 5;

/// Upload cap applied to request bodies
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// ONNX export of the food classifier
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// JSON array of food names, indexed by model output
    #[serde(default = "default_labels_path")]
    pub labels_path: String,

    /// JSON object mapping food name to origin
    #[serde(default = "default_origins_path")]
    pub origins_path: String,

    /// JSON bundle of vectorizer, place vectors and place catalog
    #[serde(default = "default_recommender_path")]
    pub recommender_path: String,

    /// Side length of the square classifier input
    #[serde(default = "default_input_size")]
    pub input_size: u32,

    /// Apply softmax to model outputs (for models exported without one)
    #[serde(default)]
    pub classifier_apply_softmax: bool,

    /// Number of recommendations returned when the caller doesn't ask
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,

    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> String {
    "models/food_detection.onnx".to_string()
}

fn default_labels_path() -> String {
    "data/food_labels.json".to_string()
}

fn default_origins_path() -> String {
    "data/food_origins.json".to_string()
}

fn default_recommender_path() -> String {
    "models/recommendation_system.json".to_string()
}

fn default_input_size() -> u32 {
    224
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address string the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
