pub mod artifacts;
pub mod classifier;
pub mod recommender;
pub mod vectorizer;

pub use classifier::{FoodDetector, ImageClassifier, OnnxClassifier};
pub use recommender::Recommender;
pub use vectorizer::TfidfVectorizer;
