pub mod detection;
pub mod labels;
pub mod place;

pub use detection::{DetectResponse, Detection, Prediction};
pub use labels::{LabelSet, OriginMap, UNKNOWN_ORIGIN};
pub use place::{Place, Recommendation};
