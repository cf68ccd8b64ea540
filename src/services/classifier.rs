use image::{imageops::FilterType, DynamicImage, ImageDecoder, ImageError, ImageReader};
use ndarray::Array4;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use std::{
    fmt::Display,
    io::Cursor,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    error::{AppError, AppResult},
    models::{Detection, LabelSet, OriginMap, Prediction},
};

/// Number of candidates reported alongside the primary detection
pub const TOP_PREDICTIONS: usize = 3;

/// Inference backend for the food classifier
///
/// Takes a `[1, H, W, 3]` RGB tensor scaled to [0, 1] and returns one score
/// per label, in label index order.
#[cfg_attr(test, mockall::automock)]
pub trait ImageClassifier: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> AppResult<Vec<f32>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Classifier backed by an ONNX export of the trained model
pub struct OnnxClassifier {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
}

impl OnnxClassifier {
    pub fn load(model_path: &str) -> AppResult<Self> {
        let session = Session::builder()
            .map_err(model_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_error)?
            .commit_from_file(model_path)
            .map_err(model_error)?;

        tracing::info!(model_path = %model_path, "Loaded ONNX classifier");

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

fn model_error(e: impl Display) -> AppError {
    AppError::Artifact(format!("Failed to load classifier model: {}", e))
}

fn inference_error(e: impl Display) -> AppError {
    AppError::Inference(e.to_string())
}

/// A panic mid-inference leaves no partial state in the session, so a
/// poisoned lock is still usable
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ImageClassifier for OnnxClassifier {
    fn predict(&self, input: &Array4<f32>) -> AppResult<Vec<f32>> {
        let shape = input.shape().to_vec();
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::from_array((shape, data)).map_err(inference_error)?;

        let mut session = lock_session(&self.session);

        let outputs = session.run(ort::inputs![tensor]).map_err(inference_error)?;
        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(inference_error)?;

        Ok(scores.to_vec())
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

/// Decodes an encoded image into a normalized NHWC tensor
///
/// The EXIF orientation is applied first, so phone photos reach the model
/// upright. The image is then converted to RGB, resized to `input_size`
/// square with bilinear filtering and scaled to [0, 1].
pub fn preprocess_image(image_bytes: &[u8], input_size: u32) -> AppResult<Array4<f32>> {
    let mut decoder = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);

    let rgb = image
        .resize_exact(input_size, input_size, FilterType::Triangle)
        .to_rgb8();

    let size = input_size as usize;
    Ok(Array4::from_shape_fn((1, size, size, 3), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    }))
}

/// In-place softmax, for models exported without a final activation
pub fn softmax(scores: &mut [f32]) {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut total = 0.0;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        total += *score;
    }
    if total > 0.0 {
        scores.iter_mut().for_each(|score| *score /= total);
    }
}

/// Turns photos into labelled food detections
pub struct FoodDetector {
    classifier: Arc<dyn ImageClassifier>,
    labels: LabelSet,
    origins: OriginMap,
    input_size: u32,
    apply_softmax: bool,
}

impl FoodDetector {
    pub fn new(
        classifier: Arc<dyn ImageClassifier>,
        labels: LabelSet,
        origins: OriginMap,
        input_size: u32,
    ) -> Self {
        Self {
            classifier,
            labels,
            origins,
            input_size,
            apply_softmax: false,
        }
    }

    pub fn with_softmax(mut self, apply_softmax: bool) -> Self {
        self.apply_softmax = apply_softmax;
        self
    }

    /// Classifies an encoded image
    ///
    /// Undecodable bytes fail with [`AppError::Decode`] before the model runs.
    pub fn detect(&self, image_bytes: &[u8]) -> AppResult<Detection> {
        let input = preprocess_image(image_bytes, self.input_size)?;

        let mut scores = self.classifier.predict(&input)?;
        if self.apply_softmax {
            softmax(&mut scores);
        }

        let top_predictions = self.top_predictions(&scores, TOP_PREDICTIONS)?;
        let primary = top_predictions
            .first()
            .cloned()
            .ok_or_else(|| AppError::Inference("Model produced no scores".to_string()))?;

        tracing::debug!(
            backend = self.classifier.name(),
            food_name = %primary.food_name,
            confidence = primary.confidence,
            "Classified image"
        );

        Ok(Detection {
            food_name: primary.food_name,
            origin: primary.origin,
            confidence: primary.confidence,
            top_predictions,
        })
    }

    /// Highest scoring labels, best first; ties keep label order
    fn top_predictions(&self, scores: &[f32], count: usize) -> AppResult<Vec<Prediction>> {
        if scores.len() != self.labels.len() {
            return Err(AppError::Inference(format!(
                "Model produced {} scores for {} labels",
                scores.len(),
                self.labels.len()
            )));
        }

        if let Some(index) = scores.iter().position(|score| !score.is_finite()) {
            return Err(AppError::Inference(format!(
                "Model produced non-finite score {} at output index {}",
                scores[index], index
            )));
        }

        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        ranked
            .into_iter()
            .take(count)
            .map(|index| {
                let food_name = self.labels.get(index).ok_or_else(|| {
                    AppError::Inference(format!("No label for output index {}", index))
                })?;
                Ok(Prediction {
                    food_name: food_name.to_string(),
                    confidence: scores[index],
                    origin: self.origins.get(food_name).to_string(),
                })
            })
            .collect()
    }
}
