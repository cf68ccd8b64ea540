use serde::de::DeserializeOwned;
use std::{fs, path::Path};

use crate::{
    error::{AppError, AppResult},
    models::{LabelSet, OriginMap},
    services::recommender::{Recommender, RecommenderBundle},
};

/// Reads the label set, a JSON array of food names in model output order
pub fn load_labels(path: impl AsRef<Path>) -> AppResult<LabelSet> {
    let labels: LabelSet = read_json(path.as_ref())?;
    if labels.is_empty() {
        return Err(AppError::Artifact(format!(
            "Label set {} is empty",
            path.as_ref().display()
        )));
    }

    tracing::info!(count = labels.len(), "Loaded food labels");
    Ok(labels)
}

/// Reads the food origin map, a JSON object of food name to origin
pub fn load_origins(path: impl AsRef<Path>) -> AppResult<OriginMap> {
    let origins: OriginMap = read_json(path.as_ref())?;
    tracing::info!(count = origins.len(), "Loaded food origins");
    Ok(origins)
}

/// Reads the recommender bundle and checks it is self-consistent
pub fn load_recommender(path: impl AsRef<Path>) -> AppResult<Recommender> {
    let bundle: RecommenderBundle = read_json(path.as_ref())?;
    let precomputed = bundle.place_vectors.is_some();
    let recommender = Recommender::from_bundle(bundle)?;

    tracing::info!(
        places = recommender.len(),
        precomputed_vectors = precomputed,
        "Loaded restaurant recommender"
    );
    Ok(recommender)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let contents = fs::read_to_string(path).map_err(|e| {
        AppError::Artifact(format!("Failed to read {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&contents)
        .map_err(|e| AppError::Artifact(format!("Failed to parse {}: {}", path.display(), e)))
}
