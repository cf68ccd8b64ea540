use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, Multipart, Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{DetectResponse, Recommendation},
};

use super::AppState;

/// Multipart field holding the uploaded photo
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub top_n: Option<usize>,
}

/// Welcome message and endpoint index
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the FoodLens API",
        "endpoints": {
            "/detect": "POST - Upload a photo to detect the food in it",
            "/recommend/{food_name}": "GET - Restaurant recommendations for a food"
        }
    }))
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Detect the food in an uploaded photo and recommend restaurants for it
pub async fn detect(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<DetectResponse>> {
    let multipart = multipart.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let image = read_image_upload(multipart).await?;

    tracing::info!(
        request_id = %request_id,
        upload_bytes = image.len(),
        "Processing detection request"
    );

    let detector = state.detector.clone();
    let detection = tokio::task::spawn_blocking(move || detector.detect(&image))
        .await
        .map_err(|e| AppError::Internal(format!("Detection task failed: {}", e)))??;

    let recommendations = state
        .recommender
        .get_recommendations(&detection.food_name, state.default_top_n);

    tracing::info!(
        request_id = %request_id,
        food_name = %detection.food_name,
        confidence = detection.confidence,
        recommendation_count = recommendations.len(),
        "Detection completed"
    );

    Ok(Json(DetectResponse {
        detection,
        recommendations,
    }))
}

/// Restaurant recommendations for a named food
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(food_name): Path<String>,
    query: Result<Query<RecommendQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let Query(params) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let top_n = params.top_n.unwrap_or(state.default_top_n);

    tracing::info!(
        request_id = %request_id,
        food_name = %food_name,
        top_n,
        "Processing recommendation request"
    );

    Ok(Json(state.recommender.get_recommendations(&food_name, top_n)))
}

/// Pulls the image bytes out of the upload field
///
/// Uploads not declared as `image/*` are rejected without reading their body.
async fn read_image_upload(mut multipart: Multipart) -> AppResult<Bytes> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(AppError::InvalidInput(format!(
                "File must be an image, got content type '{}'",
                content_type
            )));
        }

        return field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)));
    }

    Err(AppError::InvalidInput(format!(
        "Missing image upload in field '{}'",
        UPLOAD_FIELD
    )))
}
