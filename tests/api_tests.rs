use std::{collections::HashMap, io::Cursor, sync::Arc};

use axum::http::StatusCode;
use axum_test::{
    multipart::{MultipartForm, Part},
    TestServer,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use serde_json::Value;

use foodlens_api::{
    api::{create_router, AppState},
    error::AppResult,
    models::{DetectResponse, LabelSet, OriginMap, Place, Recommendation},
    services::{FoodDetector, ImageClassifier, Recommender, TfidfVectorizer},
};

/// Classifier that ignores the pixels and always returns the same distribution
struct FixedClassifier(Vec<f32>);

impl ImageClassifier for FixedClassifier {
    fn predict(&self, input: &Array4<f32>) -> AppResult<Vec<f32>> {
        assert_eq!(input.shape(), &[1, 32, 32, 3]);
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn recommender() -> Recommender {
    let terms = ["sushi", "ramen", "japanese", "pizza", "italian", "rendang", "padang"];
    let vocabulary: HashMap<String, usize> = terms
        .iter()
        .enumerate()
        .map(|(i, t)| (t.to_string(), i))
        .collect();
    let vectorizer = TfidfVectorizer::new(vocabulary, vec![1.0; terms.len()]).unwrap();

    let places = vec![
        Place::new("Sushi Tei", "sushi japanese", 4.6),
        Place::new("Pizza Marzano", "pizza italian", 4.2),
        Place::new("Ichiraku", "ramen japanese", 4.8),
        Place::new("Sederhana", "rendang padang", 4.5),
    ];
    Recommender::from_places(vectorizer, places).unwrap()
}

fn create_test_server() -> TestServer {
    let labels = LabelSet::new(vec![
        "sushi".to_string(),
        "pizza".to_string(),
        "rendang".to_string(),
        "ramen".to_string(),
    ]);
    let origins: OriginMap = [
        ("sushi".to_string(), "Japan".to_string()),
        ("rendang".to_string(), "West Sumatra".to_string()),
    ]
    .into_iter()
    .collect();

    let classifier = FixedClassifier(vec![0.7, 0.05, 0.15, 0.1]);
    let detector = FoodDetector::new(Arc::new(classifier), labels, origins, 32);

    let state = AppState::new(detector, recommender()).with_default_top_n(3);
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn png_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([230, 120, 40])));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

fn upload(bytes: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes).file_name(file_name).mime_type(mime_type),
    )
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let server = create_test_server();
    let response = server.get("/").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["endpoints"]["/detect"].is_string());
    assert!(body["endpoints"]["/recommend/{food_name}"].is_string());
}

#[tokio::test]
async fn test_detect_returns_detection_and_recommendations() {
    let server = create_test_server();
    let response = server
        .post("/detect")
        .multipart(upload(png_bytes(), "lunch.png", "image/png"))
        .await;

    response.assert_status_ok();
    let body: DetectResponse = response.json();

    assert_eq!(body.detection.food_name, "sushi");
    assert_eq!(body.detection.origin, "Japan");
    assert!((body.detection.confidence - 0.7).abs() < 1e-6);

    let top: Vec<&str> = body
        .detection
        .top_predictions
        .iter()
        .map(|p| p.food_name.as_str())
        .collect();
    assert_eq!(top, vec!["sushi", "rendang", "ramen"]);
    assert_eq!(body.detection.top_predictions[2].origin, "Unknown");

    assert_eq!(body.recommendations.len(), 3);
    assert_eq!(body.recommendations[0].name, "Sushi Tei");
    assert!(body.recommendations[0].similarity_score > body.recommendations[1].similarity_score);
}

#[tokio::test]
async fn test_detect_rejects_non_image_upload() {
    let server = create_test_server();
    let response = server
        .post("/detect")
        .multipart(upload(b"name,cuisine\n".to_vec(), "places.csv", "text/csv"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("must be an image"));
}

#[tokio::test]
async fn test_detect_rejects_undecodable_image() {
    let server = create_test_server();
    let response = server
        .post("/detect")
        .multipart(upload(b"\x89PNG but truncated".to_vec(), "broken.png", "image/png"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Decode error"));
}

#[tokio::test]
async fn test_detect_requires_file_field() {
    let server = create_test_server();
    let form = MultipartForm::new().add_text("note", "no photo today");
    let response = server.post("/detect").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detect_rejects_non_multipart_body_as_json() {
    let server = create_test_server();
    let response = server.post("/detect").text("just some text").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
}

#[tokio::test]
async fn test_recommend_by_food_name() {
    let server = create_test_server();
    let response = server.get("/recommend/ramen").await;

    response.assert_status_ok();
    let recommendations: Vec<Recommendation> = response.json();
    assert_eq!(recommendations.len(), 3);
    assert_eq!(recommendations[0].name, "Ichiraku");
    for pair in recommendations.windows(2) {
        assert!(pair[0].similarity_score >= pair[1].similarity_score);
    }
}

#[tokio::test]
async fn test_recommend_respects_top_n() {
    let server = create_test_server();

    let response = server
        .get("/recommend/rendang")
        .add_query_param("top_n", 1)
        .await;
    let recommendations: Vec<Recommendation> = response.json();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].name, "Sederhana");

    let response = server
        .get("/recommend/rendang")
        .add_query_param("top_n", 100)
        .await;
    let recommendations: Vec<Recommendation> = response.json();
    assert_eq!(recommendations.len(), 4);

    let response = server
        .get("/recommend/rendang")
        .add_query_param("top_n", 0)
        .await;
    let recommendations: Vec<Recommendation> = response.json();
    assert!(recommendations.is_empty());
}

#[tokio::test]
async fn test_recommend_rejects_bad_top_n_as_json() {
    let server = create_test_server();
    let response = server
        .get("/recommend/rendang")
        .add_query_param("top_n", -1)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("query string"));
}

#[tokio::test]
async fn test_recommend_unknown_food_degrades_gracefully() {
    let server = create_test_server();
    let response = server.get("/recommend/croissant").await;

    response.assert_status_ok();
    let recommendations: Vec<Recommendation> = response.json();
    assert_eq!(recommendations.len(), 3);
    assert!(recommendations.iter().all(|r| r.similarity_score == 0.0));
}

#[tokio::test]
async fn test_recommend_is_idempotent() {
    let server = create_test_server();
    let first: Vec<Recommendation> = server.get("/recommend/japanese").await.json();
    let second: Vec<Recommendation> = server.get("/recommend/japanese").await.json();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let server = create_test_server();
    let response = server.get("/health").await;
    let header = response
        .headers()
        .get("x-request-id")
        .expect("request id header");
    assert!(uuid::Uuid::parse_str(header.to_str().unwrap()).is_ok());
}
