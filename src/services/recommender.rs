use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{Place, Recommendation},
    services::vectorizer::TfidfVectorizer,
};

/// Output of the offline fitting step, as stored on disk
///
/// `place_vectors` may be omitted, in which case every place is projected
/// from its name and cuisine when the recommender is built.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderBundle {
    pub vectorizer: TfidfVectorizer,
    #[serde(default)]
    pub place_vectors: Option<Vec<Vec<f32>>>,
    pub places: Vec<Place>,
}

/// Content-based restaurant recommender
///
/// Ranks catalog places by cosine similarity between a projected food name
/// and each place's vector. The vectorizer, vectors and catalog are fixed at
/// construction and row-aligned.
#[derive(Debug, Clone)]
pub struct Recommender {
    vectorizer: TfidfVectorizer,
    place_vectors: Array2<f32>,
    places: Vec<Place>,
}

impl Recommender {
    /// Builds a recommender from precomputed place vectors
    pub fn new(
        vectorizer: TfidfVectorizer,
        place_vectors: Array2<f32>,
        places: Vec<Place>,
    ) -> AppResult<Self> {
        let (rows, dimension) = place_vectors.dim();

        if rows != places.len() {
            return Err(AppError::Artifact(format!(
                "{} place vectors for {} catalog places",
                rows,
                places.len()
            )));
        }

        if dimension != vectorizer.dimension() {
            return Err(AppError::Artifact(format!(
                "place vectors have dimension {} but vectorizer produces {}",
                dimension,
                vectorizer.dimension()
            )));
        }

        if let Some(((row, column), value)) =
            place_vectors.indexed_iter().find(|(_, value)| !value.is_finite())
        {
            return Err(AppError::Artifact(format!(
                "place vector {} has non-finite value {} at position {}",
                row, value, column
            )));
        }

        Ok(Self {
            vectorizer,
            place_vectors,
            places,
        })
    }

    /// Builds a recommender by projecting each place's profile text
    pub fn from_places(vectorizer: TfidfVectorizer, places: Vec<Place>) -> AppResult<Self> {
        let dimension = vectorizer.dimension();
        let mut place_vectors = Array2::<f32>::zeros((places.len(), dimension));

        for (mut row, place) in place_vectors.axis_iter_mut(Axis(0)).zip(&places) {
            row.assign(&vectorizer.transform(&place.profile_text()));
        }

        Self::new(vectorizer, place_vectors, places)
    }

    /// Builds a recommender from a deserialized bundle
    pub fn from_bundle(bundle: RecommenderBundle) -> AppResult<Self> {
        bundle.vectorizer.validate()?;

        let Some(rows) = bundle.place_vectors else {
            return Self::from_places(bundle.vectorizer, bundle.places);
        };

        let dimension = bundle.vectorizer.dimension();
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dimension) {
            return Err(AppError::Artifact(format!(
                "place vector {} has dimension {} but vectorizer produces {}",
                index,
                row.len(),
                dimension
            )));
        }

        let row_count = rows.len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let place_vectors = Array2::from_shape_vec((row_count, dimension), flat)
            .map_err(|e| AppError::Artifact(format!("Malformed place vectors: {}", e)))?;

        Self::new(bundle.vectorizer, place_vectors, bundle.places)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Returns up to `top_n` places most similar to `food_name`
    ///
    /// Results are ordered by descending similarity; equal scores keep catalog
    /// order. Text with no known terms scores zero against every place.
    pub fn get_recommendations(&self, food_name: &str, top_n: usize) -> Vec<Recommendation> {
        let query = self.vectorizer.transform(food_name);
        let scores = self.similarity_scores(query.view());

        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let recommendations: Vec<Recommendation> = ranked
            .into_iter()
            .take(top_n)
            .map(|index| Recommendation::from_place(&self.places[index], scores[index]))
            .collect();

        tracing::debug!(
            food_name = %food_name,
            top_n,
            returned = recommendations.len(),
            best_score = recommendations.first().map(|r| r.similarity_score),
            "Ranked catalog places"
        );

        recommendations
    }

    /// Cosine similarity of `query` against every place vector
    fn similarity_scores(&self, query: ArrayView1<f32>) -> Array1<f32> {
        self.place_vectors
            .outer_iter()
            .map(|row| cosine_similarity(row, query))
            .collect()
    }
}

/// Cosine similarity between two vectors, zero when either has no length
pub fn cosine_similarity(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    let denominator = a.dot(&a).sqrt() * b.dot(&b).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        a.dot(&b) / denominator
    }
}
