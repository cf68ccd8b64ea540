use serde::{Deserialize, Serialize};

/// A restaurant in the recommendation catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub name: String,
    pub cuisine: String,
    pub rating: f64,
}

impl Place {
    pub fn new(name: impl Into<String>, cuisine: impl Into<String>, rating: f64) -> Self {
        Self {
            name: name.into(),
            cuisine: cuisine.into(),
            rating,
        }
    }

    /// Text the place vector is projected from when a bundle ships without vectors
    pub fn profile_text(&self) -> String {
        format!("{} {}", self.name, self.cuisine)
    }
}

/// A catalog place annotated with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub name: String,
    pub cuisine: String,
    pub rating: f64,
    pub similarity_score: f32,
}

impl Recommendation {
    pub fn from_place(place: &Place, similarity_score: f32) -> Self {
        Self {
            name: place.name.clone(),
            cuisine: place.cuisine.clone(),
            rating: place.rating,
            similarity_score,
        }
    }
}
