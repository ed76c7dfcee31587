//! Customer testimonials shown on the storefront.

use serde::{Deserialize, Serialize};

use super::TestimonialId;

/// A customer quote. Only active testimonials are shown publicly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: TestimonialId,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub avatar: String,
    /// Star rating, 1 to 5.
    pub rating: u8,
    pub content: String,
    /// Product name the quote refers to (free text, not a catalog reference).
    #[serde(default)]
    pub product: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub date: String,
}

const fn default_active() -> bool {
    true
}

impl Testimonial {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    /// Create an active testimonial, clamping the rating into 1..=5.
    #[must_use]
    pub fn new(
        id: TestimonialId,
        name: impl Into<String>,
        rating: u8,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            role: String::new(),
            avatar: String::new(),
            rating: rating.clamp(Self::MIN_RATING, Self::MAX_RATING),
            content: content.into(),
            product: String::new(),
            is_active: true,
            date: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_is_clamped() {
        assert_eq!(Testimonial::new(TestimonialId::new(1), "A", 0, "x").rating, 1);
        assert_eq!(Testimonial::new(TestimonialId::new(1), "A", 9, "x").rating, 5);
    }
}
