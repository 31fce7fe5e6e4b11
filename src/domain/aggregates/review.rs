//! Reviews and the locally maintained rating aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::{collect_field_errors, FieldErrors};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub rating: u8,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub store_response: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ReviewForm {
    #[validate(range(min = 1, max = 5, message = "Please select a rating"))]
    pub rating: u8,
    #[validate(length(min = 1, message = "Review title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Review content is required"))]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReviewError {
    #[error("review form has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),
}

impl ReviewForm {
    /// Validates the trimmed form so whitespace-only text counts as empty.
    pub fn check(&self) -> Result<(), ReviewError> {
        let trimmed = ReviewForm { rating: self.rating, title: self.title.trim().into(), content: self.content.trim().into() };
        trimmed.validate().map_err(|e| ReviewError::Invalid(collect_field_errors(&e, "")))
    }

    /// Review shown locally when the server accepts without echoing one back.
    pub fn to_review(&self, customer_name: &str) -> Review {
        Review {
            id: 0,
            rating: self.rating,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            customer_name: customer_name.to_string(),
            created_at: Utc::now(),
            store_response: None,
        }
    }
}

/// Reviews held by a product page plus the figures shown next to them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReviewStats {
    pub reviews: Vec<Review>,
    pub average_rating: f64,
    pub total_reviews: u32,
}

impl ReviewStats {
    pub fn new(reviews: Vec<Review>, average_rating: f64, total_reviews: u32) -> Self {
        Self { reviews, average_rating, total_reviews }
    }

    /// Prepends the review and recomputes the aggregate from the local list.
    /// The server's own aggregate is not consulted.
    pub fn record(&mut self, review: Review) {
        self.reviews.insert(0, review);
        let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        let count = self.reviews.len() as u32;
        self.total_reviews = count;
        self.average_rating = f64::from(sum) / f64::from(count);
    }

    /// Average formatted the way every theme prints it.
    pub fn average_display(&self) -> String { format!("{:.1}", self.average_rating) }

    /// Count per star value, five stars first.
    pub fn rating_breakdown(&self) -> [(u8, u32); 5] {
        let mut breakdown = [(5, 0), (4, 0), (3, 0), (2, 0), (1, 0)];
        for review in &self.reviews {
            if let Some(slot) = breakdown.iter_mut().find(|(stars, _)| *stars == review.rating) {
                slot.1 += 1;
            }
        }
        breakdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(rating: u8) -> ReviewForm {
        ReviewForm { rating, title: "Lovely".into(), content: "Keeps perfect time".into() }
    }

    #[test]
    fn test_first_review_sets_average() {
        let mut stats = ReviewStats::default();
        stats.record(form(4).to_review("Ada"));
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.total_reviews, 1);
        assert_eq!(stats.average_display(), "4.0");
    }

    #[test]
    fn test_new_review_is_prepended() {
        let mut stats = ReviewStats::default();
        stats.record(form(5).to_review("Ada"));
        stats.record(form(2).to_review("Grace"));
        assert_eq!(stats.reviews[0].customer_name, "Grace");
        assert_eq!(stats.average_display(), "3.5");
        assert_eq!(stats.rating_breakdown()[0], (5, 1));
        assert_eq!(stats.rating_breakdown()[3], (2, 1));
    }

    #[test]
    fn test_form_validation() {
        assert!(form(4).validate().is_ok());
        let errors = form(0).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("rating"));
        let blank = ReviewForm { rating: 3, title: String::new(), content: String::new() };
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("content"));
    }

    #[test]
    fn test_check_treats_whitespace_as_empty() {
        let padded = ReviewForm { rating: 5, title: "   ".into(), content: "Great".into() };
        let ReviewError::Invalid(errors) = padded.check().unwrap_err();
        assert_eq!(errors.get("title").map(String::as_str), Some("Review title is required"));
        assert!(form(5).check().is_ok());
    }
}
