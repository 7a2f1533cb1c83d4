use serde::Deserialize;

use crate::{AppError, AppResult};

use super::{NewReview, store::RATINGS};

#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct ReviewForm {
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

impl ReviewForm {
    pub(crate) fn validate(&self) -> AppResult<NewReview> {
        let reviewer_name = self.reviewer_name.trim();
        if reviewer_name.is_empty() || reviewer_name.chars().count() > 100 {
            return Err(AppError::validation("your name must be between 1 and 100 characters"));
        }

        let rating = self
            .rating
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|rating| RATINGS.contains(rating))
            .ok_or_else(|| AppError::validation("rating must be a whole number from 1 to 5"))?;

        let comment = self.comment.trim();
        if comment.is_empty() {
            return Err(AppError::validation("comment is required"));
        }

        Ok(NewReview {
            reviewer_name: reviewer_name.to_owned(),
            rating,
            comment: comment.to_owned(),
        })
    }
}
