use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::{AppError, AppResult, db::DoctorId};

pub const RATINGS: std::ops::RangeInclusive<i64> = 1..=5;

#[derive(Debug, Clone, FromRow)]
pub struct Review {
    pub id: i64,
    pub doctor_id: DoctorId,
    pub reviewer_name: String,
    pub rating: i64,
    pub comment: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub reviewer_name: String,
    pub rating: i64,
    pub comment: String,
}

pub async fn add(db_pool: &SqlitePool, doctor_id: DoctorId, review: NewReview) -> AppResult<Review> {
    if !RATINGS.contains(&review.rating) {
        return Err(AppError::validation("rating must be between 1 and 5"));
    }

    Ok(sqlx::query_as(
        "INSERT INTO reviews (doctor_id,reviewer_name,rating,comment,created_at) VALUES (?,?,?,?,?)
         RETURNING id,doctor_id,reviewer_name,rating,comment,created_at",
    )
    .bind(doctor_id)
    .bind(review.reviewer_name)
    .bind(review.rating)
    .bind(review.comment)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db_pool)
    .await?)
}

/// Newest first, at most `limit` reviews.
pub async fn recent(db_pool: &SqlitePool, doctor_id: DoctorId, limit: i64) -> AppResult<Vec<Review>> {
    Ok(sqlx::query_as(
        "SELECT id,doctor_id,reviewer_name,rating,comment,created_at FROM reviews
         WHERE doctor_id=? ORDER BY julianday(created_at) DESC, id DESC LIMIT ?",
    )
    .bind(doctor_id)
    .bind(limit)
    .fetch_all(db_pool)
    .await?)
}

/// Mean rating over every review the doctor has, `None` when there are none.
pub async fn average_rating(db_pool: &SqlitePool, doctor_id: DoctorId) -> AppResult<Option<f64>> {
    let (avg,): (Option<f64>,) = sqlx::query_as("SELECT AVG(rating) FROM reviews WHERE doctor_id=?")
        .bind(doctor_id)
        .fetch_one(db_pool)
        .await?;
    Ok(avg)
}
