use sqlx::{FromRow, SqlitePool};

use crate::{AppError, AppResult, db::{AccountId, DoctorId}, media::DEFAULT_PHOTO};

const COLUMNS: &str = "id,account_id,name,specialty,clinic_address,experience_years,bio,photo";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Doctor {
    pub id: DoctorId,
    pub account_id: AccountId,
    pub name: String,
    pub specialty: String,
    pub clinic_address: String,
    pub experience_years: i64,
    pub bio: String,
    pub photo: String,
}

/// Editable profile fields. A `None` photo keeps whatever is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorFields {
    pub name: String,
    pub specialty: String,
    pub clinic_address: String,
    pub experience_years: i64,
    pub bio: String,
    pub photo: Option<String>,
}

/// Every doctor, or only those matching `search` when it is non-blank.
pub async fn list(db_pool: &SqlitePool, search: Option<&str>) -> AppResult<Vec<Doctor>> {
    match search.map(str::trim).filter(|term| !term.is_empty()) {
        Some(term) => find_by_name_containing(db_pool, term).await,
        None => Ok(sqlx::query_as(&format!("SELECT {COLUMNS} FROM doctors ORDER BY id"))
            .fetch_all(db_pool)
            .await?),
    }
}

/// Case-insensitive substring match over name, specialty and clinic address.
/// SQLite `lower()` only folds ASCII, so the match runs here.
pub async fn find_by_name_containing(db_pool: &SqlitePool, term: &str) -> AppResult<Vec<Doctor>> {
    let needle = term.to_lowercase();
    let doctors: Vec<Doctor> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM doctors ORDER BY id"))
        .fetch_all(db_pool)
        .await?;

    Ok(doctors
        .into_iter()
        .filter(|d| {
            [&d.name, &d.specialty, &d.clinic_address]
                .iter()
                .any(|col| col.to_lowercase().contains(&needle))
        })
        .collect())
}

pub async fn get(db_pool: &SqlitePool, id: DoctorId) -> AppResult<Doctor> {
    sqlx::query_as(&format!("SELECT {COLUMNS} FROM doctors WHERE id=?"))
        .bind(id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(AppError::NotFound("doctor"))
}

pub async fn find_by_account(db_pool: &SqlitePool, account_id: AccountId) -> AppResult<Option<Doctor>> {
    Ok(sqlx::query_as(&format!("SELECT {COLUMNS} FROM doctors WHERE account_id=?"))
        .bind(account_id)
        .fetch_optional(db_pool)
        .await?)
}

pub async fn register(db_pool: &SqlitePool, account_id: AccountId, fields: DoctorFields) -> AppResult<Doctor> {
    let doctor = sqlx::query_as(&format!(
        "INSERT INTO doctors (account_id,name,specialty,clinic_address,experience_years,bio,photo)
         VALUES (?,?,?,?,?,?,?) RETURNING {COLUMNS}"
    ))
    .bind(account_id)
    .bind(fields.name)
    .bind(fields.specialty)
    .bind(fields.clinic_address)
    .bind(fields.experience_years)
    .bind(fields.bio)
    .bind(fields.photo.unwrap_or_else(|| DEFAULT_PHOTO.to_owned()))
    .fetch_one(db_pool)
    .await
    .map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict("this account already has a doctor profile".to_owned()),
        err => err,
    })?;

    Ok(doctor)
}

pub async fn edit(db_pool: &SqlitePool, account_id: AccountId, fields: DoctorFields) -> AppResult<Doctor> {
    sqlx::query_as(&format!(
        "UPDATE doctors
         SET name=?, specialty=?, clinic_address=?, experience_years=?, bio=?, photo=COALESCE(?, photo)
         WHERE account_id=? RETURNING {COLUMNS}"
    ))
    .bind(fields.name)
    .bind(fields.specialty)
    .bind(fields.clinic_address)
    .bind(fields.experience_years)
    .bind(fields.bio)
    .bind(fields.photo)
    .bind(account_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::NotFound("doctor profile"))
}
