mod login;
mod logout;
mod password;
mod signup;
pub mod store;

use axum::{Router, routing::get};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, AppState, db::AccountId, doctors::{self, Doctor}, session::USER_ID};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup/", get(signup::signup_page).post(signup::signup))
        .route("/login/", get(login::login_page).post(login::login))
        .route("/logout/", get(logout::logout).post(logout::logout))
}

/// The account behind the current session, if anyone is signed in.
pub(crate) async fn caller(session: &Session) -> AppResult<Option<AccountId>> {
    Ok(session.get::<AccountId>(USER_ID).await?)
}

pub(crate) async fn require_account(session: &Session, return_url: &str) -> AppResult<AccountId> {
    caller(session).await?.ok_or_else(|| AppError::LoginRequired {
        return_url: return_url.to_owned(),
    })
}

pub(crate) async fn current_doctor(db_pool: &SqlitePool, session: &Session) -> AppResult<Option<Doctor>> {
    match caller(session).await? {
        Some(account_id) => doctors::store::find_by_account(db_pool, account_id).await,
        None => Ok(None),
    }
}

/// The caller's own doctor profile; redirects to login or registration otherwise.
pub(crate) async fn require_doctor(db_pool: &SqlitePool, session: &Session, return_url: &str) -> AppResult<Doctor> {
    let account_id = require_account(session, return_url).await?;
    doctors::store::find_by_account(db_pool, account_id)
        .await?
        .ok_or(AppError::ProfileRequired)
}

pub(crate) async fn sign_in(session: &Session, account_id: AccountId) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER_ID, account_id).await?;
    Ok(())
}

/// Only same-site paths are followed after login.
pub(crate) fn local_return_url(return_url: Option<String>) -> String {
    match return_url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.contains('\\') => url,
        _ => "/".to_owned(),
    }
}
