use std::sync::Arc;

use axum::{body::Body, http::{header, Request}, Router};
use sqlx::SqlitePool;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::{auth, config::Config, db::AccountId, doctors::{store, Doctor, DoctorFields}, AppState};

pub(crate) fn fields(name: &str, specialty: &str, clinic_address: &str) -> DoctorFields {
    DoctorFields {
        name: name.to_owned(),
        specialty: specialty.to_owned(),
        clinic_address: clinic_address.to_owned(),
        experience_years: 12,
        bio: "Board certified.".to_owned(),
        photo: None,
    }
}

pub(crate) async fn account(db_pool: &SqlitePool, username: &str) -> AccountId {
    auth::store::create_account(db_pool, username, "password123").await.unwrap()
}

pub(crate) async fn doctor_with(db_pool: &SqlitePool, username: &str, fields: DoctorFields) -> Doctor {
    let account_id = account(db_pool, username).await;
    store::register(db_pool, account_id, fields).await.unwrap()
}

pub(crate) async fn doctor(db_pool: &SqlitePool, username: &str) -> Doctor {
    doctor_with(db_pool, username, fields(username, "Diagnostics", "Princeton-Plainsboro")).await
}

/// The full site behind an in-memory session store.
pub(crate) fn app(db_pool: SqlitePool) -> Router {
    let media_root = std::env::temp_dir().join(format!("docnet-app-{}", uuid::Uuid::now_v7().simple()));
    let state = AppState {
        db_pool,
        config: Arc::new(Config::for_tests(media_root)),
    };

    crate::router(state).layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
}

/// Signs `username` in through `POST /login/` and returns the session cookie.
pub(crate) async fn login(app: &Router, username: &str) -> String {
    let request = Request::post("/login/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password=password123")))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    cookie.split(';').next().unwrap().to_owned()
}
