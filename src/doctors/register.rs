use std::sync::Arc;

use axum::{debug_handler, extract::{Multipart, State}, http::StatusCode, response::{Html, IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, config::Config, media::{self, MultipartForm}, AppError, AppResult, AppState};

use super::{form::DoctorForm, store};

const TITLE: &str = "Register as a doctor";

#[debug_handler(state = AppState)]
pub(crate) async fn register_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let account_id = auth::require_account(&session, "/register/").await?;
    if let Some(doctor) = store::find_by_account(&db_pool, account_id).await? {
        return Ok(Redirect::to(&format!("/doctor/{}/", doctor.id)).into_response());
    }

    Ok(Html(DoctorForm::default().render(TITLE, "/register/", None)).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    session: Session,

    multipart: Multipart,
) -> AppResult<Response> {
    let account_id = auth::require_account(&session, "/register/").await?;
    if let Some(doctor) = store::find_by_account(&db_pool, account_id).await? {
        return Ok(Redirect::to(&format!("/doctor/{}/", doctor.id)).into_response());
    }

    let mut upload = MultipartForm::read(multipart).await?;
    let form = DoctorForm::from_multipart(&upload);

    let invalid = |msg: &str| {
        (StatusCode::UNPROCESSABLE_ENTITY, Html(form.render(TITLE, "/register/", Some(msg)))).into_response()
    };

    let fields = match form.into_fields(&config.media_root, upload.take_file("photo")).await {
        Ok(fields) => fields,
        Err(AppError::Validation(msg)) => return Ok(invalid(&msg)),
        Err(err) => return Err(err),
    };
    let stored_photo = fields.photo.clone();

    let registered = store::register(&db_pool, account_id, fields).await;
    if let (Err(_), Some(path)) = (&registered, &stored_photo) {
        media::discard(&config.media_root, path).await;
    }

    match registered {
        Ok(doctor) => {
            tracing::info!(account_id, doctor_id = doctor.id, "doctor registered");
            Ok(Redirect::to(&format!("/doctor/{}/", doctor.id)).into_response())
        }
        Err(AppError::Validation(msg)) => Ok(invalid(&msg)),
        Err(err) => Err(err),
    }
}
