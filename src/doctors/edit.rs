use std::sync::Arc;

use axum::{debug_handler, extract::{Multipart, State}, http::StatusCode, response::{Html, IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, config::Config, media::{self, MultipartForm}, AppError, AppResult, AppState};

use super::{form::DoctorForm, store};

const TITLE: &str = "Edit your profile";

#[debug_handler(state = AppState)]
pub(crate) async fn edit_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Html<String>> {
    let doctor = auth::require_doctor(&db_pool, &session, "/doctor/edit/").await?;
    Ok(Html(DoctorForm::from(&doctor).render(TITLE, "/doctor/edit/", None)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit(
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    session: Session,

    multipart: Multipart,
) -> AppResult<Response> {
    let doctor = auth::require_doctor(&db_pool, &session, "/doctor/edit/").await?;

    let mut upload = MultipartForm::read(multipart).await?;
    let form = DoctorForm::from_multipart(&upload);

    let invalid = |msg: &str| {
        (StatusCode::UNPROCESSABLE_ENTITY, Html(form.render(TITLE, "/doctor/edit/", Some(msg)))).into_response()
    };

    let fields = match form.into_fields(&config.media_root, upload.take_file("photo")).await {
        Ok(fields) => fields,
        Err(AppError::Validation(msg)) => return Ok(invalid(&msg)),
        Err(err) => return Err(err),
    };
    let stored_photo = fields.photo.clone();

    let edited = store::edit(&db_pool, doctor.account_id, fields).await;
    if let (Err(_), Some(path)) = (&edited, &stored_photo) {
        media::discard(&config.media_root, path).await;
    }

    match edited {
        Ok(doctor) => {
            tracing::info!(doctor_id = doctor.id, "profile updated");
            Ok(Redirect::to(&format!("/doctor/{}/", doctor.id)).into_response())
        }
        Err(AppError::Validation(msg)) => Ok(invalid(&msg)),
        Err(err) => Err(err),
    }
}
