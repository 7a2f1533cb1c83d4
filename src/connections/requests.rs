use axum::{debug_handler, extract::{Path, State}, response::Redirect};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, db::DoctorId, doctors, AppResult, AppState};

use super::store;

#[debug_handler(state = AppState)]
pub(crate) async fn connect(
    Path(doctor_id): Path<DoctorId>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Redirect> {
    let me = auth::require_doctor(&db_pool, &session, &format!("/connect/{doctor_id}/")).await?;
    let target = doctors::store::get(&db_pool, doctor_id).await?;

    if store::request(&db_pool, me.id, target.id).await? {
        tracing::info!(from = me.id, to = target.id, "connection requested");
    }

    Ok(Redirect::to(&format!("/doctor/{}/", target.id)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn accept(
    Path(conn_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Redirect> {
    let me = auth::require_doctor(&db_pool, &session, &format!("/accept/{conn_id}/")).await?;
    let connection = store::accept(&db_pool, conn_id, me.id).await?;

    tracing::info!(from = connection.from_doctor, to = connection.to_doctor, "connection accepted");
    Ok(Redirect::to(&format!("/doctor/{}/", connection.from_doctor)))
}
