use std::sync::Arc;

use axum::{debug_handler, extract::{Path, State}, http::StatusCode, response::{Html, IntoResponse, Redirect, Response}, Form};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    auth, config::Config, connections::{self, Relation}, db::DoctorId, include_res, media, res,
    reviews::{self, Review, ReviewForm}, AppError, AppResult, AppState,
};

use super::{store, Doctor};

fn review_item_html(review: &Review) -> String {
    let created_at = review.created_at.date().to_string();
    include_res!(str, "/pages/review_item.html")
        .replace("{rating}", &review.rating.to_string())
        .replace("{created_at}", &created_at)
        .replace("{reviewer_name}", &res::escape(&review.reviewer_name))
        .replace("{comment}", &res::escape(&review.comment))
}

async fn actions_html(db_pool: &SqlitePool, me: Option<&Doctor>, doctor: &Doctor) -> AppResult<String> {
    let Some(me) = me else {
        return Ok(r#"<a href="/login/">Log in to connect</a>"#.to_owned());
    };
    if me.id == doctor.id {
        return Ok(r#"<a href="/doctor/edit/">Edit profile</a>"#.to_owned());
    }

    let id = doctor.id;
    let relation = match connections::store::status(db_pool, me.id, id).await? {
        Relation::Connected => "<span>Connected</span>".to_owned(),
        Relation::Pending => "<span>Connection request sent</span>".to_owned(),
        Relation::None => format!(r#"<a href="/connect/{id}/">Connect</a>"#),
    };
    Ok(format!(r#"{relation} <a href="/chat/{id}/">Message</a>"#))
}

async fn profile_html(
    db_pool: &SqlitePool,
    config: &Config,
    doctor: &Doctor,
    me: Option<&Doctor>,
    form: &ReviewForm,
    error: Option<&str>,
) -> AppResult<Html<String>> {
    let reviews = reviews::store::recent(db_pool, doctor.id, config.reviews_shown).await?;
    let review_items: String = reviews.iter().map(review_item_html).collect();

    let avg_rating = match reviews::store::average_rating(db_pool, doctor.id).await? {
        Some(avg) => format!("{avg:.1} / 5"),
        None => "No reviews yet".to_owned(),
    };

    Ok(Html(
        include_res!(str, "/pages/doctor_profile.html")
            .replace("{nav}", include_res!(str, "/pages/nav.html"))
            .replace("{id}", &doctor.id.to_string())
            .replace("{avg_rating}", &avg_rating)
            .replace("{actions}", &actions_html(db_pool, me, doctor).await?)
            .replace("{error}", &res::error_banner(error))
            .replace("{photo_url}", &res::escape(&media::url(&doctor.photo)))
            .replace("{experience_years}", &doctor.experience_years.to_string())
            .replace("{specialty}", &res::escape(&doctor.specialty))
            .replace("{clinic_address}", &res::escape(&doctor.clinic_address))
            .replace("{reviewer_name}", &res::escape(&form.reviewer_name))
            .replace("{comment}", &res::escape(&form.comment))
            .replace("{bio}", &res::markdown(&doctor.bio))
            .replace("{review_items}", &review_items)
            .replace("{name}", &res::escape(&doctor.name)),
    ))
}

#[debug_handler(state = AppState)]
pub(crate) async fn profile(
    Path(id): Path<DoctorId>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    session: Session,
) -> AppResult<Html<String>> {
    let doctor = store::get(&db_pool, id).await?;
    let me = auth::current_doctor(&db_pool, &session).await?;

    profile_html(&db_pool, &config, &doctor, me.as_ref(), &ReviewForm::default(), None).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn review(
    Path(id): Path<DoctorId>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    session: Session,

    Form(form): Form<ReviewForm>,
) -> AppResult<Response> {
    let doctor = store::get(&db_pool, id).await?;

    let added = match form.validate() {
        Ok(review) => reviews::store::add(&db_pool, doctor.id, review).await,
        Err(err) => Err(err),
    };

    match added {
        Ok(review) => {
            tracing::info!(doctor_id = doctor.id, rating = review.rating, "review added");
            Ok(Redirect::to(&format!("/doctor/{id}/")).into_response())
        }
        Err(AppError::Validation(msg)) => {
            let me = auth::current_doctor(&db_pool, &session).await?;
            let html = profile_html(&db_pool, &config, &doctor, me.as_ref(), &form, Some(&msg)).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, html).into_response())
        }
        Err(err) => Err(err),
    }
}
