use axum::{debug_handler, extract::{Path, State}, response::{Html, Redirect}};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, db::DoctorId, doctors::{self, Doctor}, include_res, res, AppResult, AppState};

use super::{msg, store};

pub(crate) async fn chat_html(
    db_pool: &SqlitePool,
    me: &Doctor,
    other: &Doctor,
    draft: &str,
    error: Option<&str>,
) -> AppResult<Html<String>> {
    let messages: String = store::history(db_pool, me.id, other.id)
        .await?
        .iter()
        .map(|message| msg::msg_to_html(message, me, other))
        .collect();

    Ok(Html(
        include_res!(str, "/pages/chat.html")
            .replace("{nav}", include_res!(str, "/pages/nav.html"))
            .replace("{other_id}", &other.id.to_string())
            .replace("{error}", &res::error_banner(error))
            .replace("{other_name}", &res::escape(&other.name))
            .replace("{text}", &res::escape(draft))
            .replace("{messages}", &messages),
    ))
}

/// Opening a conversation marks what the other side sent as read, then shows it.
#[debug_handler(state = AppState)]
pub(crate) async fn chat(
    Path(doctor_id): Path<DoctorId>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Html<String>> {
    let me = auth::require_doctor(&db_pool, &session, &format!("/chat/{doctor_id}/")).await?;
    let other = doctors::store::get(&db_pool, doctor_id).await?;

    store::mark_read(&db_pool, me.id, other.id).await?;
    chat_html(&db_pool, &me, &other, "", None).await
}

#[debug_handler(state = AppState)]
pub(crate) async fn read(
    Path(doctor_id): Path<DoctorId>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Redirect> {
    let me = auth::require_doctor(&db_pool, &session, &format!("/chat/{doctor_id}/")).await?;
    let other = doctors::store::get(&db_pool, doctor_id).await?;

    let marked = store::mark_read(&db_pool, me.id, other.id).await?;
    tracing::debug!(viewer = me.id, other = other.id, marked, "messages marked read");

    Ok(Redirect::to(&format!("/chat/{}/", other.id)))
}

#[cfg(test)]
mod tests {
    use axum::{body::{to_bytes, Body}, http::{header, Request, StatusCode}};
    use tower::ServiceExt;

    use crate::{chat::{store, OutgoingMessage}, db::memory_pool, testing};

    #[tokio::test]
    async fn opening_the_chat_marks_it_read() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;
        let b = testing::doctor(&db_pool, "b").await;
        store::send(&db_pool, a.id, b.id, OutgoingMessage { text: "hello".to_owned(), attachment: None })
            .await
            .unwrap();
        assert_eq!(store::unread_for(&db_pool, b.id).await.unwrap().len(), 1);

        let app = testing::app(db_pool.clone());
        let cookie = testing::login(&app, "b").await;

        let request = Request::get(format!("/chat/{}/", a.id))
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("hello"));

        let history = store::history(&db_pool, a.id, b.id).await.unwrap();
        assert!(history[0].is_read);
        assert!(store::unread_for(&db_pool, b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn anonymous_visitor_is_sent_to_login() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;

        let request = Request::get(format!("/chat/{}/", a.id)).body(Body::empty()).unwrap();
        let response = testing::app(db_pool).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            format!("/login/?return_url=/chat/{}/", a.id).as_str()
        );
    }
}
