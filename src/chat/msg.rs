use std::sync::Arc;

use axum::{debug_handler, extract::{Multipart, Path, State}, http::StatusCode, response::{IntoResponse, Redirect, Response}};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    auth, config::Config, db::DoctorId, doctors::{self, Doctor}, include_res,
    media::{self, MultipartForm, ATTACHMENTS}, res, AppError, AppResult, AppState,
};

use super::{page, store::{self, Message, OutgoingMessage}};

pub(crate) fn msg_to_html(message: &Message, me: &Doctor, other: &Doctor) -> String {
    let (direction, sender) = if message.sender_id == me.id {
        ("sent", me)
    } else {
        ("received", other)
    };

    let attachment = match &message.attachment {
        Some(path) => format!(
            r#"<a class="attachment" href="{}">attachment</a>"#,
            res::escape(&media::url(path))
        ),
        None => String::new(),
    };

    let sent_at = message.sent_at;
    let sent_at = format!("{} {:02}:{:02}", sent_at.date(), sent_at.hour(), sent_at.minute());

    include_res!(str, "/pages/message.html")
        .replace("{direction}", direction)
        .replace("{id}", &message.id.to_string())
        .replace("{sent_at}", &sent_at)
        .replace("{read}", if message.is_read { "read" } else { "unread" })
        .replace("{attachment}", &attachment)
        .replace("{sender}", &res::escape(&sender.name))
        .replace("{content}", &res::markdown(&message.text))
}

#[debug_handler(state = AppState)]
pub(crate) async fn send(
    Path(doctor_id): Path<DoctorId>,
    State(db_pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    session: Session,

    multipart: Multipart,
) -> AppResult<Response> {
    let me = auth::require_doctor(&db_pool, &session, &format!("/chat/{doctor_id}/")).await?;
    let other = doctors::store::get(&db_pool, doctor_id).await?;

    let mut form = MultipartForm::read(multipart).await?;
    let text = form.text("text");
    let attachment = match form.take_file("attachment") {
        Some(upload) => Some(media::store_upload(&config.media_root, ATTACHMENTS, &upload).await?),
        None => None,
    };

    let outgoing = OutgoingMessage { text: text.clone(), attachment: attachment.clone() };
    let sent = store::send(&db_pool, me.id, other.id, outgoing).await;
    if let (Err(_), Some(path)) = (&sent, &attachment) {
        media::discard(&config.media_root, path).await;
    }

    match sent {
        Ok(message) => {
            tracing::info!(message_id = message.id, from = me.id, to = other.id, "message sent");
            Ok(Redirect::to(&format!("/chat/{}/", other.id)).into_response())
        }
        Err(AppError::Validation(msg)) => {
            let html = page::chat_html(&db_pool, &me, &other, &text, Some(&msg)).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, html).into_response())
        }
        Err(err) => Err(err),
    }
}
