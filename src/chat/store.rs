use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::{AppError, AppResult, db::DoctorId};

const COLUMNS: &str = "id,sender_id,recipient_id,text,attachment,sent_at,is_read";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Message {
    pub id: i64,
    pub sender_id: DoctorId,
    pub recipient_id: DoctorId,
    pub text: String,
    pub attachment: Option<String>,
    pub sent_at: OffsetDateTime,
    pub is_read: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub text: String,
    pub attachment: Option<String>,
}

/// An unread message with its sender's name, for inbox listings.
#[derive(Debug, Clone, FromRow)]
pub struct UnreadMessage {
    pub id: i64,
    pub sender_id: DoctorId,
    pub sender_name: String,
    pub text: String,
    pub sent_at: OffsetDateTime,
}

pub async fn send(
    db_pool: &SqlitePool,
    sender: DoctorId,
    recipient: DoctorId,
    OutgoingMessage { text, attachment }: OutgoingMessage,
) -> AppResult<Message> {
    let text = text.trim();
    if text.is_empty() && attachment.is_none() {
        return Err(AppError::validation("write a message or attach a file"));
    }

    Ok(sqlx::query_as(&format!(
        "INSERT INTO messages (sender_id,recipient_id,text,attachment,sent_at,is_read) VALUES (?,?,?,?,?,0)
         RETURNING {COLUMNS}"
    ))
    .bind(sender)
    .bind(recipient)
    .bind(text)
    .bind(attachment)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db_pool)
    .await?)
}

/// Marks everything `other` has sent to `viewer` as read. Returns how many flipped.
pub async fn mark_read(db_pool: &SqlitePool, viewer: DoctorId, other: DoctorId) -> AppResult<u64> {
    let result = sqlx::query("UPDATE messages SET is_read=1 WHERE sender_id=? AND recipient_id=? AND is_read=0")
        .bind(other)
        .bind(viewer)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected())
}

/// Both directions of the conversation, oldest first.
pub async fn history(db_pool: &SqlitePool, a: DoctorId, b: DoctorId) -> AppResult<Vec<Message>> {
    Ok(sqlx::query_as(&format!(
        "SELECT {COLUMNS} FROM messages
         WHERE (sender_id=?1 AND recipient_id=?2) OR (sender_id=?2 AND recipient_id=?1)
         ORDER BY julianday(sent_at), id"
    ))
    .bind(a)
    .bind(b)
    .fetch_all(db_pool)
    .await?)
}

pub async fn unread_for(db_pool: &SqlitePool, recipient: DoctorId) -> AppResult<Vec<UnreadMessage>> {
    Ok(sqlx::query_as(
        "SELECT m.id, m.sender_id, d.name AS sender_name, m.text, m.sent_at
         FROM messages m JOIN doctors d ON d.id = m.sender_id
         WHERE m.recipient_id=? AND m.is_read=0
         ORDER BY julianday(m.sent_at) DESC, m.id DESC",
    )
    .bind(recipient)
    .fetch_all(db_pool)
    .await?)
}
