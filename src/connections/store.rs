use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::{AppError, AppResult, db::DoctorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
}

#[derive(Debug, Clone, FromRow)]
pub struct Connection {
    pub id: i64,
    pub from_doctor: DoctorId,
    pub to_doctor: DoctorId,
    pub status: ConnectionStatus,
    pub created_at: OffsetDateTime,
}

/// How one doctor stands with another, from the first doctor's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Connected,
    Pending,
    None,
}

/// The other end of an edge, with the display fields a listing needs.
#[derive(Debug, Clone, FromRow)]
pub struct Peer {
    pub connection_id: i64,
    pub doctor_id: DoctorId,
    pub name: String,
    pub specialty: String,
}

/// Get-or-create a pending edge `from -> to`. Returns whether a row was created.
///
/// Asking yourself is a no-op, as is repeating a request for a pair that already
/// has an edge in that direction, whatever its status.
pub async fn request(db_pool: &SqlitePool, from: DoctorId, to: DoctorId) -> AppResult<bool> {
    if from == to {
        return Ok(false);
    }

    let result = sqlx::query(
        "INSERT INTO connections (from_doctor,to_doctor,status,created_at) VALUES (?,?,?,?)
         ON CONFLICT(from_doctor,to_doctor) DO NOTHING",
    )
    .bind(from)
    .bind(to)
    .bind(ConnectionStatus::Pending)
    .bind(OffsetDateTime::now_utc())
    .execute(db_pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Moves a pending edge to accepted. Only the edge's target may do this.
pub async fn accept(db_pool: &SqlitePool, connection_id: i64, acting: DoctorId) -> AppResult<Connection> {
    let accepted: Option<Connection> = sqlx::query_as(
        "UPDATE connections SET status=? WHERE id=? AND to_doctor=? AND status=?
         RETURNING id,from_doctor,to_doctor,status,created_at",
    )
    .bind(ConnectionStatus::Accepted)
    .bind(connection_id)
    .bind(acting)
    .bind(ConnectionStatus::Pending)
    .fetch_optional(db_pool)
    .await?;

    if let Some(connection) = accepted {
        return Ok(connection);
    }

    let existing: Option<Connection> =
        sqlx::query_as("SELECT id,from_doctor,to_doctor,status,created_at FROM connections WHERE id=?")
            .bind(connection_id)
            .fetch_optional(db_pool)
            .await?;

    match existing {
        None => Err(AppError::NotFound("connection request")),
        Some(connection) if connection.to_doctor != acting => {
            Err(AppError::Forbidden("only the requested doctor can accept"))
        }
        Some(_) => Err(AppError::NotFound("pending connection request")),
    }
}

pub async fn status(db_pool: &SqlitePool, me: DoctorId, other: DoctorId) -> AppResult<Relation> {
    if me == other {
        return Ok(Relation::None);
    }

    let edges: Vec<(DoctorId, ConnectionStatus)> = sqlx::query_as(
        "SELECT from_doctor,status FROM connections
         WHERE (from_doctor=?1 AND to_doctor=?2) OR (from_doctor=?2 AND to_doctor=?1)",
    )
    .bind(me)
    .bind(other)
    .fetch_all(db_pool)
    .await?;

    let relation = if edges.iter().any(|(_, status)| *status == ConnectionStatus::Accepted) {
        Relation::Connected
    } else if edges.iter().any(|(from, status)| *from == me && *status == ConnectionStatus::Pending) {
        Relation::Pending
    } else {
        Relation::None
    };
    Ok(relation)
}

/// Doctors joined to `me` by an accepted edge in either direction, once each.
pub async fn connected_with(db_pool: &SqlitePool, me: DoctorId) -> AppResult<Vec<Peer>> {
    Ok(sqlx::query_as(
        "SELECT MIN(c.id) AS connection_id, d.id AS doctor_id, d.name, d.specialty
         FROM connections c
         JOIN doctors d ON d.id = CASE WHEN c.from_doctor=?1 THEN c.to_doctor ELSE c.from_doctor END
         WHERE (c.from_doctor=?1 OR c.to_doctor=?1) AND c.status='accepted'
         GROUP BY d.id, d.name, d.specialty
         ORDER BY d.name, d.id",
    )
    .bind(me)
    .fetch_all(db_pool)
    .await?)
}

/// Requests waiting on `me` to accept, oldest first.
pub async fn find_pending_for_doctor(db_pool: &SqlitePool, me: DoctorId) -> AppResult<Vec<Peer>> {
    Ok(sqlx::query_as(
        "SELECT c.id AS connection_id, d.id AS doctor_id, d.name, d.specialty
         FROM connections c JOIN doctors d ON d.id = c.from_doctor
         WHERE c.to_doctor=? AND c.status='pending'
         ORDER BY c.id",
    )
    .bind(me)
    .fetch_all(db_pool)
    .await?)
}

/// Requests `me` has sent that are still unanswered.
pub async fn find_pending_from_doctor(db_pool: &SqlitePool, me: DoctorId) -> AppResult<Vec<Peer>> {
    Ok(sqlx::query_as(
        "SELECT c.id AS connection_id, d.id AS doctor_id, d.name, d.specialty
         FROM connections c JOIN doctors d ON d.id = c.to_doctor
         WHERE c.from_doctor=? AND c.status='pending'
         ORDER BY c.id",
    )
    .bind(me)
    .fetch_all(db_pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory_pool, testing};

    async fn edges(db_pool: &SqlitePool) -> Vec<(DoctorId, DoctorId, ConnectionStatus)> {
        sqlx::query_as("SELECT from_doctor,to_doctor,status FROM connections ORDER BY id")
            .fetch_all(db_pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn request_then_accept() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;
        let b = testing::doctor(&db_pool, "b").await;

        assert!(request(&db_pool, a.id, b.id).await.unwrap());
        assert_eq!(edges(&db_pool).await, vec![(a.id, b.id, ConnectionStatus::Pending)]);
        assert_eq!(status(&db_pool, a.id, b.id).await.unwrap(), Relation::Pending);
        assert_eq!(status(&db_pool, b.id, a.id).await.unwrap(), Relation::None);

        let pending = find_pending_for_doctor(&db_pool, b.id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].doctor_id, a.id);

        let accepted = accept(&db_pool, pending[0].connection_id, b.id).await.unwrap();
        assert_eq!(accepted.status, ConnectionStatus::Accepted);
        assert_eq!(edges(&db_pool).await, vec![(a.id, b.id, ConnectionStatus::Accepted)]);
        assert_eq!(status(&db_pool, a.id, b.id).await.unwrap(), Relation::Connected);
        assert_eq!(status(&db_pool, b.id, a.id).await.unwrap(), Relation::Connected);
    }

    #[tokio::test]
    async fn request_is_idempotent() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;
        let b = testing::doctor(&db_pool, "b").await;

        assert!(request(&db_pool, a.id, b.id).await.unwrap());
        assert!(!request(&db_pool, a.id, b.id).await.unwrap());
        assert_eq!(edges(&db_pool).await.len(), 1);
    }

    #[tokio::test]
    async fn request_after_acceptance_is_a_no_op() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;
        let b = testing::doctor(&db_pool, "b").await;

        request(&db_pool, a.id, b.id).await.unwrap();
        let id = find_pending_for_doctor(&db_pool, b.id).await.unwrap()[0].connection_id;
        accept(&db_pool, id, b.id).await.unwrap();

        assert!(!request(&db_pool, a.id, b.id).await.unwrap());
        assert_eq!(edges(&db_pool).await, vec![(a.id, b.id, ConnectionStatus::Accepted)]);
    }

    #[tokio::test]
    async fn self_request_is_ignored() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;

        assert!(!request(&db_pool, a.id, a.id).await.unwrap());
        assert!(edges(&db_pool).await.is_empty());
        assert_eq!(status(&db_pool, a.id, a.id).await.unwrap(), Relation::None);
    }

    #[tokio::test]
    async fn reverse_request_is_its_own_edge() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;
        let b = testing::doctor(&db_pool, "b").await;

        request(&db_pool, a.id, b.id).await.unwrap();
        assert!(request(&db_pool, b.id, a.id).await.unwrap());
        assert_eq!(status(&db_pool, a.id, b.id).await.unwrap(), Relation::Pending);
        assert_eq!(status(&db_pool, b.id, a.id).await.unwrap(), Relation::Pending);
    }

    #[tokio::test]
    async fn only_the_target_can_accept() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;
        let b = testing::doctor(&db_pool, "b").await;
        let c = testing::doctor(&db_pool, "c").await;

        request(&db_pool, a.id, b.id).await.unwrap();
        let id = find_pending_from_doctor(&db_pool, a.id).await.unwrap()[0].connection_id;

        assert!(matches!(accept(&db_pool, id, a.id).await, Err(AppError::Forbidden(_))));
        assert!(matches!(accept(&db_pool, id, c.id).await, Err(AppError::Forbidden(_))));
        assert_eq!(status(&db_pool, a.id, b.id).await.unwrap(), Relation::Pending);
    }

    #[tokio::test]
    async fn accept_twice_or_missing_fails() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;
        let b = testing::doctor(&db_pool, "b").await;

        request(&db_pool, a.id, b.id).await.unwrap();
        let id = find_pending_for_doctor(&db_pool, b.id).await.unwrap()[0].connection_id;
        accept(&db_pool, id, b.id).await.unwrap();

        assert!(matches!(accept(&db_pool, id, b.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(accept(&db_pool, id + 100, b.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn sidebar_listings() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;
        let b = testing::doctor(&db_pool, "b").await;
        let c = testing::doctor(&db_pool, "c").await;
        let d = testing::doctor(&db_pool, "d").await;

        request(&db_pool, a.id, b.id).await.unwrap();
        request(&db_pool, c.id, a.id).await.unwrap();
        request(&db_pool, a.id, d.id).await.unwrap();
        let id = find_pending_for_doctor(&db_pool, a.id).await.unwrap()[0].connection_id;
        accept(&db_pool, id, a.id).await.unwrap();
        let id = find_pending_for_doctor(&db_pool, b.id).await.unwrap()[0].connection_id;
        accept(&db_pool, id, b.id).await.unwrap();

        let connected: Vec<DoctorId> = connected_with(&db_pool, a.id).await.unwrap().iter().map(|p| p.doctor_id).collect();
        assert_eq!(connected, vec![b.id, c.id]);

        let outgoing: Vec<DoctorId> = find_pending_from_doctor(&db_pool, a.id).await.unwrap().iter().map(|p| p.doctor_id).collect();
        assert_eq!(outgoing, vec![d.id]);
        assert!(find_pending_for_doctor(&db_pool, a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutual_acceptance_lists_peer_once() {
        let db_pool = memory_pool().await;
        let a = testing::doctor(&db_pool, "a").await;
        let b = testing::doctor(&db_pool, "b").await;

        request(&db_pool, a.id, b.id).await.unwrap();
        request(&db_pool, b.id, a.id).await.unwrap();
        let id = find_pending_for_doctor(&db_pool, b.id).await.unwrap()[0].connection_id;
        accept(&db_pool, id, b.id).await.unwrap();
        let id = find_pending_for_doctor(&db_pool, a.id).await.unwrap()[0].connection_id;
        accept(&db_pool, id, a.id).await.unwrap();
        assert_eq!(edges(&db_pool).await.len(), 2);

        let peers = connected_with(&db_pool, a.id).await.unwrap();
        assert_eq!(peers.iter().map(|p| p.doctor_id).collect::<Vec<_>>(), vec![b.id]);
        let peers = connected_with(&db_pool, b.id).await.unwrap();
        assert_eq!(peers.iter().map(|p| p.doctor_id).collect::<Vec<_>>(), vec![a.id]);
    }
}
