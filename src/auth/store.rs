use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use tokio::task;

use crate::{AppError, AppResult, db::AccountId};

use super::password;

#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub password_hash: String,
}

pub async fn create_account(db_pool: &SqlitePool, username: &str, password: &str) -> AppResult<AccountId> {
    let password = password.to_owned();
    let password_hash = task::spawn_blocking(move || password::hash(&password)).await??;

    let (id,): (AccountId,) = sqlx::query_as(
        "INSERT INTO accounts (username,password_hash,created_at) VALUES (?,?,?) RETURNING id",
    )
    .bind(username)
    .bind(password_hash)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db_pool)
    .await
    .map_err(|err| match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict("that username is already taken".to_owned()),
        err => err,
    })?;

    Ok(id)
}

pub async fn find_by_username(db_pool: &SqlitePool, username: &str) -> AppResult<Option<Account>> {
    Ok(sqlx::query_as("SELECT id,username,password_hash FROM accounts WHERE username=?")
        .bind(username)
        .fetch_optional(db_pool)
        .await?)
}

/// Checks a username/password pair, yielding the account on success.
pub async fn authenticate(db_pool: &SqlitePool, username: &str, password: &str) -> AppResult<Option<AccountId>> {
    let Some(account) = find_by_username(db_pool, username).await? else {
        return Ok(None);
    };

    let password = password.to_owned();
    let hashed = account.password_hash;
    let matches = task::spawn_blocking(move || password::verify(&password, &hashed)).await??;

    Ok(matches.then_some(account.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn authenticates_with_the_right_password() {
        let db_pool = memory_pool().await;
        let id = create_account(&db_pool, "house", "vicodin123").await.unwrap();

        assert_eq!(authenticate(&db_pool, "house", "vicodin123").await.unwrap(), Some(id));
        assert_eq!(authenticate(&db_pool, "house", "lupus").await.unwrap(), None);
        assert_eq!(authenticate(&db_pool, "wilson", "vicodin123").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let db_pool = memory_pool().await;
        create_account(&db_pool, "cuddy", "password1").await.unwrap();

        let err = create_account(&db_pool, "cuddy", "password2").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("taken")));
    }

    #[tokio::test]
    async fn password_is_not_stored_in_clear() {
        let db_pool = memory_pool().await;
        create_account(&db_pool, "foreman", "neurology").await.unwrap();

        let account = find_by_username(&db_pool, "foreman").await.unwrap().unwrap();
        assert_ne!(account.password_hash, "neurology");
    }
}
