use sqlx::SqlitePool;

use super::parse_dt;
use crate::models::entities::DeviceToken;

pub struct TokenRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    token: String,
    enabled: i64,
    created_at: String,
    updated_at: String,
}

impl From<TokenRow> for DeviceToken {
    fn from(row: TokenRow) -> Self {
        Self {
            token: row.token,
            enabled: row.enabled != 0,
            created_at: parse_dt(&row.created_at),
            updated_at: parse_dt(&row.updated_at),
        }
    }
}

impl TokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, token: &str) -> Result<Option<DeviceToken>, sqlx::Error> {
        let row = sqlx::query_as::<_, TokenRow>(
            "SELECT token, enabled, created_at, updated_at FROM tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DeviceToken::from))
    }

    /// Register a token. Existing rows are left untouched (their `enabled`
    /// flag survives re-registration). Returns whether a row was created.
    pub async fn upsert(&self, token: &str, enabled: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO tokens (token, enabled) VALUES (?, ?)
             ON CONFLICT (token) DO NOTHING",
        )
        .bind(token)
        .bind(enabled as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flip the enabled flag. Returns false when the token is unknown.
    pub async fn set_enabled(&self, token: &str, enabled: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tokens SET enabled = ?, updated_at = CURRENT_TIMESTAMP WHERE token = ?",
        )
        .bind(enabled as i64)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a token. Idempotent: removing an absent token is not an error.
    pub async fn remove(&self, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM tokens WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Snapshot of all enabled token values. No ordering guarantee.
    pub async fn list_enabled(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT token FROM tokens WHERE enabled = 1")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tokens")
            .fetch_one(&self.pool)
            .await
    }

    pub async fn count_enabled(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE enabled = 1")
            .fetch_one(&self.pool)
            .await
    }
}
