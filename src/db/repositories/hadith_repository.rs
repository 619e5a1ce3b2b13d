use sqlx::SqlitePool;

use super::parse_dt;
use crate::models::entities::Hadith;

pub struct HadithRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct HadithRow {
    id: String,
    text: String,
    category: Option<String>,
    created_at: String,
}

impl From<HadithRow> for Hadith {
    fn from(row: HadithRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            category: row.category,
            created_at: parse_dt(&row.created_at),
        }
    }
}

const SELECT_COLS: &str = "id, text, category, created_at";

impl HadithRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, hadith_id: &str) -> Result<Option<Hadith>, sqlx::Error> {
        let sql = format!("SELECT {SELECT_COLS} FROM hadiths WHERE id = ?");

        let row = sqlx::query_as::<_, HadithRow>(&sql)
            .bind(hadith_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Hadith::from))
    }

    /// Newest record by creation time, ties broken by id.
    pub async fn latest(&self) -> Result<Option<Hadith>, sqlx::Error> {
        let sql = format!(
            "SELECT {SELECT_COLS} FROM hadiths ORDER BY created_at DESC, id DESC LIMIT 1"
        );

        let row = sqlx::query_as::<_, HadithRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Hadith::from))
    }

    pub async fn insert(&self, hadith: &Hadith) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO hadiths (id, text, category, created_at) VALUES (?, ?, ?, ?)")
            .bind(&hadith.id)
            .bind(&hadith.text)
            .bind(&hadith.category)
            .bind(hadith.created_at.format("%Y-%m-%d %H:%M:%S").to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM hadiths")
            .fetch_one(&self.pool)
            .await
    }
}
