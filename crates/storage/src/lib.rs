use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{ExerciseRecord, RecordId, UserId};

/// Read/write access to the exercise record collection. Each call is a single
/// statement; nothing spans calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persists a new record and returns it with its store-assigned id.
    async fn save(&self, record: ExerciseRecord) -> Result<ExerciseRecord>;
    async fn delete_by_id(&self, id: RecordId) -> Result<()>;
    async fn find_all_by_owner(&self, owner_id: &UserId) -> Result<Vec<ExerciseRecord>>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

const RECORD_COLUMNS: &str = "id, owner_id, name, equipment, sets, reps, weight, created_at";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: RecordId) -> Result<Option<ExerciseRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM exercise_records WHERE id = ?"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    /// Most recent entry for this owner and exercise name, if any.
    pub async fn find_by_owner_and_name(
        &self,
        owner_id: &UserId,
        name: &str,
    ) -> Result<Option<ExerciseRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM exercise_records
             WHERE owner_id = ? AND name = ?
             ORDER BY id DESC
             LIMIT 1"
        ))
        .bind(owner_id.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    pub async fn find_all(&self) -> Result<Vec<ExerciseRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM exercise_records ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    pub async fn find_all_by_name(&self, name: &str) -> Result<Vec<ExerciseRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM exercise_records WHERE name = ? ORDER BY id ASC"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    pub async fn find_all_by_equipment(&self, equipment: &str) -> Result<Vec<ExerciseRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM exercise_records WHERE equipment = ? ORDER BY id ASC"
        ))
        .bind(equipment)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(record_from_row).collect())
    }
}

#[async_trait]
impl RecordStore for Storage {
    async fn save(&self, record: ExerciseRecord) -> Result<ExerciseRecord> {
        let created_at = Utc::now();
        let row = sqlx::query(
            "INSERT INTO exercise_records (owner_id, name, equipment, sets, reps, weight, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(record.owner_id.as_str())
        .bind(&record.name)
        .bind(&record.equipment)
        .bind(&record.sets)
        .bind(&record.reps)
        .bind(&record.weight)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to insert exercise record for {}", record.owner_id))?;

        Ok(ExerciseRecord {
            id: Some(RecordId(row.get::<i64, _>(0))),
            created_at: Some(created_at),
            ..record
        })
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<()> {
        sqlx::query("DELETE FROM exercise_records WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete exercise record {id}"))?;
        Ok(())
    }

    async fn find_all_by_owner(&self, owner_id: &UserId) -> Result<Vec<ExerciseRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM exercise_records WHERE owner_id = ? ORDER BY id ASC"
        ))
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(record_from_row).collect())
    }
}

fn record_from_row(r: &SqliteRow) -> ExerciseRecord {
    ExerciseRecord {
        id: Some(RecordId(r.get::<i64, _>(0))),
        owner_id: UserId(r.get::<String, _>(1)),
        name: r.get::<String, _>(2),
        equipment: r.get::<String, _>(3),
        sets: r.get::<String, _>(4),
        reps: r.get::<String, _>(5),
        weight: r.get::<String, _>(6),
        created_at: r.try_get::<DateTime<Utc>, _>(7).ok(),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
