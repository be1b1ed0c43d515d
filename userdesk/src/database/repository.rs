//! Repository layer for database operations
//!
//! SQLite-backed `RecordStore` over the `users` table.

use super::models::*;
use crate::error::{AppError, Result};
use crate::storage::RecordStore;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository for user rows
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for Repository {
    async fn select(&self) -> Result<Vec<Record>> {
        let records = sqlx::query_as::<_, Record>(
            r#"
            SELECT id, name, age, email FROM users ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn insert(&self, record: &NewRecord) -> Result<Record> {
        let created = sqlx::query_as::<_, Record>(
            r#"
            INSERT INTO users (name, age, email)
            VALUES (?, ?, ?)
            RETURNING id, name, age, email
            "#,
        )
        .bind(&record.name)
        .bind(record.age)
        .bind(&record.email)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Inserted record: {}", created.id);
        Ok(created)
    }

    async fn update(&self, id: i64, changes: &RecordChanges) -> Result<()> {
        let rows = sqlx::query(
            r#"
            UPDATE users SET name = ?, age = ?, email = ? WHERE id = ?
            "#,
        )
        .bind(&changes.name)
        .bind(changes.age)
        .bind(&changes.email)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::RecordNotFound(id));
        }

        tracing::debug!("Updated record: {}", id);
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::RecordNotFound(id));
        }

        tracing::debug!("Deleted record: {}", id);
        Ok(())
    }
}
