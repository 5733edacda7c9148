use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Id-keyed access to one table; `label` names the entity in error messages
pub struct Repository<T> {
    table_name: &'static str,
    label: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: &'static str, label: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            label,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn select_one(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM \"{}\" WHERE id = $1", self.table_name);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row)
    }

    pub async fn select_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.select_one(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", self.label)))
    }

    pub async fn delete_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1 RETURNING *", self.table_name);
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", self.label)))
    }

    /// Case-insensitive uniqueness probe, ignoring `exclude` (the row being updated)
    pub async fn is_taken(&self, column: &'static str, value: &str, exclude: Option<Uuid>) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM \"{}\" WHERE lower(\"{}\") = lower($1) AND ($2::uuid IS NULL OR id <> $2))",
            self.table_name, column
        );
        let taken: bool = sqlx::query_scalar(&sql)
            .bind(value)
            .bind(exclude)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }
}

/// Rows in `table` whose `column` points at `id`
pub async fn count_references(pool: &PgPool, table: &'static str, column: &'static str, id: Uuid) -> Result<i64, DatabaseError> {
    let sql = format!("SELECT COUNT(*) FROM \"{}\" WHERE \"{}\" = $1", table, column);
    let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;
    Ok(count)
}
