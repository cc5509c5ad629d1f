//! Repositorio de Fare

use sqlx::{PgPool, Postgres, Transaction};

use crate::models::fare::{Fare, FareFilters, FareScope};
use crate::utils::errors::AppResult;

pub struct FareRepository {
    pool: PgPool,
}

impl FareRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Fare>> {
        let fare = sqlx::query_as::<_, Fare>("SELECT * FROM fare WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(fare)
    }

    pub async fn search(&self, filters: &FareFilters) -> AppResult<Vec<Fare>> {
        let fares = sqlx::query_as::<_, Fare>(
            r#"
            SELECT * FROM fare
            WHERE ($1::int IS NULL OR company_id = $1 OR company_id IS NULL)
              AND ($2::int IS NULL OR scope = $2)
              AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%')
            ORDER BY id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filters.company_id)
        .bind(filters.scope)
        .bind(filters.name.as_deref())
        .bind(filters.limit.unwrap_or(20).clamp(1, 100))
        .bind(filters.offset.unwrap_or(0).max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(fares)
    }

    pub async fn insert(
        &self,
        company_id: Option<i32>,
        name: &str,
        attributes: &serde_json::Value,
        function: &str,
        scope: FareScope,
    ) -> AppResult<Fare> {
        let fare = sqlx::query_as::<_, Fare>(
            r#"
            INSERT INTO fare (company_id, version, name, attributes, function, scope, created_on)
            VALUES ($1, 1, $2, $3, $4, $5, now())
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(name)
        .bind(attributes)
        .bind(function)
        .bind(scope)
        .fetch_one(&self.pool)
        .await?;
        Ok(fare)
    }

    /// Persistir una tarifa modificada; el controller ya incrementó `version`
    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        fare: &Fare,
    ) -> AppResult<Fare> {
        let updated = sqlx::query_as::<_, Fare>(
            r#"
            UPDATE fare
            SET name = $2, attributes = $3, function = $4, version = $5, updated_on = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(fare.id)
        .bind(&fare.name)
        .bind(&fare.attributes)
        .bind(&fare.function)
        .bind(fare.version)
        .fetch_one(&mut **tx)
        .await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM fare WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
