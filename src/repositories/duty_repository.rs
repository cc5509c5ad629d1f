//! Repositorio de Duty

use sqlx::{PgPool, Postgres, Transaction};

use crate::models::duty::{Duty, DutyFilters, DutyStatus};
use crate::utils::errors::AppResult;

pub struct DutyRepository {
    pool: PgPool,
}

impl DutyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Duty>> {
        let duty = sqlx::query_as::<_, Duty>("SELECT * FROM duty WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(duty)
    }

    pub async fn search(&self, filters: &DutyFilters) -> AppResult<Vec<Duty>> {
        let duties = sqlx::query_as::<_, Duty>(
            r#"
            SELECT * FROM duty
            WHERE ($1::int IS NULL OR company_id = $1)
              AND ($2::int IS NULL OR service_id = $2)
              AND ($3::int IS NULL OR operator_id = $3)
              AND ($4::int IS NULL OR status = $4)
            ORDER BY id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filters.company_id)
        .bind(filters.service_id)
        .bind(filters.operator_id)
        .bind(filters.status)
        .bind(filters.limit.unwrap_or(20).clamp(1, 100))
        .bind(filters.offset.unwrap_or(0).max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(duties)
    }

    pub async fn insert(
        &self,
        company_id: i32,
        operator_id: i32,
        service_id: i32,
    ) -> AppResult<Duty> {
        let duty = sqlx::query_as::<_, Duty>(
            r#"
            INSERT INTO duty (company_id, operator_id, service_id, status, created_on)
            VALUES ($1, $2, $3, $4, now())
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(operator_id)
        .bind(service_id)
        .bind(DutyStatus::Assigned)
        .fetch_one(&self.pool)
        .await?;
        Ok(duty)
    }

    /// Persistir estado y marcas de tiempo de un duty ya mutado en memoria
    pub async fn update(&self, tx: &mut Transaction<'_, Postgres>, duty: &Duty) -> AppResult<Duty> {
        let updated = sqlx::query_as::<_, Duty>(
            r#"
            UPDATE duty
            SET status = $2, started_on = $3, finished_on = $4, updated_on = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(duty.id)
        .bind(duty.status)
        .bind(duty.started_on)
        .bind(duty.finished_on)
        .fetch_one(&mut **tx)
        .await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM duty WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_for_service(&self, service_id: i32) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM duty WHERE service_id = $1")
            .bind(service_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// ¿El operador ya tiene un duty vivo (ASSIGNED o STARTED) en el servicio?
    pub async fn has_live_duty(&self, service_id: i32, operator_id: i32) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM duty
                WHERE service_id = $1 AND operator_id = $2 AND status IN ($3, $4)
            )
            "#,
        )
        .bind(service_id)
        .bind(operator_id)
        .bind(DutyStatus::Assigned)
        .bind(DutyStatus::Started)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// ¿Hay algún duty STARTED en el servicio?
    pub async fn any_started_for_service(&self, service_id: i32) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM duty WHERE service_id = $1 AND status = $2)",
        )
        .bind(service_id)
        .bind(DutyStatus::Started)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Cascada al terminar un servicio: los duties aún ASSIGNED pasan a NOT_USED
    pub async fn cascade_assigned_to_not_used(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        service_id: i32,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE duty
            SET status = $2, updated_on = now()
            WHERE service_id = $1 AND status = $3
            "#,
        )
        .bind(service_id)
        .bind(DutyStatus::NotUsed)
        .bind(DutyStatus::Assigned)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// ¿Hay tickets emitidos contra este duty?
    pub async fn has_tickets(&self, duty_id: i32) -> AppResult<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM paper_ticket WHERE duty_id = $1)")
                .bind(duty_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
