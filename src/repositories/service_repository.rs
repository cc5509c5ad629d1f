//! Repositorio de Service

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::service::{Service, ServiceFilters, ServiceStatus};
use crate::utils::errors::AppResult;

/// Campos de un servicio nuevo; `route` y `fare` son los snapshots ya
/// congelados y las claves van en PEM.
pub struct NewService {
    pub company_id: i32,
    pub name: String,
    pub route: serde_json::Value,
    pub fare: serde_json::Value,
    pub bus_id: i32,
    pub starting_at: DateTime<Utc>,
    pub ending_at: DateTime<Utc>,
    pub private_key: String,
    pub public_key: String,
}

pub struct ServiceRepository {
    pool: PgPool,
}

impl ServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM service WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(service)
    }

    pub async fn search(&self, filters: &ServiceFilters) -> AppResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT * FROM service
            WHERE ($1::int IS NULL OR company_id = $1)
              AND ($2::int IS NULL OR status = $2)
              AND ($3::int IS NULL OR bus_id = $3)
            ORDER BY id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filters.company_id)
        .bind(filters.status)
        .bind(filters.bus_id)
        .bind(filters.limit.unwrap_or(20).clamp(1, 100))
        .bind(filters.offset.unwrap_or(0).max(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new_service: NewService,
    ) -> AppResult<Service> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO service
                (company_id, name, route, fare, bus_id, status, starting_at, ending_at,
                 private_key, public_key, created_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            RETURNING *
            "#,
        )
        .bind(new_service.company_id)
        .bind(&new_service.name)
        .bind(&new_service.route)
        .bind(&new_service.fare)
        .bind(new_service.bus_id)
        .bind(ServiceStatus::Created)
        .bind(new_service.starting_at)
        .bind(new_service.ending_at)
        .bind(&new_service.private_key)
        .bind(&new_service.public_key)
        .fetch_one(&mut **tx)
        .await?;
        Ok(service)
    }

    /// Persistir estado y marcas de tiempo de un servicio ya mutado en memoria
    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        service: &Service,
    ) -> AppResult<Service> {
        let updated = sqlx::query_as::<_, Service>(
            r#"
            UPDATE service
            SET status = $2, remark = $3, started_on = $4, finished_on = $5, updated_on = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(service.id)
        .bind(service.status)
        .bind(&service.remark)
        .bind(service.started_on)
        .bind(service.finished_on)
        .fetch_one(&mut **tx)
        .await?;
        Ok(updated)
    }

    /// Clave pública de un servicio, para el dispositivo validador externo
    pub async fn public_key(&self, service_id: i32) -> AppResult<Option<String>> {
        let key: Option<(String,)> =
            sqlx::query_as("SELECT public_key FROM service WHERE id = $1")
                .bind(service_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(key.map(|(public_key,)| public_key))
    }
}
