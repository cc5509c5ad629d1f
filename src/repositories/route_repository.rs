//! Repositorio de Route
//!
//! Solo lecturas: la topología viva se edita fuera de este core. La lectura
//! ordenada de landmarks ocurre siempre bajo el lock de ruta.

use sqlx::PgPool;

use crate::models::route::{LandmarkInRoute, Route};
use crate::utils::errors::AppResult;

pub struct RouteRepository {
    pool: PgPool,
}

impl RouteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_for_company(
        &self,
        route_id: i32,
        company_id: i32,
    ) -> AppResult<Option<Route>> {
        let route = sqlx::query_as::<_, Route>(
            "SELECT * FROM route WHERE id = $1 AND company_id = $2",
        )
        .bind(route_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(route)
    }

    /// Landmarks de la ruta ordenados por distancia desde el origen
    pub async fn landmarks_ordered(&self, route_id: i32) -> AppResult<Vec<LandmarkInRoute>> {
        let landmarks = sqlx::query_as::<_, LandmarkInRoute>(
            r#"
            SELECT * FROM landmark_in_route
            WHERE route_id = $1
            ORDER BY distance_from_start ASC
            "#,
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(landmarks)
    }
}
