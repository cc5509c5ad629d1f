//! Modelo de Route y su snapshot congelado
//!
//! La topología viva (`route` + `landmark_in_route`) es editable; los
//! servicios no la leen nunca directamente. En la creación del servicio se
//! congela un `RouteSnapshot` JSON que desacopla el pricing histórico de
//! ediciones posteriores a la ruta.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Route principal - mapea a la tabla `route`
#[derive(Debug, Clone, FromRow)]
pub struct Route {
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub updated_on: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
}

/// Posición de un landmark dentro de una ruta - tabla `landmark_in_route`
///
/// `distance_from_start` en metros; los deltas en minutos desde el inicio
/// del servicio.
#[derive(Debug, Clone, FromRow)]
pub struct LandmarkInRoute {
    pub id: i32,
    pub company_id: i32,
    pub route_id: i32,
    pub landmark_id: i32,
    pub distance_from_start: i32,
    pub arrival_delta: i32,
    pub departure_delta: i32,
}

/// Landmark congelado dentro del snapshot de un servicio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkSnapshot {
    pub landmark_id: i32,
    pub distance_from_start: i32,
    pub arrival_delta: i32,
    pub departure_delta: i32,
}

/// Snapshot inmutable de la ruta, almacenado como JSONB en `service.route`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub id: i32,
    pub name: String,
    pub landmarks: Vec<LandmarkSnapshot>,
}

impl RouteSnapshot {
    /// Congelar la topología leída bajo el lock de ruta
    pub fn freeze(route: &Route, landmarks: &[LandmarkInRoute]) -> Self {
        Self {
            id: route.id,
            name: route.name.clone(),
            landmarks: landmarks
                .iter()
                .map(|l| LandmarkSnapshot {
                    landmark_id: l.landmark_id,
                    distance_from_start: l.distance_from_start,
                    arrival_delta: l.arrival_delta,
                    departure_delta: l.departure_delta,
                })
                .collect(),
        }
    }

    pub fn find_landmark(&self, landmark_id: i32) -> Option<&LandmarkSnapshot> {
        self.landmarks.iter().find(|l| l.landmark_id == landmark_id)
    }

    /// Minutos desde `starting_at` hasta la llegada al último landmark
    pub fn total_duration_minutes(&self) -> i64 {
        self.landmarks
            .last()
            .map(|l| l.arrival_delta as i64)
            .unwrap_or(0)
    }
}
