//! Modelo de Service
//!
//! Un servicio es una instancia concreta de viaje: bus + snapshot congelado
//! de ruta y tarifa + par de claves ECDSA propio. Las claves se generan una
//! única vez en la creación y nunca rotan; la privada jamás sale por la API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use validator::Validate;

/// Estado del servicio - mapea al entero `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum ServiceStatus {
    Created = 1,
    Started = 2,
    Terminated = 3,
    Ended = 4,
    Audited = 5,
}

impl From<ServiceStatus> for i32 {
    fn from(status: ServiceStatus) -> Self {
        status as i32
    }
}

impl TryFrom<i32> for ServiceStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ServiceStatus::Created),
            2 => Ok(ServiceStatus::Started),
            3 => Ok(ServiceStatus::Terminated),
            4 => Ok(ServiceStatus::Ended),
            5 => Ok(ServiceStatus::Audited),
            other => Err(format!("invalid service status: {}", other)),
        }
    }
}

/// Service principal - mapea a la tabla `service`
#[derive(Debug, Clone, FromRow)]
pub struct Service {
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub route: Value,
    pub fare: Value,
    pub bus_id: i32,
    pub status: ServiceStatus,
    pub starting_at: DateTime<Utc>,
    pub ending_at: DateTime<Utc>,
    pub private_key: String,
    pub public_key: String,
    pub remark: Option<String>,
    pub started_on: Option<DateTime<Utc>>,
    pub finished_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
}

/// Response de servicio para la API - nunca incluye la clave privada
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub route: Value,
    pub fare: Value,
    pub bus_id: i32,
    pub status: ServiceStatus,
    pub starting_at: DateTime<Utc>,
    pub ending_at: DateTime<Utc>,
    pub public_key: String,
    pub remark: Option<String>,
    pub started_on: Option<DateTime<Utc>>,
    pub finished_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
}

impl From<Service> for ServiceResponse {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            company_id: service.company_id,
            name: service.name,
            route: service.route,
            fare: service.fare,
            bus_id: service.bus_id,
            status: service.status,
            starting_at: service.starting_at,
            ending_at: service.ending_at,
            public_key: service.public_key,
            remark: service.remark,
            started_on: service.started_on,
            finished_on: service.finished_on,
            updated_on: service.updated_on,
            created_on: service.created_on,
        }
    }
}

/// Request para crear un servicio.
/// `name`, `route`, `fare` y `ending_at` se derivan en el servidor.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    pub company_id: i32,
    pub route_id: i32,
    pub fare_id: i32,
    pub bus_id: i32,
    pub starting_at: DateTime<Utc>,
}

/// Request para actualizar un servicio existente
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    pub id: i32,
    pub status: Option<ServiceStatus>,

    #[validate(length(max = 1024))]
    pub remark: Option<String>,
}

/// Filtros para búsqueda de servicios
#[derive(Debug, Deserialize)]
pub struct ServiceFilters {
    pub company_id: Option<i32>,
    pub status: Option<ServiceStatus>,
    pub bus_id: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
