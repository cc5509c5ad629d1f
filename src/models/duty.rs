//! Modelo de Duty
//!
//! Asignación de un operador a un servicio. El arranque de un duty es lo
//! que pone en marcha el servicio: al entrar en STARTED se fija
//! `started_on` y, si el servicio aún no arrancó, también el suyo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Estado del duty - mapea al entero `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum DutyStatus {
    Assigned = 1,
    Started = 2,
    Terminated = 3,
    Ended = 4,
    NotUsed = 5,
}

impl From<DutyStatus> for i32 {
    fn from(status: DutyStatus) -> Self {
        status as i32
    }
}

impl TryFrom<i32> for DutyStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DutyStatus::Assigned),
            2 => Ok(DutyStatus::Started),
            3 => Ok(DutyStatus::Terminated),
            4 => Ok(DutyStatus::Ended),
            5 => Ok(DutyStatus::NotUsed),
            other => Err(format!("invalid duty status: {}", other)),
        }
    }
}

/// Duty principal - mapea a la tabla `duty`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Duty {
    pub id: i32,
    pub company_id: i32,
    pub operator_id: i32,
    pub service_id: i32,
    pub status: DutyStatus,
    pub started_on: Option<DateTime<Utc>>,
    pub finished_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
}

/// Request para crear un duty
#[derive(Debug, Deserialize)]
pub struct CreateDutyRequest {
    pub company_id: i32,
    pub service_id: i32,
    pub operator_id: i32,
}

/// Request para actualizar el estado de un duty
#[derive(Debug, Deserialize)]
pub struct UpdateDutyRequest {
    pub id: i32,
    pub status: Option<DutyStatus>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteDutyRequest {
    pub id: i32,
}

/// Filtros para búsqueda de duties
#[derive(Debug, Deserialize)]
pub struct DutyFilters {
    pub company_id: Option<i32>,
    pub service_id: Option<i32>,
    pub operator_id: Option<i32>,
    pub status: Option<DutyStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
