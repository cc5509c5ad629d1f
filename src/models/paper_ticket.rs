//! Modelo de PaperTicket
//!
//! Ticket emitido por un operador con un duty activo. `distance` y el
//! importe total se derivan en el servidor; el registro es inmutable una
//! vez creado (no hay update ni delete).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Tipo de ticket solicitado con su cantidad.
/// El formato binario limita la cantidad a 255 por tipo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTypeCount {
    pub name: String,
    pub count: u32,
}

/// PaperTicket principal - mapea a la tabla `paper_ticket`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaperTicket {
    pub id: i32,
    pub company_id: i32,
    pub service_id: i32,
    pub duty_id: i32,
    pub sequence_id: i32,
    pub ticket_types: Value,
    pub pickup_point: i32,
    pub dropping_point: i32,
    pub distance: i32,
    pub amount: f64,
    pub extra: Value,
    pub updated_on: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
}

/// Request para crear un paper ticket.
/// `distance` se deriva del snapshot de ruta; `amount` se contrasta contra
/// el total calculado por el motor de tarifas.
#[derive(Debug, Deserialize)]
pub struct CreatePaperTicketRequest {
    pub company_id: i32,
    pub service_id: i32,
    pub duty_id: i32,
    pub sequence_id: i32,
    pub ticket_types: Vec<TicketTypeCount>,
    pub pickup_point: i32,
    pub dropping_point: i32,
    pub extra: Value,
    pub amount: f64,
}

/// Response de creación: el registro más el token firmado que consume el
/// dispositivo validador externo.
#[derive(Debug, Serialize)]
pub struct CreatedPaperTicket {
    pub ticket: PaperTicket,
    pub digital_ticket: String,
}

/// Filtros para búsqueda de paper tickets
#[derive(Debug, Deserialize)]
pub struct PaperTicketFilters {
    pub company_id: Option<i32>,
    pub service_id: Option<i32>,
    pub duty_id: Option<i32>,
    pub pickup_point: Option<i32>,
    pub dropping_point: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
