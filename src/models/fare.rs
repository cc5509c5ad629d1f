//! Modelo de Fare
//!
//! Una tarifa es la combinación de un script de pricing (`function`) y sus
//! atributos declarados (`attributes`). Ambos viajan siempre juntos: el
//! script se valida contra los atributos en cada mutación y la versión se
//! incrementa con cada cambio efectivo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use validator::Validate;

use crate::utils::errors::{AppError, AppResult};

/// Alcance de la tarifa - mapea al entero `scope`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum FareScope {
    Global = 1,
    Local = 2,
}

impl From<FareScope> for i32 {
    fn from(scope: FareScope) -> Self {
        scope as i32
    }
}

impl TryFrom<i32> for FareScope {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FareScope::Global),
            2 => Ok(FareScope::Local),
            other => Err(format!("invalid fare scope: {}", other)),
        }
    }
}

/// Tipo de ticket declarado en los atributos de la tarifa.
/// El `id` está limitado a u8 por el formato binario del ticket digital.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTypeAttr {
    pub id: u8,
    pub name: String,
}

/// Atributos estructurados de la tarifa (JSONB en la base)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareAttributes {
    pub df_version: i32,
    pub ticket_types: Vec<TicketTypeAttr>,
    pub currency_type: String,
    pub distance_unit: String,
    pub extra: Value,
}

/// Fare principal - mapea a la tabla `fare`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Fare {
    pub id: i32,
    pub company_id: Option<i32>,
    pub version: i32,
    pub name: String,
    pub attributes: Value,
    pub function: String,
    pub scope: FareScope,
    pub updated_on: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
}

impl Fare {
    /// Parsear los atributos JSONB a su forma tipada
    pub fn parse_attributes(&self) -> AppResult<FareAttributes> {
        serde_json::from_value(self.attributes.clone())
            .map_err(|_| AppError::InvalidValue("attributes"))
    }
}

/// Request para crear una tarifa
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFareRequest {
    pub company_id: Option<i32>,

    #[validate(length(min = 1, max = 32))]
    pub name: String,

    pub attributes: FareAttributes,

    #[validate(length(min = 1, max = 32768))]
    pub function: String,

    pub scope: Option<FareScope>,
}

/// Request para actualizar una tarifa existente (parcial)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFareRequest {
    pub id: i32,

    #[validate(length(min = 1, max = 32))]
    pub name: Option<String>,

    pub attributes: Option<FareAttributes>,

    #[validate(length(min = 1, max = 32768))]
    pub function: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteFareRequest {
    pub id: i32,
}

/// Filtros para búsqueda de tarifas
#[derive(Debug, Deserialize)]
pub struct FareFilters {
    pub company_id: Option<i32>,
    pub scope: Option<FareScope>,
    pub name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
