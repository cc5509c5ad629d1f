//! Controller de Fare
//!
//! Toda alta o modificación pasa por el validador de definiciones antes de
//! tocar la base: el script y los atributos viajan siempre juntos y la
//! versión se incrementa solo cuando hay cambios efectivos.

use sqlx::PgPool;
use tracing::info;
use validator::Validate;

use crate::models::fare::{
    CreateFareRequest, Fare, FareAttributes, FareFilters, FareScope, UpdateFareRequest,
};
use crate::repositories::fare_repository::FareRepository;
use crate::services::fare_script::FareScriptEngine;
use crate::services::fare_validation::validate_fare_definition;
use crate::utils::errors::{AppError, AppResult};

pub struct FareController {
    pool: PgPool,
    repository: FareRepository,
    engine: FareScriptEngine,
}

impl FareController {
    pub fn new(pool: PgPool, engine: FareScriptEngine) -> Self {
        Self {
            repository: FareRepository::new(pool.clone()),
            pool,
            engine,
        }
    }

    pub async fn create(&self, request: CreateFareRequest) -> AppResult<Fare> {
        request.validate()?;

        // Coherencia alcance/compañía
        let scope = request.scope.unwrap_or(FareScope::Global);
        match scope {
            FareScope::Global if request.company_id.is_some() => {
                return Err(AppError::UnexpectedParameter("company_id"));
            }
            FareScope::Local if request.company_id.is_none() => {
                return Err(AppError::MissingParameter("company_id"));
            }
            _ => {}
        }

        check_ticket_type_table(&request.attributes)?;
        self.run_validator(request.function.clone(), request.attributes.clone())
            .await?;

        let attributes = serde_json::to_value(&request.attributes)
            .map_err(|e| AppError::Internal(format!("cannot serialize attributes: {}", e)))?;
        let fare = self
            .repository
            .insert(
                request.company_id,
                &request.name,
                &attributes,
                &request.function,
                scope,
            )
            .await?;

        info!("💰 Tarifa creada: id={} name={}", fare.id, fare.name);
        Ok(fare)
    }

    pub async fn update(&self, request: UpdateFareRequest) -> AppResult<Fare> {
        request.validate()?;

        let mut fare = self
            .repository
            .find_by_id(request.id)
            .await?
            .ok_or(AppError::InvalidIdentifier)?;

        let mut changed = false;
        if let Some(name) = request.name {
            if name != fare.name {
                fare.name = name;
                changed = true;
            }
        }
        if let Some(function) = request.function {
            if function != fare.function {
                fare.function = function;
                changed = true;
            }
        }
        if let Some(attributes) = request.attributes {
            let value = serde_json::to_value(&attributes)
                .map_err(|e| AppError::Internal(format!("cannot serialize attributes: {}", e)))?;
            if value != fare.attributes {
                fare.attributes = value;
                changed = true;
            }
        }

        if !changed {
            return Ok(fare);
        }

        // Revalidar la definición combinada antes de confiar en ella
        let attributes = fare.parse_attributes()?;
        check_ticket_type_table(&attributes)?;
        self.run_validator(fare.function.clone(), attributes).await?;

        fare.version += 1;
        let mut tx = self.pool.begin().await?;
        let updated = self.repository.update(&mut tx, &fare).await?;
        tx.commit().await?;

        info!(
            "💰 Tarifa actualizada: id={} version={}",
            updated.id, updated.version
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        if self.repository.delete(id).await? {
            info!("🗑️ Tarifa eliminada: id={}", id);
        }
        Ok(())
    }

    pub async fn search(&self, filters: FareFilters) -> AppResult<Vec<Fare>> {
        self.repository.search(&filters).await
    }

    /// Correr el validador de definiciones fuera del executor async
    async fn run_validator(&self, function: String, attributes: FareAttributes) -> AppResult<()> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || {
            validate_fare_definition(&engine, &function, &attributes)
        })
        .await
        .map_err(|e| AppError::Internal(format!("sandbox task failed: {}", e)))?
    }
}

/// Los ids y nombres de tipo deben ser únicos: el cuerpo binario del ticket
/// y `expand` indexan por id, y el resolver por nombre.
fn check_ticket_type_table(attributes: &FareAttributes) -> AppResult<()> {
    let types = &attributes.ticket_types;
    if types.is_empty() {
        return Err(AppError::InvalidValue("attributes"));
    }
    for (i, t) in types.iter().enumerate() {
        if types[..i].iter().any(|p| p.id == t.id || p.name == t.name) {
            return Err(AppError::InvalidValue("attributes"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fare::TicketTypeAttr;
    use serde_json::json;

    fn attrs(types: Vec<TicketTypeAttr>) -> FareAttributes {
        FareAttributes {
            df_version: 1,
            ticket_types: types,
            currency_type: "INR".to_string(),
            distance_unit: "m".to_string(),
            extra: json!({}),
        }
    }

    #[test]
    fn duplicate_type_ids_are_rejected() {
        let attributes = attrs(vec![
            TicketTypeAttr { id: 1, name: "Adult".to_string() },
            TicketTypeAttr { id: 1, name: "Child".to_string() },
        ]);
        assert!(check_ticket_type_table(&attributes).is_err());
    }

    #[test]
    fn duplicate_type_names_are_rejected() {
        let attributes = attrs(vec![
            TicketTypeAttr { id: 1, name: "Adult".to_string() },
            TicketTypeAttr { id: 2, name: "Adult".to_string() },
        ]);
        assert!(check_ticket_type_table(&attributes).is_err());
    }

    #[test]
    fn empty_type_table_is_rejected() {
        assert!(check_ticket_type_table(&attrs(vec![])).is_err());
    }

    #[test]
    fn distinct_types_pass() {
        let attributes = attrs(vec![
            TicketTypeAttr { id: 1, name: "Adult".to_string() },
            TicketTypeAttr { id: 2, name: "Child".to_string() },
        ]);
        assert!(check_ticket_type_table(&attributes).is_ok());
    }
}
