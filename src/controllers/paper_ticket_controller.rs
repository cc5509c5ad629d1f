//! Controller de PaperTicket
//!
//! Emisión de tickets contra un duty activo. La distancia sale del
//! snapshot congelado de la ruta, el importe del sandbox de tarifas, y el
//! resultado se firma con la clave del servicio. Todo dentro de una
//! transacción: un fallo del sandbox o del contraste de importes no deja
//! filas a medias.

use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use crate::models::duty::DutyStatus;
use crate::models::fare::FareAttributes;
use crate::models::paper_ticket::{
    CreatePaperTicketRequest, CreatedPaperTicket, PaperTicketFilters, PaperTicket,
};
use crate::models::route::RouteSnapshot;
use crate::models::service::ServiceStatus;
use crate::repositories::duty_repository::DutyRepository;
use crate::repositories::paper_ticket_repository::{NewPaperTicket, PaperTicketRepository};
use crate::repositories::service_repository::ServiceRepository;
use crate::services::digital_ticket::TicketSigner;
use crate::services::fare_script::FareScriptEngine;
use crate::services::pricing;
use crate::utils::errors::{AppError, AppResult};

/// Proyección del snapshot de tarifa del servicio: solo lo que el pricing
/// necesita; el resto de campos congelados se ignora.
#[derive(Debug, Deserialize)]
struct FareSnapshot {
    attributes: FareAttributes,
    function: String,
}

pub struct PaperTicketController {
    pool: PgPool,
    tickets: PaperTicketRepository,
    services: ServiceRepository,
    duties: DutyRepository,
    engine: FareScriptEngine,
}

impl PaperTicketController {
    pub fn new(pool: PgPool, engine: FareScriptEngine) -> Self {
        Self {
            tickets: PaperTicketRepository::new(pool.clone()),
            services: ServiceRepository::new(pool.clone()),
            duties: DutyRepository::new(pool.clone()),
            pool,
            engine,
        }
    }

    pub async fn create(&self, request: CreatePaperTicketRequest) -> AppResult<CreatedPaperTicket> {
        // El emisor debe tener un duty en curso sobre ese mismo servicio
        let duty = self
            .duties
            .find_by_id(request.duty_id)
            .await?
            .ok_or(AppError::UnknownValue("duty_id"))?;
        if duty.status != DutyStatus::Started {
            return Err(AppError::InactiveResource("Duty"));
        }
        if duty.service_id != request.service_id {
            return Err(AppError::InvalidAssociation("duty_id", "service_id"));
        }

        let service = self
            .services
            .find_by_id(request.service_id)
            .await?
            .ok_or(AppError::UnknownValue("service_id"))?;
        if service.company_id != request.company_id {
            return Err(AppError::UnknownValue("service_id"));
        }
        if service.status != ServiceStatus::Started {
            return Err(AppError::InactiveResource("Service"));
        }

        let route_snapshot: RouteSnapshot = serde_json::from_value(service.route.clone())
            .map_err(|e| AppError::Internal(format!("corrupt route snapshot: {}", e)))?;
        let fare_snapshot: FareSnapshot = serde_json::from_value(service.fare.clone())
            .map_err(|e| AppError::Internal(format!("corrupt fare snapshot: {}", e)))?;

        let distance = pricing::resolve_distance(
            &route_snapshot,
            request.pickup_point,
            request.dropping_point,
        )?;

        // Precio por tipo en el sandbox, fuera del executor async
        let engine = self.engine.clone();
        let attributes = fare_snapshot.attributes.clone();
        let function = fare_snapshot.function.clone();
        let requested = request.ticket_types.clone();
        let total = tokio::task::spawn_blocking(move || {
            pricing::compute_total(&engine, &attributes, &function, &requested, distance)
        })
        .await
        .map_err(|e| AppError::Internal(format!("sandbox task failed: {}", e)))??;

        pricing::cross_check_amount(total, request.amount)?;

        let encoded_types =
            pricing::encode_ticket_types(&fare_snapshot.attributes, &request.ticket_types)?;
        let pickup = u32::try_from(request.pickup_point)
            .map_err(|_| AppError::InvalidValue("pickup_point"))?;
        let dropping = u32::try_from(request.dropping_point)
            .map_err(|_| AppError::InvalidValue("dropping_point"))?;
        let signer = TicketSigner::from_private_pem(&service.private_key)?;

        let mut tx = self.pool.begin().await?;
        let ticket = self
            .tickets
            .insert(
                &mut tx,
                NewPaperTicket {
                    company_id: request.company_id,
                    service_id: request.service_id,
                    duty_id: request.duty_id,
                    sequence_id: request.sequence_id,
                    ticket_types: serde_json::to_value(&request.ticket_types).map_err(|e| {
                        AppError::Internal(format!("cannot serialize ticket types: {}", e))
                    })?,
                    pickup_point: request.pickup_point,
                    dropping_point: request.dropping_point,
                    distance,
                    amount: total,
                    extra: request.extra,
                },
            )
            .await?;

        let ticket_id = u32::try_from(ticket.id)
            .map_err(|_| AppError::Internal("ticket id out of wire range".to_string()))?;
        let digital = signer.create_ticket(ticket_id, pickup, dropping, &encoded_types);
        let digital_ticket = digital.to_token();
        tx.commit().await?;

        info!(
            "🎫 Ticket emitido: id={} service={} distance={}m amount={}",
            ticket.id, ticket.service_id, ticket.distance, ticket.amount
        );
        Ok(CreatedPaperTicket {
            ticket,
            digital_ticket,
        })
    }

    pub async fn search(&self, filters: PaperTicketFilters) -> AppResult<Vec<PaperTicket>> {
        self.tickets.search(&filters).await
    }
}
