//! Controller de Service
//!
//! La creación congela ruta y tarifa bajo el lock distribuido de la ruta y
//! acuña el par de claves del servicio. El lock se libera exactamente una
//! vez en cualquier camino de salida; el guard cubre los caminos de error.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{info, warn};
use validator::Validate;

use crate::cache::route_lock::{route_lock_key, DistributedMutex};
use crate::models::fare::{Fare, FareScope};
use crate::models::route::RouteSnapshot;
use crate::models::service::{
    CreateServiceRequest, ServiceFilters, ServiceResponse, ServiceStatus, UpdateServiceRequest,
};
use crate::repositories::duty_repository::DutyRepository;
use crate::repositories::fare_repository::FareRepository;
use crate::repositories::route_repository::RouteRepository;
use crate::repositories::service_repository::{NewService, ServiceRepository};
use crate::services::digital_ticket::TicketSigner;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::transitions::{ensure_transition, SERVICE_STATUS_TRANSITIONS};
use crate::utils::validation::validate_landmark_sequence;

pub struct ServiceController {
    pool: PgPool,
    services: ServiceRepository,
    routes: RouteRepository,
    fares: FareRepository,
    duties: DutyRepository,
    route_lock: DistributedMutex,
}

impl ServiceController {
    pub fn new(pool: PgPool, route_lock: DistributedMutex) -> Self {
        Self {
            services: ServiceRepository::new(pool.clone()),
            routes: RouteRepository::new(pool.clone()),
            fares: FareRepository::new(pool.clone()),
            duties: DutyRepository::new(pool.clone()),
            pool,
            route_lock,
        }
    }

    pub async fn create(&self, request: CreateServiceRequest) -> AppResult<ServiceResponse> {
        request.validate()?;

        let fare = self
            .fares
            .find_by_id(request.fare_id)
            .await?
            .ok_or(AppError::UnknownValue("fare_id"))?;
        if fare.scope == FareScope::Local && fare.company_id != Some(request.company_id) {
            return Err(AppError::UnknownValue("fare_id"));
        }
        // los atributos del snapshot deben ser parseables antes de congelarlos
        fare.parse_attributes()?;

        // La lectura de topología no puede correr contra ediciones
        // concurrentes de la ruta: lock exclusivo por route_id.
        let guard = self
            .route_lock
            .acquire(route_lock_key(request.route_id))
            .await?;

        let outcome = self.create_under_lock(&request, &fare).await;

        if let Err(e) = guard.release().await {
            // el lock expira solo por TTL; no es fatal para la operación
            warn!("⚠️ Error liberando lock de ruta {}: {}", request.route_id, e);
        }
        outcome
    }

    async fn create_under_lock(
        &self,
        request: &CreateServiceRequest,
        fare: &Fare,
    ) -> AppResult<ServiceResponse> {
        let route = self
            .routes
            .find_for_company(request.route_id, request.company_id)
            .await?
            .ok_or(AppError::UnknownValue("route_id"))?;

        let landmarks = self.routes.landmarks_ordered(request.route_id).await?;
        validate_landmark_sequence(&landmarks)?;

        let snapshot = RouteSnapshot::freeze(&route, &landmarks);
        let ending_at =
            request.starting_at + Duration::minutes(snapshot.total_duration_minutes());

        // Par de claves del servicio: se genera aquí y no rota jamás
        let signer = TicketSigner::generate();

        let new_service = NewService {
            company_id: request.company_id,
            name: route.name.clone(),
            route: serde_json::to_value(&snapshot)
                .map_err(|e| AppError::Internal(format!("cannot freeze route: {}", e)))?,
            fare: serde_json::to_value(fare)
                .map_err(|e| AppError::Internal(format!("cannot freeze fare: {}", e)))?,
            bus_id: request.bus_id,
            starting_at: request.starting_at,
            ending_at,
            private_key: signer.private_key_pem()?,
            public_key: signer.public_key_pem()?,
        };

        let mut tx = self.pool.begin().await?;
        let service = self.services.insert(&mut tx, new_service).await?;
        tx.commit().await?;

        info!(
            "🚌 Servicio creado: id={} route={} bus={}",
            service.id, request.route_id, service.bus_id
        );
        Ok(service.into())
    }

    pub async fn update(&self, request: UpdateServiceRequest) -> AppResult<ServiceResponse> {
        request.validate()?;

        let mut service = self
            .services
            .find_by_id(request.id)
            .await?
            .ok_or(AppError::InvalidIdentifier)?;

        let mut changed = false;
        let mut tx = self.pool.begin().await?;

        if let Some(new_status) = request.status {
            if new_status != service.status {
                ensure_transition(
                    &SERVICE_STATUS_TRANSITIONS,
                    service.status,
                    new_status,
                    "status",
                )?;
                match new_status {
                    ServiceStatus::Ended => {
                        // no se puede cerrar el servicio con un duty en curso
                        if self.duties.any_started_for_service(service.id).await? {
                            return Err(AppError::InvalidStateTransition("status"));
                        }
                        service.finished_on = Some(Utc::now());
                    }
                    ServiceStatus::Terminated => {
                        let moved = self
                            .duties
                            .cascade_assigned_to_not_used(&mut tx, service.id)
                            .await?;
                        if moved > 0 {
                            info!("🪦 {} duties pasaron a NOT_USED", moved);
                        }
                        service.finished_on = Some(Utc::now());
                    }
                    _ => {}
                }
                service.status = new_status;
                changed = true;
            }
        }

        if let Some(remark) = request.remark {
            if service.remark.as_deref() != Some(remark.as_str()) {
                service.remark = Some(remark);
                changed = true;
            }
        }

        if !changed {
            return Ok(service.into());
        }

        let updated = self.services.update(&mut tx, &service).await?;
        tx.commit().await?;

        info!("🚌 Servicio actualizado: id={}", updated.id);
        Ok(updated.into())
    }

    pub async fn search(&self, filters: ServiceFilters) -> AppResult<Vec<ServiceResponse>> {
        let services = self.services.search(&filters).await?;
        Ok(services.into_iter().map(Into::into).collect())
    }

    /// Clave pública del servicio para el dispositivo validador externo
    pub async fn public_key(&self, service_id: i32) -> AppResult<String> {
        self.services
            .public_key(service_id)
            .await?
            .ok_or(AppError::UnknownValue("service_id"))
    }
}
