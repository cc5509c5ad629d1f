//! Controller de Duty
//!
//! El arranque de un duty es el único camino que pone un servicio en
//! STARTED. Las reglas de borrado protegen el rastro de tickets emitidos.

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;

use crate::config::constants::MAX_DUTY_PER_SERVICE;
use crate::models::duty::{CreateDutyRequest, Duty, DutyFilters, DutyStatus, UpdateDutyRequest};
use crate::models::service::ServiceStatus;
use crate::repositories::duty_repository::DutyRepository;
use crate::repositories::service_repository::ServiceRepository;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::transitions::{
    ensure_transition, DUTY_STATUS_TRANSITIONS, SERVICE_STATUS_TRANSITIONS,
};

pub struct DutyController {
    pool: PgPool,
    duties: DutyRepository,
    services: ServiceRepository,
}

impl DutyController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            duties: DutyRepository::new(pool.clone()),
            services: ServiceRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn create(&self, request: CreateDutyRequest) -> AppResult<Duty> {
        let service = self
            .services
            .find_by_id(request.service_id)
            .await?
            .ok_or(AppError::UnknownValue("service_id"))?;
        if service.company_id != request.company_id {
            return Err(AppError::UnknownValue("service_id"));
        }
        if !matches!(
            service.status,
            ServiceStatus::Created | ServiceStatus::Started
        ) {
            return Err(AppError::InactiveResource("Service"));
        }

        if self.duties.count_for_service(service.id).await? >= MAX_DUTY_PER_SERVICE {
            return Err(AppError::ExceededMaxLimit("Duty"));
        }
        if self
            .duties
            .has_live_duty(service.id, request.operator_id)
            .await?
        {
            return Err(AppError::DuplicateDuty("operator_id", "service_id"));
        }

        let duty = self
            .duties
            .insert(request.company_id, request.operator_id, request.service_id)
            .await?;

        info!(
            "👷 Duty creado: id={} operator={} service={}",
            duty.id, duty.operator_id, duty.service_id
        );
        Ok(duty)
    }

    pub async fn update(&self, request: UpdateDutyRequest) -> AppResult<Duty> {
        let mut duty = self
            .duties
            .find_by_id(request.id)
            .await?
            .ok_or(AppError::InvalidIdentifier)?;

        let Some(new_status) = request.status else {
            return Ok(duty);
        };
        if new_status == duty.status {
            return Ok(duty);
        }
        ensure_transition(&DUTY_STATUS_TRANSITIONS, duty.status, new_status, "status")?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        match new_status {
            DutyStatus::Started => {
                duty.started_on = Some(now);

                // El primer duty en arrancar pone el servicio en marcha
                let mut service = self
                    .services
                    .find_by_id(duty.service_id)
                    .await?
                    .ok_or(AppError::UnknownValue("service_id"))?;
                if service.status != ServiceStatus::Started {
                    ensure_transition(
                        &SERVICE_STATUS_TRANSITIONS,
                        service.status,
                        ServiceStatus::Started,
                        "status",
                    )?;
                    service.status = ServiceStatus::Started;
                    if service.started_on.is_none() {
                        service.started_on = Some(now);
                    }
                    self.services.update(&mut tx, &service).await?;
                }
            }
            DutyStatus::Terminated | DutyStatus::Ended => {
                duty.finished_on = Some(now);
            }
            _ => {}
        }

        duty.status = new_status;
        let updated = self.duties.update(&mut tx, &duty).await?;
        tx.commit().await?;

        info!("👷 Duty actualizado: id={}", updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let duty = self
            .duties
            .find_by_id(id)
            .await?
            .ok_or(AppError::InvalidIdentifier)?;

        if duty.status == DutyStatus::Started {
            return Err(AppError::DataInUse("Duty"));
        }
        if matches!(duty.status, DutyStatus::Terminated | DutyStatus::Ended)
            && self.duties.has_tickets(duty.id).await?
        {
            return Err(AppError::DataInUse("Duty"));
        }

        self.duties.delete(id).await?;
        info!("🗑️ Duty eliminado: id={}", id);
        Ok(())
    }

    pub async fn search(&self, filters: DutyFilters) -> AppResult<Vec<Duty>> {
        self.duties.search(&filters).await
    }
}
