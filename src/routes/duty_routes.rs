use axum::{
    extract::{Query, State},
    routing::{delete, get, patch, post},
    Json, Router,
};

use crate::controllers::duty_controller::DutyController;
use crate::models::duty::{
    CreateDutyRequest, DeleteDutyRequest, Duty, DutyFilters, UpdateDutyRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_duty_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_duty))
        .route("/", patch(update_duty))
        .route("/", delete(delete_duty))
        .route("/", get(list_duties))
}

async fn create_duty(
    State(state): State<AppState>,
    Json(request): Json<CreateDutyRequest>,
) -> Result<(axum::http::StatusCode, Json<Duty>), AppError> {
    let controller = DutyController::new(state.pool.clone());
    let duty = controller.create(request).await?;
    Ok((axum::http::StatusCode::CREATED, Json(duty)))
}

async fn update_duty(
    State(state): State<AppState>,
    Json(request): Json<UpdateDutyRequest>,
) -> Result<Json<Duty>, AppError> {
    let controller = DutyController::new(state.pool.clone());
    let duty = controller.update(request).await?;
    Ok(Json(duty))
}

async fn delete_duty(
    State(state): State<AppState>,
    Json(request): Json<DeleteDutyRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    let controller = DutyController::new(state.pool.clone());
    controller.delete(request.id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn list_duties(
    State(state): State<AppState>,
    Query(filters): Query<DutyFilters>,
) -> Result<Json<Vec<Duty>>, AppError> {
    let controller = DutyController::new(state.pool.clone());
    let duties = controller.search(filters).await?;
    Ok(Json(duties))
}
