use axum::{
    extract::{Query, State},
    routing::{get, patch, post},
    Json, Router,
};

use crate::controllers::service_controller::ServiceController;
use crate::models::service::{
    CreateServiceRequest, ServiceFilters, ServiceResponse, UpdateServiceRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_service_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_service))
        .route("/", patch(update_service))
        .route("/", get(list_services))
}

async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(axum::http::StatusCode, Json<ServiceResponse>), AppError> {
    let controller = ServiceController::new(state.pool.clone(), state.route_lock.clone());
    let service = controller.create(request).await?;
    Ok((axum::http::StatusCode::CREATED, Json(service)))
}

async fn update_service(
    State(state): State<AppState>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<ServiceResponse>, AppError> {
    let controller = ServiceController::new(state.pool.clone(), state.route_lock.clone());
    let service = controller.update(request).await?;
    Ok(Json(service))
}

async fn list_services(
    State(state): State<AppState>,
    Query(filters): Query<ServiceFilters>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let controller = ServiceController::new(state.pool.clone(), state.route_lock.clone());
    let services = controller.search(filters).await?;
    Ok(Json(services))
}
