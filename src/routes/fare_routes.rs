use axum::{
    extract::{Query, State},
    routing::{delete, get, patch, post},
    Json, Router,
};

use crate::controllers::fare_controller::FareController;
use crate::models::fare::{
    CreateFareRequest, DeleteFareRequest, Fare, FareFilters, UpdateFareRequest,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_fare_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_fare))
        .route("/", patch(update_fare))
        .route("/", delete(delete_fare))
        .route("/", get(list_fares))
}

async fn create_fare(
    State(state): State<AppState>,
    Json(request): Json<CreateFareRequest>,
) -> Result<(axum::http::StatusCode, Json<Fare>), AppError> {
    let controller = FareController::new(state.pool.clone(), state.script_engine.clone());
    let fare = controller.create(request).await?;
    Ok((axum::http::StatusCode::CREATED, Json(fare)))
}

async fn update_fare(
    State(state): State<AppState>,
    Json(request): Json<UpdateFareRequest>,
) -> Result<Json<Fare>, AppError> {
    let controller = FareController::new(state.pool.clone(), state.script_engine.clone());
    let fare = controller.update(request).await?;
    Ok(Json(fare))
}

async fn delete_fare(
    State(state): State<AppState>,
    Json(request): Json<DeleteFareRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    let controller = FareController::new(state.pool.clone(), state.script_engine.clone());
    controller.delete(request.id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn list_fares(
    State(state): State<AppState>,
    Query(filters): Query<FareFilters>,
) -> Result<Json<Vec<Fare>>, AppError> {
    let controller = FareController::new(state.pool.clone(), state.script_engine.clone());
    let fares = controller.search(filters).await?;
    Ok(Json(fares))
}
