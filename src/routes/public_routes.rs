use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::controllers::service_controller::ServiceController;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_public_router() -> Router<AppState> {
    Router::new().route("/service/key", get(get_service_public_key))
}

#[derive(Debug, Deserialize)]
struct PublicKeyQuery {
    service_id: i32,
}

#[derive(Debug, Serialize)]
struct PublicKeyResponse {
    service_id: i32,
    public_key: String,
}

/// Lookup de clave pública para el dispositivo validador de tickets.
/// Es todo lo que el dispositivo necesita del servidor: el resto de la
/// verificación ocurre offline.
async fn get_service_public_key(
    State(state): State<AppState>,
    Query(query): Query<PublicKeyQuery>,
) -> Result<Json<PublicKeyResponse>, AppError> {
    let controller = ServiceController::new(state.pool.clone(), state.route_lock.clone());
    let public_key = controller.public_key(query.service_id).await?;
    Ok(Json(PublicKeyResponse {
        service_id: query.service_id,
        public_key,
    }))
}
