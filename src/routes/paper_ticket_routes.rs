use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::controllers::paper_ticket_controller::PaperTicketController;
use crate::models::paper_ticket::{
    CreatePaperTicketRequest, CreatedPaperTicket, PaperTicket, PaperTicketFilters,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_paper_ticket_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_paper_ticket))
        .route("/", get(list_paper_tickets))
}

async fn create_paper_ticket(
    State(state): State<AppState>,
    Json(request): Json<CreatePaperTicketRequest>,
) -> Result<(axum::http::StatusCode, Json<CreatedPaperTicket>), AppError> {
    let controller = PaperTicketController::new(state.pool.clone(), state.script_engine.clone());
    let created = controller.create(request).await?;
    Ok((axum::http::StatusCode::CREATED, Json(created)))
}

async fn list_paper_tickets(
    State(state): State<AppState>,
    Query(filters): Query<PaperTicketFilters>,
) -> Result<Json<Vec<PaperTicket>>, AppError> {
    let controller = PaperTicketController::new(state.pool.clone(), state.script_engine.clone());
    let tickets = controller.search(filters).await?;
    Ok(Json(tickets))
}
