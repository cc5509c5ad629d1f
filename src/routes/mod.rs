//! Routes
//!
//! Routers de Axum por recurso; los handlers delegan en los controllers.

pub mod duty_routes;
pub mod fare_routes;
pub mod paper_ticket_routes;
pub mod public_routes;
pub mod service_routes;
