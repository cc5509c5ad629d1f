//! Repositorios
//!
//! Acceso a datos por recurso. Las lecturas van contra el pool; las
//! escrituras que forman parte de una operación atómica reciben la
//! transacción abierta por el controller.

pub mod duty_repository;
pub mod fare_repository;
pub mod paper_ticket_repository;
pub mod route_repository;
pub mod service_repository;
