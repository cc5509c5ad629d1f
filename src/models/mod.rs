//! Modelos de dominio
//!
//! Structs que mapean al schema PostgreSQL más los formularios de
//! entrada/salida de la API para cada recurso.

pub mod duty;
pub mod fare;
pub mod paper_ticket;
pub mod route;
pub mod service;
