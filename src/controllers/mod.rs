//! Controllers
//!
//! Orquestación de cada operación de negocio: validaciones, máquinas de
//! estado, lock de ruta y transacciones.

pub mod duty_controller;
pub mod fare_controller;
pub mod paper_ticket_controller;
pub mod service_controller;
