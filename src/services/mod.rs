//! Servicios de dominio
//!
//! Motores puros del core de ticketing: sandbox de scripts, validador de
//! definiciones de tarifa, resolución de distancia/importes y el codec
//! firmado del ticket digital.

pub mod digital_ticket;
pub mod fare_script;
pub mod fare_validation;
pub mod pricing;
