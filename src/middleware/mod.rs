//! Middleware
//!
//! Este módulo contiene los middleware HTTP del sistema.

pub mod cors;
