//! Core de ticketing verificable offline para una plataforma de transporte
//! multi-tenant: sandbox de scripts de tarifa, codec binario firmado del
//! ticket digital y ciclo de vida de servicios/duties que regula la emisión.

pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
