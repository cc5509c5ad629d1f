//! Resolución de distancia y contraste de importes
//!
//! Calcula la distancia del viajero a partir del snapshot congelado de la
//! ruta y contrasta el importe declarado por el cliente contra el total
//! que produce el sandbox para cada tipo solicitado.

use crate::config::constants::MAX_TICKET_TYPE_COUNT;
use crate::models::fare::FareAttributes;
use crate::models::paper_ticket::TicketTypeCount;
use crate::models::route::RouteSnapshot;
use crate::services::fare_script::FareScriptEngine;
use crate::utils::errors::{AppError, AppResult};

/// Distancia recorrida en metros entre dos landmarks del snapshot.
/// El pickup debe preceder al dropping a lo largo de la ruta.
pub fn resolve_distance(
    route: &RouteSnapshot,
    pickup_point: i32,
    dropping_point: i32,
) -> AppResult<i32> {
    let pickup = route
        .find_landmark(pickup_point)
        .ok_or(AppError::UnknownValue("pickup_point"))?;
    let dropping = route
        .find_landmark(dropping_point)
        .ok_or(AppError::UnknownValue("dropping_point"))?;

    let distance = dropping.distance_from_start - pickup.distance_from_start;
    if distance < 0 {
        return Err(AppError::UnknownValue("dropping_point"));
    }
    Ok(distance)
}

/// Total a cobrar: Σ precio_unitario(tipo, distancia) × cantidad.
/// Llamada bloqueante (una evaluación de sandbox por tipo).
pub fn compute_total(
    engine: &FareScriptEngine,
    attributes: &FareAttributes,
    function: &str,
    requested: &[TicketTypeCount],
    distance: i32,
) -> AppResult<f64> {
    if requested.is_empty() {
        return Err(AppError::InvalidValue("ticket_types"));
    }

    let mut total = 0.0;
    for request in requested {
        if request.count == 0 || request.count > MAX_TICKET_TYPE_COUNT {
            return Err(AppError::InvalidValue("ticket_types"));
        }
        if !attributes
            .ticket_types
            .iter()
            .any(|declared| declared.name == request.name)
        {
            return Err(AppError::UnknownTicketType(request.name.clone()));
        }

        let unit_price = engine.evaluate(function, &request.name, distance as f64)?;
        if unit_price < 0.0 {
            return Err(AppError::UnknownTicketType(request.name.clone()));
        }
        total += unit_price * request.count as f64;
    }
    Ok(total)
}

/// El importe declarado debe coincidir exactamente con el calculado;
/// la comparación es igualdad bit a bit, sin tolerancia.
pub fn cross_check_amount(computed: f64, declared: f64) -> AppResult<()> {
    if computed == declared {
        Ok(())
    } else {
        Err(AppError::InvalidValue("amount"))
    }
}

/// Mapear los tipos solicitados a pares `(type_id, count)` para el cuerpo
/// binario del ticket digital, usando los ids del snapshot de tarifa.
pub fn encode_ticket_types(
    attributes: &FareAttributes,
    requested: &[TicketTypeCount],
) -> AppResult<Vec<(u8, u8)>> {
    requested
        .iter()
        .filter(|request| request.count > 0)
        .map(|request| {
            let declared = attributes
                .ticket_types
                .iter()
                .find(|declared| declared.name == request.name)
                .ok_or_else(|| AppError::UnknownTicketType(request.name.clone()))?;
            let count =
                u8::try_from(request.count).map_err(|_| AppError::InvalidValue("ticket_types"))?;
            Ok((declared.id, count))
        })
        .collect()
}
