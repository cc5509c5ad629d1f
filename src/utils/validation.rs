//! Validación de topología de rutas
//!
//! Reglas sobre la secuencia ordenada de landmarks que debe cumplirse
//! antes de congelar el snapshot de un servicio. Se ejecuta bajo el lock
//! de ruta, antes de escribir cualquier fila.

use crate::config::constants::MIN_LANDMARK_IN_ROUTE;
use crate::models::route::LandmarkInRoute;
use crate::utils::errors::{AppError, AppResult};

/// Validar la secuencia de landmarks de una ruta (ya ordenada por
/// `distance_from_start` ascendente).
///
/// - al menos `MIN_LANDMARK_IN_ROUTE` landmarks
/// - el primero arranca en distancia 0 sin deltas
/// - el último llega y sale en el mismo minuto
/// - los intermedios tienen parada real: `departure_delta > arrival_delta`
pub fn validate_landmark_sequence(landmarks: &[LandmarkInRoute]) -> AppResult<()> {
    if landmarks.len() < MIN_LANDMARK_IN_ROUTE {
        return Err(AppError::InvalidValue("route_id"));
    }

    let first = &landmarks[0];
    if first.distance_from_start != 0 || first.arrival_delta != 0 || first.departure_delta != 0 {
        return Err(AppError::InvalidValue("route_id"));
    }

    let last = &landmarks[landmarks.len() - 1];
    if last.arrival_delta != last.departure_delta {
        return Err(AppError::InvalidValue("route_id"));
    }

    for landmark in &landmarks[1..landmarks.len() - 1] {
        if landmark.departure_delta <= landmark.arrival_delta {
            return Err(AppError::InvalidValue("route_id"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landmark(
        landmark_id: i32,
        distance_from_start: i32,
        arrival_delta: i32,
        departure_delta: i32,
    ) -> LandmarkInRoute {
        LandmarkInRoute {
            id: landmark_id,
            company_id: 1,
            route_id: 1,
            landmark_id,
            distance_from_start,
            arrival_delta,
            departure_delta,
        }
    }

    #[test]
    fn accepts_well_formed_sequence() {
        let landmarks = vec![
            landmark(10, 0, 0, 0),
            landmark(11, 2500, 10, 12),
            landmark(12, 7500, 25, 25),
        ];
        assert!(validate_landmark_sequence(&landmarks).is_ok());
    }

    #[test]
    fn accepts_minimal_two_stop_route() {
        let landmarks = vec![landmark(10, 0, 0, 0), landmark(11, 5000, 15, 15)];
        assert!(validate_landmark_sequence(&landmarks).is_ok());
    }

    #[test]
    fn rejects_single_landmark() {
        let landmarks = vec![landmark(10, 0, 0, 0)];
        assert!(validate_landmark_sequence(&landmarks).is_err());
    }

    #[test]
    fn rejects_first_landmark_with_nonzero_arrival() {
        let landmarks = vec![landmark(10, 0, 5, 5), landmark(11, 5000, 15, 15)];
        assert!(validate_landmark_sequence(&landmarks).is_err());
    }

    #[test]
    fn rejects_first_landmark_not_at_distance_zero() {
        let landmarks = vec![landmark(10, 100, 0, 0), landmark(11, 5000, 15, 15)];
        assert!(validate_landmark_sequence(&landmarks).is_err());
    }

    #[test]
    fn rejects_last_landmark_with_dwell() {
        let landmarks = vec![
            landmark(10, 0, 0, 0),
            landmark(11, 2500, 10, 12),
            landmark(12, 7500, 25, 30),
        ];
        assert!(validate_landmark_sequence(&landmarks).is_err());
    }

    #[test]
    fn rejects_intermediate_without_dwell() {
        let landmarks = vec![
            landmark(10, 0, 0, 0),
            landmark(11, 2500, 10, 10),
            landmark(12, 7500, 25, 25),
        ];
        assert!(validate_landmark_sequence(&landmarks).is_err());
    }
}
