//! Validador de definiciones de tarifa
//!
//! Puerta de verificación que se ejecuta en cada alta o modificación de
//! una tarifa, antes de confiar en su script para pricing real. Prueba que
//! el script discrimina tipos conocidos de desconocidos: precio no
//! negativo en distancias 0 y 1 para cada tipo declarado, y exactamente el
//! centinela -1 para un nombre aleatorio que no colisiona con ninguno.
//! Sin efectos secundarios.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::config::constants::{DYNAMIC_FARE_VERSION, PROBE_TYPE_NAME_LEN};
use crate::models::fare::FareAttributes;
use crate::services::fare_script::FareScriptEngine;
use crate::utils::errors::{AppError, AppResult};

/// Validar un script de tarifa contra sus atributos declarados
pub fn validate_fare_definition(
    engine: &FareScriptEngine,
    function: &str,
    attributes: &FareAttributes,
) -> AppResult<()> {
    if attributes.df_version != DYNAMIC_FARE_VERSION {
        return Err(AppError::InvalidFareVersion);
    }

    for ticket_type in &attributes.ticket_types {
        for distance in [0.0, 1.0] {
            let price = engine.evaluate(function, &ticket_type.name, distance)?;
            if price < 0.0 {
                return Err(AppError::UnknownTicketType(ticket_type.name.clone()));
            }
        }
    }

    // Un tipo inventado siempre debe producir exactamente -1
    let probe = random_probe_name(attributes);
    if engine.evaluate(function, &probe, 0.0)? != -1.0 {
        return Err(AppError::InvalidFareFunction);
    }

    Ok(())
}

/// Nombre aleatorio de 32 caracteres que no colisiona con ningún tipo declarado
fn random_probe_name(attributes: &FareAttributes) -> String {
    loop {
        let candidate: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(PROBE_TYPE_NAME_LEN)
            .map(char::from)
            .collect();
        if !attributes
            .ticket_types
            .iter()
            .any(|t| t.name == candidate)
        {
            return candidate;
        }
    }
}
