//! Máquinas de estado de Service y Duty
//!
//! Tablas estáticas de transiciones permitidas. Las reglas con contexto
//! (ENDED bloqueado por duties activos, cascada TERMINATED → NOT_USED)
//! viven en los controllers; aquí solo la forma del grafo.

use std::collections::HashMap;
use std::hash::Hash;

use lazy_static::lazy_static;

use crate::models::duty::DutyStatus;
use crate::models::service::ServiceStatus;
use crate::utils::errors::{AppError, AppResult};

lazy_static! {
    /// CREATED → STARTED → {TERMINATED, ENDED}; ambos finales reabren a STARTED.
    /// AUDITED es terminal y nunca se acepta como entrada de usuario.
    pub static ref SERVICE_STATUS_TRANSITIONS: HashMap<ServiceStatus, Vec<ServiceStatus>> = {
        let mut table = HashMap::new();
        table.insert(ServiceStatus::Created, vec![ServiceStatus::Started]);
        table.insert(
            ServiceStatus::Started,
            vec![ServiceStatus::Terminated, ServiceStatus::Ended],
        );
        table.insert(ServiceStatus::Terminated, vec![ServiceStatus::Started]);
        table.insert(ServiceStatus::Ended, vec![ServiceStatus::Started]);
        table.insert(ServiceStatus::Audited, vec![]);
        table
    };

    pub static ref DUTY_STATUS_TRANSITIONS: HashMap<DutyStatus, Vec<DutyStatus>> = {
        let mut table = HashMap::new();
        table.insert(
            DutyStatus::Assigned,
            vec![DutyStatus::Started, DutyStatus::NotUsed],
        );
        table.insert(
            DutyStatus::Started,
            vec![DutyStatus::Terminated, DutyStatus::Ended],
        );
        table.insert(DutyStatus::Terminated, vec![DutyStatus::Started]);
        table.insert(DutyStatus::Ended, vec![DutyStatus::Started]);
        table.insert(DutyStatus::NotUsed, vec![]);
        table
    };
}

/// Validar una transición contra su tabla; `field` nombra la columna en el
/// error devuelto al cliente.
pub fn ensure_transition<S>(
    table: &HashMap<S, Vec<S>>,
    old_state: S,
    new_state: S,
    field: &'static str,
) -> AppResult<()>
where
    S: Eq + Hash + Copy,
{
    let allowed = table
        .get(&old_state)
        .map(|targets| targets.contains(&new_state))
        .unwrap_or(false);
    if allowed {
        Ok(())
    } else {
        Err(AppError::InvalidStateTransition(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_happy_path() {
        let t = &*SERVICE_STATUS_TRANSITIONS;
        assert!(ensure_transition(t, ServiceStatus::Created, ServiceStatus::Started, "status").is_ok());
        assert!(ensure_transition(t, ServiceStatus::Started, ServiceStatus::Ended, "status").is_ok());
        assert!(ensure_transition(t, ServiceStatus::Ended, ServiceStatus::Started, "status").is_ok());
        assert!(ensure_transition(t, ServiceStatus::Terminated, ServiceStatus::Started, "status").is_ok());
    }

    #[test]
    fn service_invalid_jumps() {
        let t = &*SERVICE_STATUS_TRANSITIONS;
        assert!(ensure_transition(t, ServiceStatus::Created, ServiceStatus::Ended, "status").is_err());
        assert!(ensure_transition(t, ServiceStatus::Created, ServiceStatus::Terminated, "status").is_err());
        assert!(ensure_transition(t, ServiceStatus::Audited, ServiceStatus::Started, "status").is_err());
        assert!(ensure_transition(t, ServiceStatus::Started, ServiceStatus::Audited, "status").is_err());
    }

    #[test]
    fn duty_assigned_branches() {
        let t = &*DUTY_STATUS_TRANSITIONS;
        assert!(ensure_transition(t, DutyStatus::Assigned, DutyStatus::Started, "status").is_ok());
        assert!(ensure_transition(t, DutyStatus::Assigned, DutyStatus::NotUsed, "status").is_ok());
        assert!(ensure_transition(t, DutyStatus::Assigned, DutyStatus::Ended, "status").is_err());
        assert!(ensure_transition(t, DutyStatus::NotUsed, DutyStatus::Started, "status").is_err());
    }

    #[test]
    fn duty_started_is_reversible_from_finals() {
        let t = &*DUTY_STATUS_TRANSITIONS;
        assert!(ensure_transition(t, DutyStatus::Started, DutyStatus::Terminated, "status").is_ok());
        assert!(ensure_transition(t, DutyStatus::Started, DutyStatus::Ended, "status").is_ok());
        assert!(ensure_transition(t, DutyStatus::Terminated, DutyStatus::Started, "status").is_ok());
        assert!(ensure_transition(t, DutyStatus::Ended, DutyStatus::Started, "status").is_ok());
    }
}
