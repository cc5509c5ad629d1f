//! Sandbox de scripts de tarifa
//!
//! Ejecuta la función `getFare` suministrada por el operador dentro de un
//! intérprete QuickJS aislado. El contenido del script es hostil por
//! definición: cada invocación usa un runtime nuevo (sin estado entre
//! llamadas), con límite de memoria del engine y deadline de reloj
//! aplicado por el interrupt handler. Al exceder cualquiera de los dos el
//! engine mata la ejecución; el script no puede impedirlo cooperando o no.
//! No se expone ningún binding de host: sin I/O, sin red.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rquickjs::{Context, Function, Runtime};

use crate::config::environment::EnvironmentConfig;
use crate::utils::errors::{AppError, AppResult};

/// Nombre obligatorio de la función de pricing dentro del script
const FARE_FUNCTION_NAME: &str = "getFare";

/// Motor de evaluación de scripts de tarifa con budgets de recursos
#[derive(Debug, Clone)]
pub struct FareScriptEngine {
    time_limit: Duration,
    memory_limit: usize,
}

impl FareScriptEngine {
    pub fn new(time_limit_ms: u64, memory_limit_bytes: usize) -> Self {
        Self {
            time_limit: Duration::from_millis(time_limit_ms),
            memory_limit: memory_limit_bytes,
        }
    }

    pub fn from_config(config: &EnvironmentConfig) -> Self {
        Self::new(config.script_time_limit_ms, config.script_memory_limit_bytes)
    }

    /// Evaluar `getFare(ticket_type, distance)` y devolver el precio.
    ///
    /// Llamada bloqueante; desde handlers async se envuelve en
    /// `spawn_blocking`. Devuelve el número que retorne el script (incluido
    /// el centinela -1 para tipos desconocidos).
    pub fn evaluate(&self, script: &str, ticket_type: &str, distance: f64) -> AppResult<f64> {
        self.evaluate_until(script, ticket_type, distance, Instant::now() + self.time_limit)
    }

    /// Igual que `evaluate` pero con deadline explícito, para que el caller
    /// pueda propagar su propio límite de cancelación.
    pub fn evaluate_until(
        &self,
        script: &str,
        ticket_type: &str,
        distance: f64,
        deadline: Instant,
    ) -> AppResult<f64> {
        let runtime = Runtime::new()
            .map_err(|e| AppError::Internal(format!("cannot create JS runtime: {}", e)))?;
        runtime.set_memory_limit(self.memory_limit);

        // Deadline de reloj: el handler pide interrupción al engine una vez
        // superado; el flag distingue timeout de otros fallos.
        let timed_out = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&timed_out);
        runtime.set_interrupt_handler(Some(Box::new(move || {
            if Instant::now() >= deadline {
                flag.store(true, Ordering::SeqCst);
                true
            } else {
                false
            }
        })));

        let context = Context::full(&runtime)
            .map_err(|e| AppError::Internal(format!("cannot create JS context: {}", e)))?;

        let outcome: Result<f64, String> = context.with(|ctx| {
            let mut run = || -> Result<f64, rquickjs::Error> {
                ctx.eval::<(), _>(script)?;
                let get_fare: Function = ctx.globals().get(FARE_FUNCTION_NAME)?;
                get_fare.call((ticket_type, distance))
            };
            run().map_err(|error| match error {
                rquickjs::Error::Exception => describe_exception(&ctx),
                other => other.to_string(),
            })
        });

        match outcome {
            Ok(price) => Ok(price),
            Err(_) if timed_out.load(Ordering::SeqCst) => Err(AppError::JsTimeLimitExceeded),
            Err(message) if message.contains("out of memory") => {
                Err(AppError::JsMemoryLimitExceeded)
            }
            Err(message) if message.contains("interrupted") => Err(AppError::JsTimeLimitExceeded),
            Err(_) => Err(AppError::InvalidFareFunction),
        }
    }

    /// Comprobar si el script carga y responde para un tipo y distancia dados
    pub fn validate(&self, script: &str, ticket_type: &str, distance: f64) -> bool {
        self.evaluate(script, ticket_type, distance).is_ok()
    }
}

fn describe_exception(ctx: &rquickjs::Ctx) -> String {
    let caught = ctx.catch();
    if let Some(exception) = caught.as_exception() {
        exception
            .message()
            .unwrap_or_else(|| "unknown exception".to_string())
    } else {
        format!("{:?}", caught)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> FareScriptEngine {
        FareScriptEngine::new(1000, 10 * 1024 * 1024)
    }

    const SIMPLE_SCRIPT: &str = r#"
        function getFare(ticketType, distance) {
            if (ticketType === 'Adult') return 10 + distance;
            return -1;
        }
    "#;

    #[test]
    fn evaluates_known_type() {
        let price = engine().evaluate(SIMPLE_SCRIPT, "Adult", 5.0).unwrap();
        assert_eq!(price, 15.0);
    }

    #[test]
    fn unknown_type_returns_sentinel() {
        let price = engine().evaluate(SIMPLE_SCRIPT, "Ghost", 0.0).unwrap();
        assert_eq!(price, -1.0);
    }

    #[test]
    fn fresh_interpreter_per_invocation() {
        // el estado global de una llamada no puede filtrarse a la siguiente
        let script = r#"
            if (typeof globalThis.counter === 'undefined') globalThis.counter = 0;
            globalThis.counter += 1;
            function getFare(ticketType, distance) { return globalThis.counter; }
        "#;
        let e = engine();
        assert_eq!(e.evaluate(script, "x", 0.0).unwrap(), 1.0);
        assert_eq!(e.evaluate(script, "x", 0.0).unwrap(), 1.0);
    }

    #[test]
    fn infinite_loop_hits_time_limit() {
        let script = "function getFare(t, d) { while (true) {} }";
        let err = FareScriptEngine::new(100, 10 * 1024 * 1024)
            .evaluate(script, "Adult", 0.0)
            .unwrap_err();
        assert!(matches!(err, AppError::JsTimeLimitExceeded));
    }

    #[test]
    fn allocation_bomb_hits_memory_limit() {
        let script = r#"
            function getFare(t, d) {
                var chunks = [];
                while (true) chunks.push('x'.repeat(65536));
            }
        "#;
        let err = FareScriptEngine::new(10_000, 2 * 1024 * 1024)
            .evaluate(script, "Adult", 0.0)
            .unwrap_err();
        assert!(matches!(err, AppError::JsMemoryLimitExceeded));
    }

    #[test]
    fn syntax_error_is_invalid_function() {
        let err = engine().evaluate("function getFare(", "Adult", 0.0).unwrap_err();
        assert!(matches!(err, AppError::InvalidFareFunction));
    }

    #[test]
    fn missing_function_is_invalid() {
        let err = engine()
            .evaluate("var answer = 42;", "Adult", 0.0)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFareFunction));
    }

    #[test]
    fn non_numeric_return_is_invalid() {
        let script = "function getFare(t, d) { return 'free'; }";
        assert!(engine().evaluate(script, "Adult", 0.0).is_err());
    }

    #[test]
    fn validate_reflects_evaluation() {
        let e = engine();
        assert!(e.validate(SIMPLE_SCRIPT, "Adult", 0.0));
        assert!(!e.validate("not a script {{", "Adult", 0.0));
    }
}
