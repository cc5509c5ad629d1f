//! Constantes de dominio
//!
//! Límites de recursos y parámetros del core de ticketing. Los valores de
//! despliegue (URLs, budgets del sandbox, timeouts del lock) pueden
//! sobreescribirse por variables de entorno; ver `environment.rs`.

/// Versión soportada del motor de tarifas dinámicas
pub const DYNAMIC_FARE_VERSION: i32 = 1;

/// Mínimo de landmarks por ruta
pub const MIN_LANDMARK_IN_ROUTE: usize = 2;

/// Máximo de duties por servicio
pub const MAX_DUTY_PER_SERVICE: i64 = 50;

/// Cantidad máxima por tipo de ticket (límite del byte en el formato wire)
pub const MAX_TICKET_TYPE_COUNT: u32 = 255;

/// Longitud del nombre de sondeo que el validador de tarifas genera al azar
pub const PROBE_TYPE_NAME_LEN: usize = 32;

/// Budget de ejecución del script de tarifas (ms)
pub const SCRIPT_TIME_LIMIT_MS: u64 = 1000;

/// Budget de memoria del script de tarifas (10 MiB)
pub const SCRIPT_MEMORY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Expiración del lock distribuido (segundos)
pub const MUTEX_LOCK_TIMEOUT_SECS: u64 = 10;

/// Espera máxima para adquirir el lock distribuido (segundos)
pub const MUTEX_LOCK_MAX_WAIT_SECS: u64 = 60;
