//! Lock distribuido por ruta
//!
//! Exclusión mutua entre procesos para la lectura de topología durante la
//! creación de servicios. El backend real es Redis (SET NX PX + release
//! condicionado por token), detrás de un trait para poder sustituirlo.
//! El guard libera exactamente una vez en cualquier camino de salida.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Clave de lock para una ruta, en el formato `lock:{tabla}:{pk}`
pub fn route_lock_key(route_id: i32) -> String {
    format!("lock:route:{}", route_id)
}

/// Backend de almacenamiento del lock
#[async_trait]
pub trait LockBackend: Send + Sync {
    /// Intentar tomar el lock; no bloquea
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool>;

    /// Soltar el lock solo si el token coincide (solo el dueño libera)
    async fn release(&self, key: &str, token: &str) -> AppResult<()>;
}

/// Solo borra la clave si el token sigue siendo el nuestro
const RELEASE_SCRIPT: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
else
    return 0
end
"#;

/// Backend Redis del lock distribuido
pub struct RedisLockBackend {
    manager: ConnectionManager,
}

impl RedisLockBackend {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl LockBackend for RedisLockBackend {
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        let mut conn = self.manager.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn release(&self, key: &str, token: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: i32 = redis::Script::new(RELEASE_SCRIPT)
            .key(key)
            .arg(token)
            .invoke_async(&mut conn)
            .await?;
        Ok(())
    }
}

/// Mutex distribuido con espera acotada
#[derive(Clone)]
pub struct DistributedMutex {
    backend: Arc<dyn LockBackend>,
    ttl: Duration,
    max_wait: Duration,
}

impl DistributedMutex {
    pub fn new(backend: Arc<dyn LockBackend>, ttl: Duration, max_wait: Duration) -> Self {
        Self {
            backend,
            ttl,
            max_wait,
        }
    }

    /// Adquirir el lock o fallar con `LockAcquireTimeout` tras `max_wait`
    pub async fn acquire(&self, key: String) -> AppResult<LockGuard> {
        let token = Uuid::new_v4().to_string();
        let deadline = Instant::now() + self.max_wait;

        loop {
            if self.backend.try_acquire(&key, &token, self.ttl).await? {
                debug!("🔒 Lock adquirido: {}", key);
                return Ok(LockGuard {
                    backend: Arc::clone(&self.backend),
                    key,
                    token,
                    released: false,
                });
            }
            if Instant::now() >= deadline {
                warn!("⏰ Timeout adquiriendo lock: {}", key);
                return Err(AppError::LockAcquireTimeout);
            }
            sleep(Duration::from_millis(100)).await;
        }
    }
}

/// Guard RAII del lock. `release()` explícito en el camino feliz; el Drop
/// cubre los caminos de error lanzando la liberación en background.
pub struct LockGuard {
    backend: Arc<dyn LockBackend>,
    key: String,
    token: String,
    released: bool,
}

impl LockGuard {
    pub async fn release(mut self) -> AppResult<()> {
        self.released = true;
        debug!("🔓 Lock liberado: {}", self.key);
        self.backend.release(&self.key, &self.token).await
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let backend = Arc::clone(&self.backend);
        let key = std::mem::take(&mut self.key);
        let token = std::mem::take(&mut self.token);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = backend.release(&key, &token).await {
                    warn!("⚠️ Error liberando lock {}: {}", key, e);
                }
            });
        }
    }
}
