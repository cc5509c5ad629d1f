//! Cliente Redis
//!
//! Cliente con connection pooling y operaciones async. En este sistema
//! Redis respalda únicamente el lock distribuido por ruta; no hay capa de
//! cache de datos.

use anyhow::Result;
use redis::aio::ConnectionManager;
use tracing::info;

/// Cliente Redis con connection pooling
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
}

impl RedisClient {
    /// Crear nuevo cliente Redis
    pub async fn new(redis_url: &str) -> Result<Self> {
        info!("🔗 Conectando a Redis: {}", redis_url);

        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis conectado exitosamente");

        Ok(Self { manager })
    }

    pub fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// Verificar si Redis está conectado
    pub async fn is_connected(&self) -> bool {
        let mut conn = self.manager.clone();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(response) => response == "PONG",
            Err(_) => false,
        }
    }
}
