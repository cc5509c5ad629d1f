//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::cache::redis_client::RedisClient;
use crate::cache::route_lock::{DistributedMutex, RedisLockBackend};
use crate::config::environment::EnvironmentConfig;
use crate::services::fare_script::FareScriptEngine;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub redis: RedisClient,
    pub script_engine: FareScriptEngine,
    pub route_lock: DistributedMutex,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, redis: RedisClient) -> Self {
        let script_engine = FareScriptEngine::from_config(&config);
        let route_lock = DistributedMutex::new(
            Arc::new(RedisLockBackend::new(redis.manager())),
            Duration::from_secs(config.lock_timeout_secs),
            Duration::from_secs(config.lock_max_wait_secs),
        );
        Self {
            pool,
            config,
            redis,
            script_engine,
            route_lock,
        }
    }
}
