use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use transit_ticketing::cache::redis_client::RedisClient;
use transit_ticketing::config::environment::EnvironmentConfig;
use transit_ticketing::middleware::cors::cors_middleware;
use transit_ticketing::state::AppState;
use transit_ticketing::{database, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚌 Transit Ticketing - Core de ticketing verificable offline");
    info!("=============================================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let pool = match database::create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    info!(
        "✅ PostgreSQL conectado: {}",
        database::connection::mask_database_url(&config.database_url)
    );

    // Inicializar Redis (lock distribuido por ruta)
    let redis_client = match RedisClient::new(&config.redis_url).await {
        Ok(client) => client,
        Err(e) => {
            error!("❌ Error conectando a Redis: {}", e);
            return Err(anyhow::anyhow!("Error de Redis: {}", e));
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app_state = AppState::new(pool, config, redis_client);

    // Crear router de la API; duty y ticket cuelgan del router de service
    let service_router = routes::service_routes::create_service_router()
        .nest("/duty", routes::duty_routes::create_duty_router())
        .nest(
            "/ticket/paper",
            routes::paper_ticket_routes::create_paper_ticket_router(),
        );

    let app = Router::new()
        .nest("/company/fare", routes::fare_routes::create_fare_router())
        .nest("/company/service", service_router)
        .nest("/public", routes::public_routes::create_public_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_middleware())
        .with_state(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("💰 Fare:");
    info!("   POST   /company/fare - Crear tarifa (valida el script)");
    info!("   PATCH  /company/fare - Actualizar tarifa (incrementa versión)");
    info!("   DELETE /company/fare - Eliminar tarifa");
    info!("   GET    /company/fare - Listar tarifas");
    info!("🚌 Service:");
    info!("   POST   /company/service - Crear servicio (lock de ruta + keypair)");
    info!("   PATCH  /company/service - Actualizar estado/remark");
    info!("   GET    /company/service - Listar servicios");
    info!("👷 Duty:");
    info!("   POST   /company/service/duty - Crear duty");
    info!("   PATCH  /company/service/duty - Actualizar estado");
    info!("   DELETE /company/service/duty - Eliminar duty");
    info!("   GET    /company/service/duty - Listar duties");
    info!("🎫 Paper Ticket:");
    info!("   POST   /company/service/ticket/paper - Emitir ticket firmado");
    info!("   GET    /company/service/ticket/paper - Listar tickets");
    info!("🔑 Público:");
    info!("   GET    /public/service/key - Clave pública del servicio");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
