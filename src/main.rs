use credit_package_backend::app::{build_router, AppState};
use credit_package_backend::cache::{InMemoryJoinedUsers, JoinedUserStore};
use credit_package_backend::config::{AppConfig, JoinStoreBackend, JoinStoreConfig, LoggingConfig};
use credit_package_backend::database::credit_package_repository::PgCreditPackageRepository;
use credit_package_backend::database::{get_pool_stats, init_pool_from_config, run_migrations};
use credit_package_backend::health::HealthChecker;
use credit_package_backend::logging::init_tracing;
use credit_package_backend::messaging::TelegramClient;
use credit_package_backend::services::WebhookRelay;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

async fn build_join_store(config: &JoinStoreConfig) -> anyhow::Result<Arc<dyn JoinedUserStore>> {
    match config.backend {
        JoinStoreBackend::Memory => {
            info!("🧠 Using in-memory joined-user store");
            Ok(Arc::new(InMemoryJoinedUsers::new()))
        }
        #[cfg(feature = "cache")]
        JoinStoreBackend::Redis => {
            use credit_package_backend::cache::{init_cache_pool, CacheConfig, RedisJoinedUsers};

            info!("🔄 Initializing Redis joined-user store...");
            let pool = init_cache_pool(CacheConfig::for_url(config.redis_url.clone())).await?;
            info!("✅ Redis joined-user store ready");
            Ok(Arc::new(RedisJoinedUsers::new(pool)))
        }
        #[cfg(not(feature = "cache"))]
        JoinStoreBackend::Redis => Err(anyhow::anyhow!(
            "JOIN_STORE=redis requires the `cache` feature"
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!("❌ Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    init_tracing(&config.logging);

    config.validate().map_err(|e| {
        error!("❌ Invalid configuration: {}", e);
        e
    })?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.server.environment.as_str(),
        "🚀 Starting credit package backend"
    );

    info!("📊 Initializing database connection pool...");
    let db_pool = init_pool_from_config(&config.database).await.map_err(|e| {
        error!("Failed to initialize database pool: {}", e);
        e
    })?;
    let stats = get_pool_stats(&db_pool);
    info!(
        size = stats.size,
        idle = stats.num_idle,
        "✅ Database connection pool initialized"
    );

    if config.database.run_migrations {
        run_migrations(&db_pool).await?;
    } else {
        info!("⏭️  Skipping migrations (RUN_MIGRATIONS=false)");
    }

    let joined = build_join_store(&config.join_store).await?;

    let telegram = TelegramClient::new(&config.telegram)?;
    if !telegram.has_credential() {
        warn!("⚠️  TELEGRAM_TOKEN is not set, outbound messages will be dropped");
    }
    let relay = WebhookRelay::new(
        Arc::new(telegram),
        Arc::clone(&joined),
        config.telegram.welcome_message.clone(),
    );

    let state = AppState::new(
        Arc::new(PgCreditPackageRepository::new(db_pool.clone())),
        relay,
        HealthChecker::new(Some(db_pool.clone()), joined),
        config.telegram.webhook_secret.clone(),
    );
    let app = build_router(
        state,
        config.server.environment,
        &config.server.cors_allowed_origins,
    );
    info!("✅ Routes configured");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "🌐 Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Closing database connection pool");
    db_pool.close().await;
    info!("👋 Server stopped");

    Ok(())
}
