//! Health check module
//! Provides health status for the application and its dependencies

use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{error, info};

use crate::cache::JoinedUserStore;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub checks: HashMap<String, ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Individual component health status
#[derive(Debug, Serialize, Clone)]
pub struct ComponentHealth {
    pub status: ComponentState,
    pub response_time_ms: Option<u128>,
    pub details: Option<String>,
}

/// Component state
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub enum ComponentState {
    Up,
    Down,
    Skipped,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            status: HealthState::Healthy,
            checks: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthState::Healthy)
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentHealth {
    pub fn up(response_time_ms: Option<u128>) -> Self {
        Self {
            status: ComponentState::Up,
            response_time_ms,
            details: None,
        }
    }

    pub fn down(details: Option<String>) -> Self {
        Self {
            status: ComponentState::Down,
            response_time_ms: None,
            details,
        }
    }

    pub fn skipped(details: impl Into<String>) -> Self {
        Self {
            status: ComponentState::Skipped,
            response_time_ms: None,
            details: Some(details.into()),
        }
    }
}

/// Health checker for the application
#[derive(Clone)]
pub struct HealthChecker {
    db_pool: Option<PgPool>,
    joined: Arc<dyn JoinedUserStore>,
}

impl HealthChecker {
    pub fn new(db_pool: Option<PgPool>, joined: Arc<dyn JoinedUserStore>) -> Self {
        Self { db_pool, joined }
    }

    /// Perform comprehensive health check
    pub async fn check_health(&self) -> HealthStatus {
        let mut health_status = HealthStatus::new();

        let database = match &self.db_pool {
            Some(pool) => check_component("database", check_database_health(pool)).await,
            None => ComponentHealth::skipped("no database pool configured"),
        };
        health_status.checks.insert("database".to_string(), database);

        let join_store =
            check_component("join_store", check_join_store_health(self.joined.as_ref())).await;
        health_status
            .checks
            .insert(format!("join_store:{}", self.joined.backend_name()), join_store);

        // Set overall status
        let overall_healthy = health_status
            .checks
            .values()
            .all(|c| c.status != ComponentState::Down);
        health_status.status = if overall_healthy {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        };

        health_status
    }
}

async fn check_component<F>(component: &str, check: F) -> ComponentHealth
where
    F: Future<Output = Result<u128, String>>,
{
    match timeout(CHECK_TIMEOUT, check).await {
        Ok(Ok(response_time)) => {
            info!("{} health check: OK ({}ms)", component, response_time);
            ComponentHealth::up(Some(response_time))
        }
        Ok(Err(e)) => {
            error!("{} health check failed: {}", component, e);
            ComponentHealth::down(Some(e))
        }
        Err(_) => {
            error!("{} health check timed out", component);
            ComponentHealth::down(Some("Timeout".to_string()))
        }
    }
}

pub async fn check_database_health(pool: &PgPool) -> Result<u128, String> {
    let start = Instant::now();
    crate::database::health_check(pool)
        .await
        .map(|_| start.elapsed().as_millis())
        .map_err(|e| e.to_string())
}

pub async fn check_join_store_health(store: &dyn JoinedUserStore) -> Result<u128, String> {
    let start = Instant::now();
    store
        .ping()
        .await
        .map(|_| start.elapsed().as_millis())
        .map_err(|e| e.to_string())
}
