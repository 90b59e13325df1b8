//! Router assembly
//!
//! Layers, outermost first: request id, tracing, request log line, CORS,
//! security headers, terminal error stage, panic catcher, body limit.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::api::{credit_packages, health, webhooks};
use crate::config::Environment;
use crate::database::repository::CreditPackageStore;
use crate::health::HealthChecker;
use crate::middleware::error::{error_envelope_middleware, handle_panic, not_found};
use crate::middleware::logging::{request_logging_middleware, UuidRequestId};
use crate::services::WebhookRelay;

pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub credit_packages: Arc<dyn CreditPackageStore>,
    pub relay: WebhookRelay,
    pub health: HealthChecker,
    pub webhook_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        credit_packages: Arc<dyn CreditPackageStore>,
        relay: WebhookRelay,
        health: HealthChecker,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            credit_packages,
            relay,
            health,
            webhook_secret: webhook_secret
                .filter(|s| !s.is_empty())
                .map(Arc::from),
        }
    }
}

pub fn build_router(
    state: AppState,
    environment: Environment,
    cors_allowed_origins: &[String],
) -> Router {
    Router::new()
        .route(
            "/v1/api/credit-package",
            get(credit_packages::list_credit_packages).post(credit_packages::create_credit_package),
        )
        .route(
            "/v1/api/credit-package/{creditPackageId}",
            put(credit_packages::update_credit_package)
                .delete(credit_packages::delete_credit_package),
        )
        .route(
            "/v1/api/admin/credit-package",
            get(credit_packages::admin_list_credit_packages),
        )
        .route("/webhook", post(webhooks::telegram_webhook))
        .route("/sendMsg", post(webhooks::send_message))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/health/live", get(health::liveness))
        // A known path with an unsupported method is reported like an unknown path
        .method_not_allowed_fallback(not_found)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors_layer(cors_allowed_origins))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                ))
                .layer(from_fn_with_state(environment, error_envelope_middleware))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
