use std::future::Future;
use std::net::SocketAddr;

use axum::{
    handler::Handler,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers;
use crate::middleware::{enforce_rate_limit, jwt_auth_middleware};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/health", get(handlers::health))
        // Protected API
        .merge(task_routes(&state))
        // Global middleware
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Task routes behind the request chain:
/// global limit -> JWT gate -> per-route limit -> handler
fn task_routes(state: &AppState) -> Router<AppState> {
    use axum::routing::{patch, put};
    use handlers::protected::tasks;

    let create = tasks::create.layer(from_fn_with_state(
        state.limits.create.clone(),
        enforce_rate_limit,
    ));
    let update = tasks::update.layer(from_fn_with_state(
        state.limits.update.clone(),
        enforce_rate_limit,
    ));

    Router::new()
        .route("/api/tasks", get(tasks::list).post(create))
        .route("/api/tasks/:id", put(update).delete(tasks::delete))
        .route("/api/tasks/:id/status", patch(tasks::toggle_status))
        .route_layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(
                    state.limits.global.clone(),
                    enforce_rate_limit,
                ))
                .layer(from_fn_with_state(
                    state.verifier.clone(),
                    jwt_auth_middleware,
                )),
        )
}

/// Any origin is mirrored outside production; production only admits the
/// configured allow-list
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = if config.is_production() {
        let allowed: Vec<HeaderValue> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(allowed)
    } else {
        AllowOrigin::mirror_request()
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

/// Serve the app on `listener` until `shutdown` resolves. Peer addresses are
/// recorded so rate limits can key on them.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
