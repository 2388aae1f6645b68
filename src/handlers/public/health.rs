use axum::response::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health - liveness check, no store access
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        service: "task-service",
    })
}
