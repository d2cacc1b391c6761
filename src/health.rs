//! Liveness endpoints for the hosting platform and monitoring.

use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;

/// The body served on the root route.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    status: &'static str,
    version: &'static str,
}

/// The body served on the health check route.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

/// Report that the service is running and which version it is.
pub async fn get_service_status() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "✅ Backend THE BOX rodando!",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Report that the service is healthy, with the current server time.
pub async fn get_health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        timestamp: OffsetDateTime::now_utc(),
    })
}
