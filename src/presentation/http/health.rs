use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use utoipa::ToSchema;

use crate::infrastructure::db::PgPool;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResp {
    /// `ok` or `degraded`.
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

fn summarize(db_ok: bool) -> (StatusCode, HealthResp) {
    let (code, status, database) = if db_ok {
        (StatusCode::OK, "ok", "up")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down")
    };
    let body = HealthResp {
        status,
        database,
        version: env!("CARGO_PKG_VERSION"),
    };
    (code, body)
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    security(()),
    responses(
        (status = 200, body = HealthResp),
        (status = 503, description = "Database unreachable", body = HealthResp)
    )
)]
pub async fn health(State(pool): State<PgPool>) -> (StatusCode, Json<HealthResp>) {
    let db_ok = match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&pool).await {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = ?err, "health_check_database_unreachable");
            false
        }
    };
    let (code, body) = summarize(db_ok);
    (code, Json(body))
}

pub fn routes(pool: PgPool) -> Router {
    Router::new().route("/health", get(health)).with_state(pool)
}
