use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::MatchedPath;
use dotenvy::dotenv;
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use pos_api::application::ports::storage_port::StoragePort;
use pos_api::application::services::jwt::JwtService;
use pos_api::bootstrap::app_context::{AppContext, AppServices};
use pos_api::bootstrap::config::{Config, StorageBackend};
use pos_api::infrastructure::db::repositories::{
    image_repository_sqlx::SqlxImageRepository, role_repository_sqlx::SqlxRoleRepository,
    token_repository_sqlx::SqlxTokenRepository, user_repository_sqlx::SqlxUserRepository,
    verification_code_repository_sqlx::SqlxVerificationCodeRepository,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            pos_api::presentation::http::auth::register,
            pos_api::presentation::http::auth::authenticate,
            pos_api::presentation::http::auth::refresh_token,
            pos_api::presentation::http::auth::logout,
            pos_api::presentation::http::users::get_current_user,
            pos_api::presentation::http::users::get_user_by_id,
            pos_api::presentation::http::users::request_verification_code,
            pos_api::presentation::http::users::update_profile,
            pos_api::presentation::http::users::change_password,
            pos_api::presentation::http::images::upload_image,
            pos_api::presentation::http::images::list_images,
            pos_api::presentation::http::images::get_image,
            pos_api::presentation::http::health::health,
        ),
        components(schemas(
            pos_api::presentation::http::auth::RegisterMultipart,
            pos_api::presentation::http::auth::AuthenticateRequest,
            pos_api::presentation::http::auth::AuthenticationResponse,
            pos_api::presentation::http::users::UserResponse,
            pos_api::presentation::http::users::UpdateProfileMultipart,
            pos_api::presentation::http::users::ChangePasswordRequest,
            pos_api::presentation::http::images::ImageResponse,
            pos_api::presentation::http::images::UploadImageMultipart,
            pos_api::presentation::http::error::ResponseMessage,
            pos_api::presentation::http::health::HealthResp,
        )),
        tags(
            (name = "Auth", description = "Registration, login and token refresh"),
            (name = "Users", description = "Profile and password management"),
            (name = "Images", description = "Image upload and retrieval"),
            (name = "Health", description = "System health checks")
        )
    )]
struct ApiDoc;

fn build_cors(cfg: &Config) -> CorsLayer {
    let methods = [
        http::Method::GET,
        http::Method::POST,
        http::Method::PUT,
        http::Method::DELETE,
        http::Method::OPTIONS,
    ];
    let headers = [http::header::CONTENT_TYPE, http::header::AUTHORIZATION];
    match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true),
        _ if cfg.is_production => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(HeaderValue::from_static("http://invalid")))
            .allow_methods(methods)
            .allow_headers(headers),
        // Development convenience
        _ => CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "pos_api=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting POS backend");

    // Database
    let pool = pos_api::infrastructure::db::connect_pool(&cfg).await?;
    pos_api::infrastructure::db::migrate(&pool).await?;

    let storage_port: Arc<dyn StoragePort> = match cfg.storage_backend {
        StorageBackend::Filesystem => {
            if let Err(e) = tokio::fs::create_dir_all(&cfg.storage_root).await {
                tracing::warn!(error = ?e, dir = %cfg.storage_root, "Failed to create uploads dir");
            }
            Arc::new(pos_api::infrastructure::storage::fs::FsStoragePort::new(
                &cfg.storage_root,
            ))
        }
        StorageBackend::S3 => {
            Arc::new(pos_api::infrastructure::storage::s3::S3StoragePort::new(&cfg).await?)
        }
    };

    let jwt = Arc::new(JwtService::new(
        &cfg.jwt_secret,
        cfg.jwt_expires_secs,
        cfg.jwt_refresh_expires_secs,
    ));

    let services = AppServices::new(
        Arc::new(SqlxUserRepository::new(pool.clone())),
        Arc::new(SqlxImageRepository::new(pool.clone())),
        Arc::new(SqlxTokenRepository::new(pool.clone())),
        Arc::new(SqlxVerificationCodeRepository::new(pool.clone())),
        Arc::new(SqlxRoleRepository::new(pool.clone())),
        storage_port,
        Arc::new(pos_api::infrastructure::notify::LogCodeNotifier),
        jwt,
    );
    let ctx = AppContext::new(cfg.clone(), services);

    let app = Router::new()
        .nest(
            "/api",
            pos_api::presentation::http::health::routes(pool.clone()),
        )
        .nest(
            "/api/v1/auth",
            pos_api::presentation::http::auth::routes(ctx.clone()),
        )
        .nest(
            "/api",
            pos_api::presentation::http::users::routes(ctx.clone()),
        )
        .nest(
            "/api",
            pos_api::presentation::http::images::routes(ctx.clone()),
        )
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(build_cors(&cfg))
        // Multipart overhead on top of the largest accepted file
        .layer(DefaultBodyLimit::max(cfg.upload_max_bytes + 64 * 1024))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to listen for shutdown signal");
    }
}
