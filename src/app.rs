/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (user store, hasher, auth services) → Router 組み立て
 * - Middleware の適用 (AuthenticationFilter / request-id / trace / limit / timeout)
 * - axum::serve() で起動 (Ctrl-C で graceful shutdown)
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::{InMemoryUserStore, PgUserStore, UserStore},
    services::{
        auth::{BcryptHasher, PasswordHasher, build_auth_services},
        users::UserService,
    },
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,blog_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast. production: default hook, server keeps running.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting blog auth API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let store = build_user_store(&config).await?;
    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(config.bcrypt_cost));

    let state = build_state(&config, store, hasher)?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

/// Postgres when `DATABASE_URL` is set, otherwise the in-memory store.
///
/// The database is pinged once; an unreachable database is logged, not fatal.
async fn build_user_store(config: &Config) -> Result<Arc<dyn UserStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory user store (data is lost on restart)");
        return Ok(Arc::new(InMemoryUserStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_lazy(url)
        .context("invalid DATABASE_URL")?;

    let store = PgUserStore::new(pool.clone());
    match store.ping().await {
        Ok(()) => {
            tracing::info!("connected to user database");
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                tracing::error!(error = %e, "database migration failed");
            }
        }
        Err(e) => tracing::error!(error = %e, "user database is unreachable; continuing"),
    }

    Ok(Arc::new(store))
}

/// Build process-level services and inject them into the shared application state.
pub fn build_state(
    config: &Config,
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
) -> Result<AppState> {
    let auth = build_auth_services(config, store.clone(), hasher.clone())?;
    let users = UserService::new(store, hasher);

    Ok(AppState::new(auth, users, config.jwt.token_prefix.as_str()))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = api::v1::routes(state.clone()).with_state(state);

    middleware::http::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
