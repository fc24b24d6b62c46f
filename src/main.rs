// src/main.rs
mod routes;
mod handlers;
mod models;
mod database;
mod state;
mod dtos;
mod error;
mod notify;
mod validation;

use axum::{routing::get, Router};
use tracing_subscriber::fmt::init as tracing_init;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use dotenvy::dotenv;
use std::net::{SocketAddr, IpAddr};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_init();

    // Load environment variables
    dotenv().ok();

    // Create database pool and apply migrations
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set");
    let db_pool = database::create_pool(&database_url).await
        .expect("Failed to create database pool");
    database::run_migrations(&db_pool).await
        .expect("Failed to run database migrations");

    // Create application state (tracing-backed notification sink)
    let app_state = state::AppState::new(db_pool);

    // Build application under /Kardex base path
    let api = routes::create_router()
        .route("/", get(|| async { "Kardex API" }))
        .route("/health", get(health_check));

    let app = Router::new()
        .nest("/Kardex", api)
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let host_str = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let host: IpAddr = host_str.parse().unwrap_or_else(|_| "127.0.0.1".parse().unwrap());
    let base_port = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);

    let Some(listener) = bind_listener(host, base_port).await else {
        tracing::error!("Failed to bind to any port starting at {} on {}", base_port, host);
        return;
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error=%e, "Server error");
    }
}

// Walks up from the configured port when it is already taken, so a stale
// instance does not prevent startup.
async fn bind_listener(host: IpAddr, base_port: u16) -> Option<TcpListener> {
    for offset in 0u16..=20 {
        let addr = SocketAddr::from((host, base_port.saturating_add(offset)));
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!("Server running on {}", addr);
                return Some(listener);
            }
            Err(e) if offset == 0 => {
                tracing::warn!(%addr, error=%e, "Port in use, trying next");
            }
            Err(_) => {}
        }
    }
    None
}

async fn health_check() -> &'static str {
    "OK"
}
