mod handlers;
mod state;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub use state::{AppState, DynGeocoder, DynWeather};

use crate::config::ClientConfig;
use crate::location::{LocationResolver, Nominatim};
use crate::tool::WeatherTool;
use crate::weather::OpenMeteo;

/// State backed by the public Nominatim and Open-Meteo services.
pub fn live_state(config: &ClientConfig) -> Arc<AppState> {
    let geocoder: DynGeocoder = Box::new(Nominatim::new(config));
    let weather: DynWeather = Box::new(OpenMeteo::new(config));
    Arc::new(AppState {
        tool: WeatherTool::new(LocationResolver::new(geocoder), weather),
    })
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/details", get(handlers::details))
        .route("/api/weather", get(handlers::weather))
        .route("/api/tool", get(handlers::tool_definition).post(handlers::tool_call))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, config: &ClientConfig) {
    let app = build_router(live_state(config));
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(%addr, error = %e, "cannot bind");
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    info!(%addr, "meteo server listening");
    eprintln!("  meteo server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "server error");
            std::process::exit(1);
        });
}
