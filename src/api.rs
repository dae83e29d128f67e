//! # API Server Module
//!
//! ## Purpose
//! REST API server exposing the sunspot lookup, the visitor counter pages
//! and system management endpoints.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with place names, coordinates and date tokens
//! - **Output**: JSON responses with sun-event payloads, plain-text counter
//!   pages, system status
//! - **Endpoints**: Sunspot lookup, counter, health, stats
//!
//! ## Key Features
//! - Structured error responses with stable category slugs
//! - CORS support for web frontends
//! - Per-request tracing spans with request ids

use crate::errors::{LookupError, Result};
use crate::storage::StoreStats;
use crate::{AppState, Coordinate, SunEventResult};
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// Application state wrapper for the API server
pub struct ApiServer {
    app_state: AppState,
}

/// Query parameters accepted by the sunspot endpoint
#[derive(Debug, Deserialize)]
pub struct SunspotParams {
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub date: Option<String>,
}

/// Sunspot lookup response payload
#[derive(Debug, Serialize)]
pub struct SunspotResponse {
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    pub date: chrono::NaiveDate,
    pub sunspot: SunEventResult,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub components: HealthComponents,
}

/// Component health status
#[derive(Debug, Serialize)]
pub struct HealthComponents {
    pub cache_store: String,
}

impl ApiServer {
    /// Create new API server
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let workers = self.app_state.config.performance.worker_threads;
        let request_timeout =
            Duration::from_secs(self.app_state.config.server.request_timeout_seconds);
        let enable_cors = self.app_state.config.server.enable_cors;
        let app_state = self.app_state;

        tracing::info!("Starting API server on {}", bind_addr);

        HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };

            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .wrap(cors)
                .configure(configure_routes)
        })
        .workers(workers)
        .client_request_timeout(request_timeout)
        .bind(&bind_addr)
        .map_err(|e| LookupError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run()
        .await
        .map_err(|e| LookupError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// Register all routes on a service config
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/sunspot", web::get().to(sunspot_handler))
        .route("/api/counter", web::get().to(counter_get_handler))
        .route("/api/counter", web::post().to(counter_increment_handler))
        .route("/api/hello", web::get().to(hello_handler))
        .route("/last", web::get().to(last_handler))
        .route("/next", web::get().to(next_handler))
        .route("/health", web::get().to(health_handler))
        .route("/stats", web::get().to(stats_handler))
        .route("/", web::get().to(index_handler));
}

/// The lookup target named by the query parameters
enum Target {
    City(String),
    Coords(Coordinate),
}

fn parse_coordinate_param(name: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| crate::invalid_input!("query parameter '{}' must be a number, got '{}'", name, raw))
}

/// Settle the city-XOR-coordinates choice before touching any collaborator.
fn parse_target(params: &SunspotParams) -> Result<Target> {
    let has_coords = params.lat.is_some() || params.lon.is_some();

    match (&params.city, has_coords) {
        (Some(_), true) => Err(crate::invalid_input!(
            "provide either 'city' or a 'lat'/'lon' pair, not both"
        )),
        (None, false) => Err(crate::invalid_input!(
            "provide a 'city' or a 'lat'/'lon' pair"
        )),
        (Some(city), false) => Ok(Target::City(city.clone())),
        (None, true) => {
            let (lat, lon) = match (&params.lat, &params.lon) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    return Err(crate::invalid_input!(
                        "'lat' and 'lon' must be provided together"
                    ))
                }
            };
            let lat = parse_coordinate_param("lat", lat)?;
            let lon = parse_coordinate_param("lon", lon)?;
            Ok(Target::Coords(Coordinate::new(lat, lon)?))
        }
    }
}

/// Sunspot lookup endpoint handler
async fn sunspot_handler(
    app_state: web::Data<AppState>,
    query: web::Query<SunspotParams>,
) -> ActixResult<HttpResponse> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("sunspot_lookup", %request_id);

    match handle_sunspot(&app_state, &query).instrument(span).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn handle_sunspot(state: &AppState, params: &SunspotParams) -> Result<SunspotResponse> {
    let token = params.date.as_deref();

    match parse_target(params)? {
        Target::City(city) => {
            let coord = state.locations.forward(&city).await?;
            let (sunspot, resolved) = state.resolver.resolve(coord, token).await?;
            Ok(SunspotResponse {
                location: city.trim().to_string(),
                lat: coord.lat,
                lon: coord.lon,
                date: resolved.date,
                sunspot,
            })
        }
        Target::Coords(coord) => {
            // Resolve first so a bad date token or provider outage is
            // reported without paying for a reverse-geocode call.
            let (sunspot, resolved) = state.resolver.resolve(coord, token).await?;
            let location = state.locations.reverse(coord).await;
            Ok(SunspotResponse {
                location,
                lat: coord.lat,
                lon: coord.lon,
                date: resolved.date,
                sunspot,
            })
        }
    }
}

/// Map a lookup error onto its HTTP status and a structured body.
fn error_response(e: &LookupError) -> HttpResponse {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        tracing::error!("Lookup failed: {}", e);
    } else {
        tracing::debug!("Lookup rejected: {}", e);
    }

    HttpResponse::build(status).json(serde_json::json!({
        "error": e.category(),
        "message": e.to_string(),
    }))
}

/// Counter read endpoint handler
async fn counter_get_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body(app_state.counter.current().to_string()))
}

/// Counter increment endpoint handler
async fn counter_increment_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let value = app_state.counter.increment();
    tracing::debug!("Visitor counter advanced to {}", value);
    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body(value.to_string()))
}

/// Last-visitor page handler
async fn last_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body(format!("Last visitor number: {}\n", app_state.counter.current())))
}

/// Next-visitor page handler
async fn next_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body(format!("Next visitor number: {}\n", app_state.counter.increment())))
}

/// Hello endpoint handler
async fn hello_handler() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body("Hello, World!\n"))
}

/// Health check endpoint handler
async fn health_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let store_status = match app_state.store.health_check().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let response = HealthResponse {
        status: store_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        components: HealthComponents {
            cache_store: store_status.to_string(),
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Statistics endpoint handler
async fn stats_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let resolver_stats = app_state.resolver.stats();
    let store_stats = match app_state.store.stats().await {
        Ok(stats) => stats,
        Err(_) => StoreStats {
            backend: "unavailable",
            entries: 0,
        },
    };

    let response = serde_json::json!({
        "resolver": resolver_stats,
        "store": store_stats,
        "visitors": app_state.counter.current(),
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Index page handler
async fn index_handler() -> ActixResult<HttpResponse> {
    let html = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Sunspot Lookup Service</title>
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .header { color: #2c3e50; }
            .endpoint { margin: 20px 0; padding: 15px; background: #f8f9fa; border-radius: 5px; }
            .method { font-weight: bold; color: #27ae60; }
        </style>
    </head>
    <body>
        <h1 class="header">Sunspot Lookup Service</h1>
        <p>Resolve a place and a date into sunrise/sunset data, cached so repeat lookups skip the upstream APIs.</p>

        <h2>Available Endpoints</h2>

        <div class="endpoint">
            <span class="method">GET</span> /api/sunspot?city=NAME or ?lat=F&amp;lon=F, optional &amp;date=TOKEN
            <p>Look up sun events for a place name or a coordinate pair.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET/POST</span> /api/counter
            <p>Read or advance the visitor counter.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /last, /next
            <p>Visitor counter pages.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /health
            <p>Check the health status of system components.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /stats
            <p>Get lookup and cache statistics.</p>
        </div>

        <h2>Example Lookup</h2>
        <pre>GET /api/sunspot?city=Lisbon&amp;date=tomorrow</pre>
    </body>
    </html>
    "#;

    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}
