//! HTTP API Layer
//!
//! This crate provides the REST API for the bills system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for bills, parties, items, exchange rates
//!   and currencies
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! Handlers only talk to the storage ports, so the router runs the same
//! against PostgreSQL adapters or in-memory ones.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(billing, rates, directory));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put, delete},
};
use core_kernel::CurrencyRegistry;
use domain_billing::{BillingService, DirectoryStore, ExchangeRateService};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use crate::handlers::{bills, currencies, health, items, parties, rates};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub billing: Arc<BillingService>,
    pub rates: Arc<ExchangeRateService>,
    pub directory: Arc<dyn DirectoryStore>,
    pub registry: CurrencyRegistry,
}

impl AppState {
    /// Shares the service's currency registry with the directory handlers
    pub fn new(
        billing: BillingService,
        rates: ExchangeRateService,
        directory: Arc<dyn DirectoryStore>,
    ) -> Self {
        let registry = *billing.registry();
        Self {
            billing: Arc::new(billing),
            rates: Arc::new(rates),
            directory,
            registry,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let bill_routes = Router::new()
        .route("/", post(bills::create_bill))
        .route("/", get(bills::list_bills))
        .route("/:id", get(bills::get_bill))
        .route("/:id", delete(bills::delete_bill))
        .route("/:id/toggle-paid", post(bills::toggle_paid))
        .route("/:id/due-date", put(bills::reschedule))
        .route("/:id/items/:assignment_id", delete(bills::remove_line_item));

    let issuer_routes = Router::new()
        .route("/", post(parties::create_issuer))
        .route("/", get(parties::list_issuers))
        .route("/:id", get(parties::get_issuer))
        .route("/:id", put(parties::update_issuer))
        .route("/:id", delete(parties::delete_issuer));

    let receiver_routes = Router::new()
        .route("/", post(parties::create_receiver))
        .route("/", get(parties::list_receivers))
        .route("/:id", get(parties::get_receiver))
        .route("/:id", put(parties::update_receiver))
        .route("/:id", delete(parties::delete_receiver));

    let item_routes = Router::new()
        .route("/", post(items::create_item))
        .route("/", get(items::list_items))
        .route("/:id", get(items::get_item))
        .route("/:id", put(items::update_item))
        .route("/:id", delete(items::delete_item));

    let api_routes = Router::new()
        .nest("/bills", bill_routes)
        .nest("/issuers", issuer_routes)
        .nest("/receivers", receiver_routes)
        .nest("/items", item_routes)
        .route("/exchange-rates", post(rates::record_rate))
        .route("/exchange-rates", get(rates::rate_overview))
        .route("/currencies", get(currencies::list_currencies));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
