//! HTTP API Layer
//!
//! This crate provides the REST API for the hospital billing core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for invoices and health checks
//! - **Middleware**: Role resolution, tracing, audit logging
//! - **Access**: Per-route permission checks against the caller's role
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::from_config(config, store.clone(), store, Arc::new(SystemClock))?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod access;

use std::sync::Arc;

use axum::{
    Router,
    routing::get,
    middleware as axum_middleware,
};
use chrono::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use core_kernel::{Clock, CoreError, Currency, SequenceSource};
use domain_access::{RoleDirectory, StandardRoles};
use domain_billing::{InvoicePort, InvoiceService};

use crate::config::ApiConfig;
use crate::middleware::{audit_middleware, role_middleware};
use crate::handlers::{health, invoices};

/// Values filled into invoice requests that leave them out
#[derive(Debug, Clone, Copy)]
pub struct InvoiceDefaults {
    pub currency: Currency,
    pub payment_terms: Duration,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub invoices: Arc<InvoiceService>,
    pub roles: Arc<RoleDirectory>,
    pub defaults: InvoiceDefaults,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the invoice service from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `store` - Invoice store
    /// * `sequence` - Source of the latest issued invoice number
    /// * `clock` - Source of "now"
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if a configured value is invalid
    pub fn from_config(
        config: ApiConfig,
        store: Arc<dyn InvoicePort>,
        sequence: Arc<dyn SequenceSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        let policy = config.status_policy()?;
        let numbering = config.numbering()?;
        let defaults = InvoiceDefaults {
            currency: config.default_currency()?,
            payment_terms: config.payment_terms(),
        };

        info!(
            timezone = policy.timezone.name(),
            suppression_window_secs = policy.suppression_window.num_seconds(),
            suppression_clock = ?policy.suppression_clock,
            currency = %defaults.currency,
            "Invoice service configured"
        );

        let service = InvoiceService::new(store, sequence, clock)
            .with_policy(policy)
            .with_numbering(numbering);

        Ok(Self {
            invoices: Arc::new(service),
            roles: Arc::new(StandardRoles::create_standard_roles()),
            defaults,
            config,
        })
    }

    pub fn with_roles(mut self, roles: RoleDirectory) -> Self {
        self.roles = Arc::new(roles);
        self
    }
}

/// Creates the main API router
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no role required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let invoice_routes = Router::new()
        .route("/", get(invoices::list_invoices).post(invoices::create_invoice))
        .route("/:id", get(invoices::get_invoice).patch(invoices::update_invoice));

    // Role-checked API routes
    let api_routes = Router::new()
        .nest("/invoices", invoice_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), role_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
