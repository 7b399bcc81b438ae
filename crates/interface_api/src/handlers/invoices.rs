//! Invoice handlers
//!
//! Every read goes through the invoice service, so the statuses returned here
//! are already reconciled and any correction has been written back.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::InvoiceId;
use domain_access::permissions;

use crate::access::Caller;
use crate::dto::invoices::*;
use crate::{error::ApiError, AppState};

fn parse_id(raw: &str) -> Result<InvoiceId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid invoice id: {raw}")))
}

/// Lists invoices, optionally for one patient or one stored status
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<ListInvoicesQuery>,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    caller.require(permissions::BILLING_READ)?;
    params.validate()?;

    let invoices = state
        .invoices
        .list_invoices(params.into(), Some(caller.metadata()))
        .await?;
    Ok(Json(invoices.into_iter().map(InvoiceResponse::from).collect()))
}

/// Gets an invoice by ID
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    caller.require(permissions::BILLING_READ)?;
    let id = parse_id(&id)?;

    let invoice = state.invoices.get_invoice(id, Some(caller.metadata())).await?;
    Ok(Json(invoice.into()))
}

/// Creates an invoice with the next invoice number
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    caller.require(permissions::BILLING_WRITE)?;
    request.validate()?;

    let draft = request.into_draft(&state.defaults, state.invoices.today())?;
    let invoice = state
        .invoices
        .create_invoice(draft, Some(caller.metadata()))
        .await?;
    Ok((StatusCode::CREATED, Json(invoice.into())))
}

/// Applies a manual edit
pub async fn update_invoice(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(request): Json<UpdateInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    caller.require(permissions::BILLING_WRITE)?;
    request.validate()?;
    let id = parse_id(&id)?;

    let invoice = state
        .invoices
        .edit_invoice(id, request.into(), Some(caller.metadata()))
        .await?;
    Ok(Json(invoice.into()))
}
