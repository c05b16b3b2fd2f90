//! # POS Handlers
//!
//! ```text
//! POST /pos/start-session/          200 existing | 201 new
//! POST /pos/end-session/            200 closed session
//! POST /pos/make-sale/              201 sale + fiscal outcome
//! GET  /pos/sales/{id}              200 sale detail
//! GET  /pos/sales/{id}/fiscalization
//! GET  /pos/sessions/{id}/sales
//! ```
//!
//! Every route needs a [`CashierId`].

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use zimpos_core::{CoreError, FiscalizationLog};

use crate::auth::CashierId;
use crate::dto::{
    EndSessionRequest, MakeSaleRequest, SaleResponse, SaleSummary, SessionResponse,
    StartSessionRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn start_session(
    State(state): State<AppState>,
    cashier: CashierId,
    payload: Result<Json<StartSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let Json(body) = payload?;
    let opening_balance = body.opening_balance.unwrap_or_default();

    let start = state
        .db
        .sessions()
        .start(cashier.as_str(), body.store.trim(), opening_balance)
        .await?;

    let status = if start.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(start.session.into())))
}

/// The body is optional; `{"store": "<id>"}` picks a session when the
/// cashier has one open at several stores.
pub async fn end_session(
    State(state): State<AppState>,
    cashier: CashierId,
    body: Bytes,
) -> ApiResult<Json<SessionResponse>> {
    let request: EndSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        EndSessionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::validation("body", e.to_string()))?
    };

    let session = state
        .db
        .sessions()
        .end(cashier.as_str(), request.store.as_deref())
        .await?;

    Ok(Json(session.into()))
}

pub async fn make_sale(
    State(state): State<AppState>,
    cashier: CashierId,
    payload: Result<Json<MakeSaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleResponse>)> {
    // A cashier without a session hears about that before anything else
    if state
        .db
        .sessions()
        .get_active_for_cashier(cashier.as_str())
        .await?
        .is_none()
    {
        return Err(CoreError::NoActiveSession.into());
    }

    let Json(body) = payload?;
    let request = body.into_domain()?;

    let completed = state.checkout.make_sale(cashier.as_str(), request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SaleResponse::from_completed(
            completed,
            &state.config.default_currency,
        )),
    ))
}

pub async fn get_sale(
    State(state): State<AppState>,
    _cashier: CashierId,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleResponse>> {
    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| CoreError::SaleNotFound(id.clone()))?;

    let items = state.db.sales().get_items(&sale.id).await?;
    let logs = state.db.fiscal().logs_for_sale(&sale.id).await?;

    Ok(Json(SaleResponse::from_parts(
        sale,
        items,
        logs.last(),
        &state.config.default_currency,
    )))
}

pub async fn sale_fiscalization(
    State(state): State<AppState>,
    _cashier: CashierId,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<FiscalizationLog>>> {
    if state.db.sales().get_by_id(&id).await?.is_none() {
        return Err(CoreError::SaleNotFound(id).into());
    }

    let logs = state.db.fiscal().logs_for_sale(&id).await?;
    debug!(sale_id = %id, attempts = logs.len(), "Listing fiscalization attempts");

    Ok(Json(logs))
}

pub async fn session_sales(
    State(state): State<AppState>,
    _cashier: CashierId,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<SaleSummary>>> {
    if state.db.sessions().get_by_id(&id).await?.is_none() {
        return Err(CoreError::SessionNotFound(id).into());
    }

    let sales = state.db.sales().list_for_session(&id).await?;
    Ok(Json(sales.into_iter().map(SaleSummary::from).collect()))
}
