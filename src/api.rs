//! HTTP routes. Handlers only extract, validate paging and delegate; every
//! failure leaves as a [`ScrapError`] JSON body.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::company::CompanyService;
use crate::config::ApiConfig;
use crate::error::{ErrorCode, ScrapError, ScrapResult};
use crate::finance::DividendQueryService;
use crate::model::{Company, CompanyRecord, Page, ScrapedResult};

#[derive(Clone)]
pub struct AppState {
    pub companies: Arc<CompanyService>,
    pub finance: Arc<DividendQueryService>,
    pub api: ApiConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/company", get(list_companies).post(add_company))
        .route("/company/autocomplete", get(autocomplete))
        .route("/company/suggest", get(suggest))
        .route("/company/{ticker}", delete(delete_company))
        .route("/finance/dividend/{company_name}", get(dividends_by_company))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct SaveReq {
    ticker: String,
}

#[derive(Deserialize)]
struct PageParams {
    page: Option<usize>,
    size: Option<usize>,
}

#[derive(Deserialize)]
struct KeywordParams {
    keyword: String,
}

fn invalid<E: std::fmt::Display>(e: E) -> ScrapError {
    tracing::warn!(error = %e, "request rejected");
    ScrapError::new(ErrorCode::InvalidRequest)
}

async fn add_company(
    State(state): State<AppState>,
    body: Result<Json<SaveReq>, JsonRejection>,
) -> ScrapResult<Json<Company>> {
    let Json(req) = body.map_err(invalid)?;
    let company = state.companies.save(&req.ticker).await?;
    Ok(Json(company))
}

async fn list_companies(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ScrapResult<Json<Page<CompanyRecord>>> {
    let Query(p) = params.map_err(invalid)?;
    let size = p.size.unwrap_or(state.api.default_page_size);
    if size == 0 {
        return Err(ScrapError::with_message(
            ErrorCode::InvalidRequest,
            "page size must be at least 1",
        ));
    }
    let size = size.min(state.api.max_page_size);
    let page = state
        .companies
        .list_companies(p.page.unwrap_or(0), size)
        .await?;
    Ok(Json(page))
}

async fn delete_company(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ScrapResult<String> {
    state.companies.delete_company(&ticker).await
}

async fn autocomplete(
    State(state): State<AppState>,
    params: Result<Query<KeywordParams>, QueryRejection>,
) -> ScrapResult<Json<Vec<String>>> {
    let Query(q) = params.map_err(invalid)?;
    Ok(Json(
        state
            .companies
            .autocomplete(&q.keyword, state.api.autocomplete_limit),
    ))
}

async fn suggest(
    State(state): State<AppState>,
    params: Result<Query<KeywordParams>, QueryRejection>,
) -> ScrapResult<Json<Vec<String>>> {
    let Query(q) = params.map_err(invalid)?;
    let names = state
        .companies
        .company_names_by_keyword(&q.keyword, state.api.suggestion_limit)
        .await?;
    Ok(Json(names))
}

async fn dividends_by_company(
    State(state): State<AppState>,
    Path(company_name): Path<String>,
) -> ScrapResult<Json<ScrapedResult>> {
    let result = state
        .finance
        .get_dividends_by_company_name(&company_name)
        .await?;
    Ok(Json(result))
}
