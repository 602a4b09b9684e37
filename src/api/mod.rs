mod cli;

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::{
    CASHFLOW_CSV_FILENAME, CalculationInputs, CalculationResult, CashflowYear, ExpenseShare,
    ProjectionAssumptions, cashflow_csv, compute, expense_shares, project_cashflow,
};
use crate::error::InputError;

pub use cli::{
    CalculateArgs, Cli, Command, FieldNames, OutputFormat, build_request, render_calculation,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    purchase_price: Option<f64>,
    annual_rent: Option<f64>,

    stamp_duty: Option<f64>,
    legal_fees: Option<f64>,

    maintenance_costs: Option<f64>,
    management_fees: Option<f64>,
    insurance_costs: Option<f64>,
    council_rates: Option<f64>,
    vacancy_rate: Option<f64>,

    include_mortgage: Option<bool>,
    mortgage_interest_rate: Option<f64>,
    mortgage_term_years: Option<u32>,
    loan_to_value_ratio: Option<f64>,

    projection_years: Option<u32>,
    rent_growth: Option<f64>,
    expense_inflation: Option<f64>,
}

/// Validated calculator input plus the projection it should be run with.
#[derive(Debug, Clone, Copy)]
pub struct CalculationRequest {
    pub inputs: CalculationInputs,
    pub assumptions: ProjectionAssumptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub result: CalculationResult,
    pub expense_shares: Vec<ExpenseShare>,
    pub assumptions: ProjectionAssumptions,
    pub projection: Vec<CashflowYear>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_calculate_response(request: &CalculationRequest) -> CalculateResponse {
    let result = compute(&request.inputs);
    CalculateResponse {
        expense_shares: expense_shares(&result.annual_expenses),
        projection: project_cashflow(&result, &request.assumptions),
        assumptions: request.assumptions,
        result,
    }
}

/// Web form, static assets, and the JSON/CSV API, sharing one config.
pub fn router(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .route(
            "/api/projection.csv",
            get(projection_csv_get_handler).post(projection_csv_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(config)
}

pub async fn run_http_server(config: AppConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let port = config.port;
    let app = router(Arc::new(config));

    let listener = TcpListener::bind(addr.as_str()).await?;
    info!("Rental yield HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_get_handler(
    State(config): State<Arc<AppConfig>>,
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => calculate_handler_impl(&config, payload),
        Err(rejection) => rejected(InputError::Payload(rejection.body_text())),
    }
}

async fn calculate_post_handler(
    State(config): State<Arc<AppConfig>>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => calculate_handler_impl(&config, payload),
        Err(rejection) => rejected(InputError::Payload(rejection.body_text())),
    }
}

async fn projection_csv_get_handler(
    State(config): State<Arc<AppConfig>>,
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => projection_csv_handler_impl(&config, payload),
        Err(rejection) => rejected(InputError::Payload(rejection.body_text())),
    }
}

async fn projection_csv_post_handler(
    State(config): State<Arc<AppConfig>>,
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => projection_csv_handler_impl(&config, payload),
        Err(rejection) => rejected(InputError::Payload(rejection.body_text())),
    }
}

fn calculate_handler_impl(config: &AppConfig, payload: CalculatePayload) -> Response {
    let request = match api_request_from_payload(payload, config.projection.into()) {
        Ok(request) => request,
        Err(err) => return rejected(err),
    };

    let response = build_calculate_response(&request);
    debug!(
        gross_yield_pct = response.result.gross_yield_pct,
        net_yield_pct = response.result.net_yield_pct,
        "calculation served"
    );
    json_response(StatusCode::OK, response)
}

fn projection_csv_handler_impl(config: &AppConfig, payload: CalculatePayload) -> Response {
    let request = match api_request_from_payload(payload, config.projection.into()) {
        Ok(request) => request,
        Err(err) => return rejected(err),
    };

    let result = compute(&request.inputs);
    let years = project_cashflow(&result, &request.assumptions);
    let body = match cashflow_csv(&years) {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "projection export failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string());
        }
    };

    let disposition = format!("attachment; filename=\"{CASHFLOW_CSV_FILENAME}\"");
    with_cache_control((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

fn rejected(err: InputError) -> Response {
    warn!(error = %err, "rejected calculation request");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<CalculationRequest, InputError> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| InputError::Payload(e.to_string()))?;
    api_request_from_payload(payload, ProjectionAssumptions::default())
}

fn api_request_from_payload(
    payload: CalculatePayload,
    projection_defaults: ProjectionAssumptions,
) -> Result<CalculationRequest, InputError> {
    let mut args = default_args_for_api();

    if let Some(v) = payload.purchase_price {
        args.purchase_price = v;
    }
    if let Some(v) = payload.annual_rent {
        args.annual_rent = v;
    }

    if let Some(v) = payload.stamp_duty {
        args.stamp_duty = v;
    }
    if let Some(v) = payload.legal_fees {
        args.legal_fees = v;
    }

    if let Some(v) = payload.maintenance_costs {
        args.maintenance_costs = v;
    }
    if let Some(v) = payload.management_fees {
        args.management_fees = v;
    }
    if let Some(v) = payload.insurance_costs {
        args.insurance_costs = v;
    }
    if let Some(v) = payload.council_rates {
        args.council_rates = v;
    }
    if let Some(v) = payload.vacancy_rate {
        args.vacancy_rate = v;
    }

    if let Some(v) = payload.include_mortgage {
        args.include_mortgage = v;
    }
    if let Some(v) = payload.mortgage_interest_rate {
        args.mortgage_interest_rate = Some(v);
    }
    if let Some(v) = payload.mortgage_term_years {
        args.mortgage_term_years = Some(v);
    }
    if let Some(v) = payload.loan_to_value_ratio {
        args.loan_to_value_ratio = Some(v);
    }

    if let Some(v) = payload.projection_years {
        args.projection_years = Some(v);
    }
    if let Some(v) = payload.rent_growth {
        args.rent_growth = Some(v);
    }
    if let Some(v) = payload.expense_inflation {
        args.expense_inflation = Some(v);
    }

    build_request(&args, projection_defaults, &FieldNames::JSON)
}

fn default_args_for_api() -> CalculateArgs {
    CalculateArgs {
        purchase_price: 500_000.0,
        annual_rent: 26_000.0,
        stamp_duty: 18_000.0,
        legal_fees: 1_500.0,
        maintenance_costs: 1_000.0,
        management_fees: 2_000.0,
        insurance_costs: 1_200.0,
        council_rates: 1_800.0,
        vacancy_rate: 5.0,
        include_mortgage: false,
        mortgage_interest_rate: Some(6.0),
        mortgage_term_years: Some(30),
        loan_to_value_ratio: Some(80.0),
        projection_years: None,
        rent_growth: None,
        expense_inflation: None,
    }
}
