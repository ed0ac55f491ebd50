// Finanzas TT - Web Server
// REST API over the ledger: record incomes/expenses/transfers, list them,
// summarize, and export filtered CSV snapshots.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use finanzas_tt::{
    export_expenses, export_incomes, normalize_expense, normalize_income, normalize_transfer,
    ExpenseSubmission, ExpenseSummaryRow, IncomeSubmission, IncomeSummaryRow, LedgerConfig,
    LedgerError, LedgerRepository, SqliteLedger, SystemClock, TransferSubmission,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<SqliteLedger>>,
    config: Arc<LedgerConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Rejected submission: 422 with the structured error as payload.
fn rejection(err: LedgerError) -> Response {
    let message = err.to_string();
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse {
            success: false,
            data: err,
            error: Some(message),
        }),
    )
        .into_response()
}

fn internal_error(err: anyhow::Error) -> Response {
    tracing::error!("database error: {err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse {
            success: false,
            data: (),
            error: Some("internal error".to_string()),
        }),
    )
        .into_response()
}

#[derive(Serialize)]
struct StatsResponse {
    incomes_by_semester: Vec<IncomeSummaryRow>,
    expenses_by_category: Vec<ExpenseSummaryRow>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/incomes - All incomes, newest first
async fn list_incomes(State(state): State<AppState>) -> Response {
    let db = state.db.lock().unwrap();

    match db.list_incomes() {
        Ok(records) => Json(ApiResponse::ok(records)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /api/incomes - Record one income
async fn create_income(
    State(state): State<AppState>,
    Json(sub): Json<IncomeSubmission>,
) -> Response {
    let record = match normalize_income(&sub, &state.config, &SystemClock) {
        Ok(record) => record,
        Err(e) => return rejection(e),
    };

    let db = state.db.lock().unwrap();
    match db.insert_income(&record) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(record))).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/expenses - All expenses, newest first
async fn list_expenses(State(state): State<AppState>) -> Response {
    let db = state.db.lock().unwrap();

    match db.list_expenses() {
        Ok(records) => Json(ApiResponse::ok(records)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /api/expenses - Record one expense
async fn create_expense(
    State(state): State<AppState>,
    Json(sub): Json<ExpenseSubmission>,
) -> Response {
    let record = match normalize_expense(&sub, &state.config, &SystemClock) {
        Ok(record) => record,
        Err(e) => return rejection(e),
    };

    let db = state.db.lock().unwrap();
    match db.insert_expense(&record) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(record))).into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /api/transfers - Book an internal transfer (income + optional cost)
async fn create_transfer(
    State(state): State<AppState>,
    Json(sub): Json<TransferSubmission>,
) -> Response {
    let records = match normalize_transfer(&sub, &state.config, &SystemClock) {
        Ok(records) => records,
        Err(e) => return rejection(e),
    };

    let db = state.db.lock().unwrap();
    if let Err(e) = db.insert_income(&records.income) {
        return internal_error(e);
    }
    if let Some(expense) = &records.expense {
        if let Err(e) = db.insert_expense(expense) {
            return internal_error(e);
        }
    }

    (StatusCode::CREATED, Json(ApiResponse::ok(records))).into_response()
}

/// GET /api/stats - Summaries for both tables
async fn get_stats(State(state): State<AppState>) -> Response {
    let db = state.db.lock().unwrap();

    let incomes = match db.income_summary() {
        Ok(rows) => rows,
        Err(e) => return internal_error(e),
    };
    let expenses = match db.expense_summary() {
        Ok(rows) => rows,
        Err(e) => return internal_error(e),
    };

    Json(ApiResponse::ok(StatsResponse {
        incomes_by_semester: incomes,
        expenses_by_category: expenses,
    }))
    .into_response()
}

/// Column filters from query params `f0..fN` (column index in the key).
fn filters_from_query(params: &HashMap<String, String>) -> Vec<(usize, String)> {
    let mut filters: Vec<(usize, String)> = params
        .iter()
        .filter_map(|(key, value)| {
            let col: usize = key.strip_prefix('f')?.parse().ok()?;
            Some((col, value.clone()))
        })
        .collect();
    filters.sort_by_key(|(col, _)| *col);
    filters
}

fn csv_attachment(filename: &str, csv: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response()
}

/// GET /api/incomes/export - Filtered income CSV
async fn export_incomes_csv(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let filters = filters_from_query(&params);
    let db = state.db.lock().unwrap();

    let records = match db.list_incomes() {
        Ok(records) => records,
        Err(e) => return internal_error(e),
    };
    match export_incomes(&records, &filters) {
        Ok(csv) => csv_attachment("incomes.csv", csv),
        Err(e) => internal_error(e),
    }
}

/// GET /api/expenses/export - Filtered expense CSV
async fn export_expenses_csv(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let filters = filters_from_query(&params);
    let db = state.db.lock().unwrap();

    let records = match db.list_expenses() {
        Ok(records) => records,
        Err(e) => return internal_error(e),
    };
    match export_expenses(&records, &filters) {
        Ok(csv) => csv_attachment("expenses.csv", csv),
        Err(e) => internal_error(e),
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = std::env::var("FINANZAS_DB").unwrap_or_else(|_| "finanzas.db".to_string());
    let db = SqliteLedger::open(&db_path)?;
    tracing::info!("database opened: {db_path}");

    let config = match std::env::var("FINANZAS_CONFIG") {
        Ok(path) => {
            let config = LedgerConfig::from_file(&path)?;
            tracing::info!("config loaded from {path}");
            config
        }
        Err(_) => LedgerConfig::with_defaults(),
    };

    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        config: Arc::new(config),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/incomes", get(list_incomes).post(create_income))
        .route("/incomes/export", get(export_incomes_csv))
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/export", get(export_expenses_csv))
        .route("/transfers", post(create_transfer))
        .route("/stats", get(get_stats))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("static"))
        .layer(CorsLayer::permissive());

    let addr = "0.0.0.0:8000";
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("server running on http://localhost:8000");

    axum::serve(listener, app).await?;

    Ok(())
}
