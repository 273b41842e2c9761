use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{self, HeaderName, HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use platform_api::{ApiError, ApiResult};
use platform_db::DbPool;
use products_hr::{
    Compensation, CompensationDraft, Employee, EmployeeDraft, Hr, ReportingStructure,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    config::AppConfig,
    errors::api_error,
    graphql::{self, SchemaType},
};


#[derive(Clone)]
pub struct AppState {
    pub hr: Arc<Hr>,
    pub schema: SchemaType,
    pub config: Arc<AppConfig>,
    /// Absent when serving from the in-memory store.
    pub db: Option<DbPool>,
}

impl AppState {
    pub fn new(hr: Hr, config: Arc<AppConfig>, db: Option<DbPool>) -> Self {
        let hr = Arc::new(hr);
        Self {
            schema: graphql::build_schema(hr.clone()),
            hr,
            config,
            db,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "hr server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .route("/graphql", post(graphql_handler))
        .route("/api/employee", post(create_employee))
        .route("/api/employee/{id}", get(read_employee).put(update_employee))
        .route(
            "/api/employee/{id}/reporting-structure",
            get(reporting_structure),
        )
        .route("/api/compensation", post(create_compensation))
        .route("/api/compensation/{employee_id}", get(list_compensations))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

/// Malformed JSON is a bad request; well-formed JSON of the wrong shape is
/// unprocessable.
fn read_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::JsonDataError(rejection)) => {
            error!(reason = %rejection.body_text(), "request body failed validation");
            Err(ApiError::Unprocessable(rejection.body_text()))
        }
        Err(rejection) => {
            error!(reason = %rejection.body_text(), "request body is malformed or empty");
            Err(ApiError::BadRequest(rejection.body_text()))
        }
    }
}

async fn create_employee(
    State(state): State<AppState>,
    body: Result<Json<EmployeeDraft>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let draft = read_body(body)?;
    let employee = state.hr.employees.create(draft).await.map_err(api_error)?;
    let location = format!("/api/employee/{}", employee.employee_id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(employee),
    ))
}

async fn read_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Employee>> {
    state
        .hr
        .employees
        .get(&id)
        .await
        .map_err(api_error)?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EmployeeDraft>, JsonRejection>,
) -> ApiResult<Json<Employee>> {
    let draft = read_body(body)?;
    state
        .hr
        .employees
        .replace(&id, draft)
        .await
        .map_err(api_error)?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn reporting_structure(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReportingStructure>> {
    let structure = state
        .hr
        .employees
        .reporting_structure(&id)
        .await
        .map_err(api_error)?;
    Ok(Json(structure))
}

async fn create_compensation(
    State(state): State<AppState>,
    body: Result<Json<CompensationDraft>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let draft = read_body(body)?;
    let compensation = state
        .hr
        .compensations
        .create(draft)
        .await
        .map_err(api_error)?;
    let location = format!("/api/compensation/{}", compensation.employee.employee_id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(compensation),
    ))
}

async fn list_compensations(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> ApiResult<Json<Vec<Compensation>>> {
    let compensations = state
        .hr
        .compensations
        .for_employee(&employee_id)
        .await
        .map_err(api_error)?;
    if compensations.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(compensations))
}

async fn graphql_handler(
    State(state): State<AppState>,
    request: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(request.into_inner()).await.into()
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = match &state.db {
        Some(db) => db.ping().await.is_ok(),
        None => true,
    };
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
