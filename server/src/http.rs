use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, State},
    http::{HeaderName, HeaderValue, Method, header, request::Parts},
    routing::{get, patch},
};
use platform_api::{ApiError, ApiResult};
use platform_authn::{AuthnError, IdentityResolver, ProfileLoader, UserProfile};
use platform_db::DbPool;
use products_planning::{
    Created, Updated,
    alerts::{self, CoverageAlertView, CoverageQuery, MedicalAlertView, MedicalQuery},
    assignments::{self, AssignmentFilter, AssignmentPatch, AssignmentView, NewAssignment},
    employees::{self, EmployeeView, NewEmployee},
    unavailabilities::{self, NewUnavailability, UnavailabilityFilter, UnavailabilityView},
};
use serde::{Serialize, de::DeserializeOwned};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;

const SERVICE_NAME: &str = "planning-api";

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub identity: Arc<IdentityResolver>,
    pub profiles: ProfileLoader,
    pub config: Arc<AppConfig>,
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
    let environment = state.config.environment.clone();
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(addr = %config.addr, %environment, "planning api listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().cloned())
    };
    CorsLayer::new()
        .allow_credentials(false)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/employees", get(list_employees).post(create_employee))
        .route("/assignments", get(list_assignments).post(create_assignment))
        .route("/assignments/{id}", patch(update_assignment))
        .route(
            "/unavailabilities",
            get(list_unavailabilities).post(create_unavailability),
        )
        .route("/alerts/coverage/daily", get(coverage_alerts))
        .route("/alerts/medical", get(medical_alerts))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

/// The authenticated caller's profile, resolved from the bearer credential.
pub struct Caller(pub UserProfile);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let raw = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthnError::MalformedCredential)?;
        let claim = state.identity.resolve(raw).await.inspect_err(|err| {
            warn!(error = %err, path = %parts.uri.path(), "credential rejected");
        })?;
        let profile = state
            .profiles
            .load(&claim.subject, claim.email)
            .await
            .inspect_err(|err| warn!(error = %err, subject = %claim.subject, "profile rejected"))?;
        Ok(Caller(profile))
    }
}

/// JSON body whose rejections read as `BadRequest`.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> ApiResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string whose rejections read as `BadRequest`.
pub struct Params<T>(pub T);

impl<S, T> FromRequestParts<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> ApiResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Serialize)]
struct RootResponse {
    service: &'static str,
    status: &'static str,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        service: SERVICE_NAME,
        status: "ok",
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = platform_db::ping(&state.pool).await;
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_employees(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<EmployeeView>>> {
    employees::list(&state.pool, &caller).await.map(Json)
}

async fn create_employee(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Payload(input): Payload<NewEmployee>,
) -> ApiResult<Json<Created>> {
    employees::create(&state.pool, &caller, input).await.map(Json)
}

async fn list_assignments(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Params(filter): Params<AssignmentFilter>,
) -> ApiResult<Json<Vec<AssignmentView>>> {
    assignments::list(&state.pool, &caller, filter).await.map(Json)
}

async fn create_assignment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Payload(input): Payload<NewAssignment>,
) -> ApiResult<Json<Created>> {
    assignments::create(&state.pool, &caller, input).await.map(Json)
}

async fn update_assignment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(raw_id): Path<String>,
    Payload(patch): Payload<AssignmentPatch>,
) -> ApiResult<Json<Updated>> {
    let id = Uuid::parse_str(&raw_id).map_err(|_| ApiError::bad_request("invalid assignment id"))?;
    assignments::update(&state.pool, &caller, id, patch)
        .await
        .map(Json)
}

async fn list_unavailabilities(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Params(filter): Params<UnavailabilityFilter>,
) -> ApiResult<Json<Vec<UnavailabilityView>>> {
    unavailabilities::list(&state.pool, &caller, filter)
        .await
        .map(Json)
}

async fn create_unavailability(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Payload(input): Payload<NewUnavailability>,
) -> ApiResult<Json<Created>> {
    unavailabilities::create(&state.pool, &caller, input)
        .await
        .map(Json)
}

async fn coverage_alerts(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Params(query): Params<CoverageQuery>,
) -> ApiResult<Json<Vec<CoverageAlertView>>> {
    alerts::coverage_daily(&state.pool, &caller, query)
        .await
        .map(Json)
}

async fn medical_alerts(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Params(query): Params<MedicalQuery>,
) -> ApiResult<Json<Vec<MedicalAlertView>>> {
    alerts::medical(&state.pool, &caller, query).await.map(Json)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
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
                warn!(error = %err, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}
