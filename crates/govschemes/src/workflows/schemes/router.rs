use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Profile, ProfileUpdate, Query, SchemeDraft, SchemeRecord, SchemeSummary, UserId};
use super::repository::{CatalogStore, NotificationDispatcher, ProfileStore};
use super::service::{SchemeFinderService, SchemeServiceError};

/// Router builder exposing search, catalog, and profile endpoints.
pub fn scheme_router<P, C, N>(service: Arc<SchemeFinderService<P, C, N>>) -> Router
where
    P: ProfileStore + 'static,
    C: CatalogStore + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route("/api/v1/schemes/search", post(search_handler::<P, C, N>))
        .route(
            "/api/v1/schemes",
            get(catalog_handler::<P, C, N>).post(add_scheme_handler::<P, C, N>),
        )
        .route("/api/v1/profiles", get(profiles_handler::<P, C, N>))
        .route(
            "/api/v1/profiles/:identity",
            get(profile_handler::<P, C, N>).put(save_profile_handler::<P, C, N>),
        )
        .with_state(service)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub identity: Option<UserId>,
    pub query: Query,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub resolved: Query,
    pub matches: Vec<SchemeSummary>,
    pub rejected_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub schemes: Vec<SchemeRecord>,
    pub rejected_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeAddedResponse {
    pub scheme: SchemeRecord,
    pub notified: usize,
    pub notification_failures: Vec<String>,
}

pub(crate) async fn search_handler<P, C, N>(
    State(service): State<Arc<SchemeFinderService<P, C, N>>>,
    axum::Json(request): axum::Json<SearchRequest>,
) -> Response
where
    P: ProfileStore + 'static,
    C: CatalogStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let identity = request.identity.filter(|identity| !identity.is_blank());
    let outcome = run_blocking(move || service.find(identity.as_ref(), &request.query)).await;
    match outcome {
        Ok(outcome) => {
            let body = SearchResponse {
                resolved: outcome.resolved,
                matches: outcome.matches.iter().map(SchemeRecord::summary).collect(),
                rejected_rows: outcome.rejected_rows,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn catalog_handler<P, C, N>(
    State(service): State<Arc<SchemeFinderService<P, C, N>>>,
) -> Response
where
    P: ProfileStore + 'static,
    C: CatalogStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match run_blocking(move || service.list_all()).await {
        Ok(load) => {
            let body = CatalogResponse {
                rejected_rows: load.rejected_count(),
                schemes: load.records,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn add_scheme_handler<P, C, N>(
    State(service): State<Arc<SchemeFinderService<P, C, N>>>,
    axum::Json(draft): axum::Json<SchemeDraft>,
) -> Response
where
    P: ProfileStore + 'static,
    C: CatalogStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match run_blocking(move || service.add_scheme(draft)).await {
        Ok(added) => {
            let body = SchemeAddedResponse {
                scheme: added.record,
                notified: added.notified,
                notification_failures: added.failures.iter().map(ToString::to_string).collect(),
            };
            (StatusCode::CREATED, axum::Json(body)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn profiles_handler<P, C, N>(
    State(service): State<Arc<SchemeFinderService<P, C, N>>>,
) -> Response
where
    P: ProfileStore + 'static,
    C: CatalogStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match run_blocking(move || service.profiles()).await {
        Ok(profiles) => (StatusCode::OK, axum::Json(profiles)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn profile_handler<P, C, N>(
    State(service): State<Arc<SchemeFinderService<P, C, N>>>,
    Path(identity): Path<String>,
) -> Response
where
    P: ProfileStore + 'static,
    C: CatalogStore + 'static,
    N: NotificationDispatcher + 'static,
{
    let identity = UserId::new(identity);
    let lookup = identity.clone();
    match run_blocking(move || service.profile(&lookup)).await {
        Ok(Some(profile)) => (StatusCode::OK, axum::Json(profile)).into_response(),
        Ok(None) => {
            let payload = json!({
                "error": format!("no profile stored for '{identity}'"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn save_profile_handler<P, C, N>(
    State(service): State<Arc<SchemeFinderService<P, C, N>>>,
    Path(identity): Path<String>,
    axum::Json(update): axum::Json<ProfileUpdate>,
) -> Response
where
    P: ProfileStore + 'static,
    C: CatalogStore + 'static,
    N: NotificationDispatcher + 'static,
{
    match run_blocking(move || service.save_profile(UserId::new(identity), update)).await {
        Ok(profile) => (StatusCode::OK, axum::Json::<Profile>(profile)).into_response(),
        Err(response) => response,
    }
}

/// Runs a service call on the blocking thread pool.
async fn run_blocking<T, F>(task: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, SchemeServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(error_response(err)),
        Err(join_error) => {
            tracing::error!(error = %join_error, "scheme request task failed");
            let payload = json!({ "error": "scheme request could not be completed" });
            Err((StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response())
        }
    }
}

fn error_response(err: SchemeServiceError) -> Response {
    let status = match err {
        SchemeServiceError::Collaborator(_) => StatusCode::SERVICE_UNAVAILABLE,
        SchemeServiceError::InvalidScheme(_) | SchemeServiceError::BlankIdentity => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
