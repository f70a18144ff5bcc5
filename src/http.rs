use crate::handler::BaseHandler;
use crate::observability::{health, metrics as prom_metrics};
use crate::store::StoreError;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        MatchedPath, Path, Query, Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// REST handler over a KvStore
#[derive(Clone)]
pub struct KvHttpHandler {
    handler: Arc<BaseHandler>,
}

impl KvHttpHandler {
    pub fn new(handler: BaseHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Create the router for the key/value API
    ///
    /// `_health` and `_metrics` are reserved: `GET` on them serves the health
    /// and metrics endpoints, so they cannot be used as keys.
    pub fn router(self) -> Router {
        Router::new()
            .route("/_health", get(health_check))
            .route("/_metrics", get(metrics_endpoint))
            .route("/bulk", put(bulk_update))
            .route("/:key", get(get_key).post(set_key).delete(delete_key))
            .route_layer(middleware::from_fn(track_requests))
            .with_state(self.handler)
    }
}

#[derive(Debug)]
enum HttpError {
    NotFound(String),
    InsufficientStorage(String),
    BadRequest(String),
    Internal(String),
}

impl From<StoreError> for HttpError {
    fn from(e: StoreError) -> Self {
        let msg = e.to_string();
        match e {
            StoreError::NotFound(_) => HttpError::NotFound(msg),
            StoreError::MaxCapacity { .. } => HttpError::InsufficientStorage(msg),
            StoreError::Cancelled | StoreError::Closed => HttpError::Internal(msg),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            HttpError::InsufficientStorage(msg) => {
                (StatusCode::INSUFFICIENT_STORAGE, msg).into_response()
            }
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            HttpError::Internal(msg) => {
                tracing::warn!("store call failed: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ValueForm {
    value: Option<String>,
}

/// One item of a bulk update body
#[derive(Debug, Deserialize)]
pub struct KeyValue {
    #[serde(rename = "Key", alias = "key")]
    pub key: String,
    #[serde(rename = "Value", alias = "value")]
    pub value: String,
}

/// Counts requests by method, route and status
async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    prom_metrics::increment_http_request(&method, &endpoint, response.status().as_str());
    response
}

/// DELETE /{key}
async fn delete_key(
    State(handler): State<Arc<BaseHandler>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let scope = handler.scope();
    handler.store.delete(&scope.cancel, &key).await?;
    Ok(StatusCode::OK)
}

/// GET /{key}
async fn get_key(
    State(handler): State<Arc<BaseHandler>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, HttpError> {
    let scope = handler.scope();
    let value = handler.store.get(&scope.cancel, &key).await?;
    Ok((StatusCode::OK, value))
}

/// POST /{key} with a `value` form field (body or query string)
async fn set_key(
    State(handler): State<Arc<BaseHandler>>,
    Path(key): Path<String>,
    Query(query): Query<ValueForm>,
    form: Result<Form<ValueForm>, FormRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let body_value = form.ok().and_then(|Form(f)| f.value);
    let value = body_value
        .or(query.value)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HttpError::BadRequest("value is required".to_string()))?;

    let scope = handler.scope();
    handler.store.set(&scope.cancel, &key, value).await?;
    Ok(StatusCode::CREATED)
}

/// PUT /bulk with a JSON array of `{"Key": .., "Value": ..}`
///
/// Items are updated one by one; keys that do not exist are reported together
/// and items already updated stay updated.
async fn bulk_update(
    State(handler): State<Arc<BaseHandler>>,
    payload: Result<Json<Vec<KeyValue>>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(items) = payload.map_err(|e| HttpError::BadRequest(e.body_text()))?;

    let scope = handler.scope();
    let mut not_found = Vec::new();
    for item in items {
        match handler.store.update(&scope.cancel, &item.key, item.value).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => not_found.push(item.key),
            Err(e) => return Err(e.into()),
        }
    }

    if !not_found.is_empty() {
        return Err(HttpError::NotFound(format!(
            "keys not found: [{}]",
            not_found.join(" ")
        )));
    }
    Ok(StatusCode::OK)
}

/// GET /_health
async fn health_check(State(handler): State<Arc<BaseHandler>>) -> impl IntoResponse {
    let status = health::get_health_status(&handler.store).await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// GET /_metrics
async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        prom_metrics::gather_metrics(),
    )
}
