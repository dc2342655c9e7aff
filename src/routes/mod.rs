//! HTTP API: core CRUD endpoints and the AI advisor endpoint.

pub mod ai;
pub mod crud;

use crate::ai::{Advisor, AdvisorError};
use crate::db::{Database, StoreError};
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Browser origins of the web frontend during development
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

/// Shared, cheaply cloneable application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub advisor: Arc<Advisor>,
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(crud::read_root))
        .route("/health", get(crud::health))
        .route("/users/", post(crud::create_user))
        .route("/transactions/", post(crud::create_transaction))
        .route("/transactions/:user_id", get(crud::read_transactions))
        .route("/debts/", post(crud::create_debt))
        .route("/analyze", post(ai::analyze))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Credentialed CORS for an explicit list of origins. Requested methods and
/// headers are mirrored back. Entries that are not valid origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) if origin != "*" => Some(value),
            _ => {
                log::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Error body shared by all endpoints
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    Advisor(AdvisorError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<AdvisorError> for ApiError {
    fn from(err: AdvisorError) -> Self {
        Self::Advisor(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Store(err) => {
                let status = match err {
                    StoreError::Conflict(_) => StatusCode::BAD_REQUEST,
                    StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    StoreError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => {
                        log::error!("Storage error: {}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (
                    status,
                    ErrorBody {
                        detail: err.to_string(),
                        kind: None,
                    },
                )
            }
            // Every pipeline failure is a 500; the origin travels in `kind`.
            Self::Advisor(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    detail: err.to_string(),
                    kind: Some(err.kind()),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::advisor::tests::FakeGenerator;
    use crate::ai::AdvisorOptions;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    fn app() -> Router {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let advisor = Advisor::new(
            db.clone(),
            Arc::new(FakeGenerator::replying("ok")),
            AdvisorOptions::default(),
        );
        let origins: Vec<String> = DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect();
        router(
            AppState {
                db,
                advisor: Arc::new(advisor),
            },
            &origins,
        )
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/analyze")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_preflight_from_frontend_origin() {
        for origin in DEFAULT_CORS_ORIGINS {
            let response = app().oneshot(preflight(origin)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let headers = response.headers();
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], *origin);
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");
        }
    }

    #[tokio::test]
    async fn test_preflight_from_unknown_origin_is_not_allowed() {
        let response = app().oneshot(preflight("http://evil.example")).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn test_invalid_origins_are_skipped() {
        // Must not panic on wildcards or header-invalid values
        let _ = cors_layer(&["*".to_string(), "bad\norigin".to_string(), " ".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_input_is_unprocessable() {
        let response = ApiError::from(StoreError::Invalid("amount 9e16 is out of range".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "amount 9e16 is out of range");
    }
}
