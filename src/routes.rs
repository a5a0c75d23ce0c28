use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::dashboard::load_config;
use crate::error::LoadError;
use crate::fetcher::Fetcher;
use crate::render::Renderer;

pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub renderer: Renderer,
    pub config_url: String,
}

impl AppState {
    pub fn new(fetcher: Arc<Fetcher>, config_url: impl Into<String>) -> Self {
        Self {
            renderer: Renderer::new(fetcher.clone()),
            fetcher,
            config_url: config_url.into(),
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/demo", get(demo))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Custom error type
pub enum AppError {
    ConfigUnavailable(LoadError),
    Render(askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::ConfigUnavailable(err) => {
                error!("Failed to load configuration: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load configuration",
                )
                    .into_response()
            }
            AppError::Render(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::ConfigUnavailable(err)
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        AppError::Render(err)
    }
}

// Route handlers

/// Only the bare `/demo` path is served; any query string makes it a 404.
pub async fn demo(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    if query.is_some() {
        return Ok(not_found_response());
    }
    let config = load_config(&state.fetcher, &state.config_url).await?;
    let html = state.renderer.render(Some(&config)).await?;
    Ok(Html(html).into_response())
}

pub async fn not_found() -> Response {
    not_found_response()
}

fn not_found_response() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FetchCache, NoCache, TtlCache};
    use crate::config::DEFAULT_USER_AGENT;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CONFIG: &str = r#"{
        "activeDashboardId": "d1",
        "dashboards": [{"id": "d1", "name": "Route Dashboard", "widgets": []}]
    }"#;

    fn create_test_app(config_url: String, cache: Arc<dyn FetchCache>) -> Router {
        let fetcher =
            Arc::new(Fetcher::new(cache, DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap());
        app(Arc::new(AppState::new(fetcher, config_url)))
    }

    async fn send(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    async fn serve_config(server: &MockServer, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/config.json"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    mod demo_tests {
        use super::*;

        #[tokio::test]
        async fn test_demo_returns_html() {
            let server = MockServer::start().await;
            serve_config(&server, 200, CONFIG).await;
            let app = create_test_app(format!("{}/config.json", server.uri()), Arc::new(NoCache));

            let response = send(app, "/demo").await;

            assert_eq!(response.status(), StatusCode::OK);
            let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
            assert!(content_type.starts_with("text/html"));
            assert!(body_string(response).await.contains("Route Dashboard"));
        }

        #[tokio::test]
        async fn test_demo_unknown_dashboard_is_still_ok() {
            let server = MockServer::start().await;
            serve_config(&server, 200, r#"{"activeDashboardId": "x", "dashboards": []}"#).await;
            let app = create_test_app(format!("{}/config.json", server.uri()), Arc::new(NoCache));

            let response = send(app, "/demo").await;

            assert_eq!(response.status(), StatusCode::OK);
            assert!(body_string(response)
                .await
                .contains("Active dashboard not found"));
        }

        #[tokio::test]
        async fn test_demo_upstream_error_is_500() {
            let server = MockServer::start().await;
            serve_config(&server, 500, "").await;
            let app = create_test_app(format!("{}/config.json", server.uri()), Arc::new(NoCache));

            let response = send(app, "/demo").await;

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_string(response).await, "Failed to load configuration");
        }

        #[tokio::test]
        async fn test_demo_malformed_config_is_500() {
            let server = MockServer::start().await;
            serve_config(&server, 200, "{ definitely not json").await;
            let app = create_test_app(format!("{}/config.json", server.uri()), Arc::new(NoCache));

            let response = send(app, "/demo").await;

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        #[tokio::test]
        async fn test_demo_empty_config_object_is_500() {
            let server = MockServer::start().await;
            serve_config(&server, 200, "{}").await;
            let app = create_test_app(format!("{}/config.json", server.uri()), Arc::new(NoCache));

            let response = send(app, "/demo").await;

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_string(response).await, "Failed to load configuration");
        }

        #[tokio::test]
        async fn test_demo_invalid_config_url_is_500() {
            let app = create_test_app("file:///etc/config.json".to_string(), Arc::new(NoCache));

            let response = send(app, "/demo").await;

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        #[tokio::test]
        async fn test_config_bytes_are_cached_between_requests() {
            let server = MockServer::start().await;
            serve_config(&server, 200, CONFIG).await;
            let app = create_test_app(
                format!("{}/config.json", server.uri()),
                Arc::new(TtlCache::new(Duration::from_secs(300))),
            );

            for _ in 0..3 {
                let response = send(app.clone(), "/demo").await;
                assert_eq!(response.status(), StatusCode::OK);
            }

            assert_eq!(server.received_requests().await.unwrap().len(), 1);
        }
    }

    mod not_found_tests {
        use super::*;

        #[tokio::test]
        async fn test_unknown_paths_are_404() {
            let app = create_test_app("http://127.0.0.1:1/config.json".to_string(), Arc::new(NoCache));

            for uri in ["/", "/demo/", "/health", "/demo/extra"] {
                let response = send(app.clone(), uri).await;
                assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {}", uri);
            }
        }

        #[tokio::test]
        async fn test_demo_with_query_string_is_404() {
            let server = MockServer::start().await;
            serve_config(&server, 200, CONFIG).await;
            let app = create_test_app(format!("{}/config.json", server.uri()), Arc::new(NoCache));

            for uri in ["/demo?x=1", "/demo?"] {
                let response = send(app.clone(), uri).await;
                assert_eq!(response.status(), StatusCode::NOT_FOUND, "uri {}", uri);
                assert_eq!(body_string(response).await, "Not Found");
            }

            assert!(server.received_requests().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_404_body() {
            let app = create_test_app("http://127.0.0.1:1/config.json".to_string(), Arc::new(NoCache));

            let response = send(app, "/nope").await;

            assert_eq!(body_string(response).await, "Not Found");
        }
    }
}
