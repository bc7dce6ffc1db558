//! Integration tests for the HTTP facade.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mqtt_weather_core::config::{ProviderSettings, ServerSettings};
use mqtt_weather_core::provider::openweather::OpenWeatherClient;
use mqtt_weather_core::query::NO_DATA_PLACEHOLDER;
use mqtt_weather_core::server::{self, AppState};
use mqtt_weather_core::{BrokerError, LatestValueCache, PublishGateway, Publisher};

const TOPIC: &str = "test/weather";

const PARIS: &str = r#"{"city":{"name":"Paris"},"list":[{"dt_txt":"2024-01-01 12:00:00","main":{"temp":5.2,"humidity":80},"weather":[{"description":"clear sky"}]}]}"#;

#[derive(Debug, Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<(String, Bytes)>>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), BrokerError> {
        self.sent.lock().unwrap().push((topic.to_string(), payload));
        Ok(())
    }
}

struct TestApp {
    router: Router,
    publisher: Arc<RecordingPublisher>,
    cache: LatestValueCache,
}

fn build_test_app(provider_url: String, server_settings: ServerSettings) -> TestApp {
    let provider = Arc::new(OpenWeatherClient::new(ProviderSettings {
        api_key: "KEY".into(),
        base_url: provider_url,
        ..ProviderSettings::default()
    }));
    let publisher = Arc::new(RecordingPublisher::default());
    let cache = LatestValueCache::new();

    let state = AppState {
        gateway: Arc::new(PublishGateway::new(provider, publisher.clone(), TOPIC, "jijel")),
        cache: cache.clone(),
    };

    TestApp {
        router: server::router(state, &server_settings),
        publisher,
        cache,
    }
}

async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    app.router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn content_type(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
}

// ---------------------------------------------------------------------------
// GET /api/weather
// ---------------------------------------------------------------------------

#[tokio::test]
async fn weather_returns_forecast_and_publishes_it_once() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "paris"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PARIS))
        .expect(1)
        .mount(&provider)
        .await;
    let app = build_test_app(provider.uri(), ServerSettings::default());

    let response = get(&app, "/api/weather?city=paris").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/json");
    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let expected: serde_json::Value = serde_json::from_str(PARIS).unwrap();
    assert_eq!(json, expected);

    let sent = app.publisher.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, TOPIC);
    assert_eq!(sent[0].1, body);
}

#[tokio::test]
async fn weather_without_city_uses_default() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "jijel"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"city":{"name":"Jijel"},"list":[]}"#),
        )
        .expect(2)
        .mount(&provider)
        .await;
    let app = build_test_app(provider.uri(), ServerSettings::default());

    assert_eq!(get(&app, "/api/weather").await.status(), StatusCode::OK);
    assert_eq!(get(&app, "/api/weather?city=").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn weather_decode_failure_is_500_with_text_and_no_publish() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&provider)
        .await;
    let app = build_test_app(provider.uri(), ServerSettings::default());

    let response = get(&app, "/api/weather?city=paris").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type(&response).starts_with("text/plain"));
    let body = body_bytes(response).await;
    assert!(String::from_utf8_lossy(&body).contains("failed to decode forecast response"));
    assert!(app.publisher.sent.lock().unwrap().is_empty());
    assert!(!app.cache.is_present());
}

// ---------------------------------------------------------------------------
// GET /data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn data_before_any_message_returns_placeholder() {
    let app = build_test_app("http://127.0.0.1:9".into(), ServerSettings::default());

    let response = get(&app, "/data").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/json");
    assert_eq!(body_bytes(response).await, NO_DATA_PLACEHOLDER.as_bytes());
}

#[tokio::test]
async fn data_returns_last_cached_payload_verbatim() {
    let app = build_test_app("http://127.0.0.1:9".into(), ServerSettings::default());
    app.cache.set(Bytes::from_static(PARIS.as_bytes()));

    let response = get(&app, "/data").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, PARIS.as_bytes());
}

#[tokio::test]
async fn weather_does_not_write_the_cache_directly() {
    let provider = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PARIS))
        .mount(&provider)
        .await;
    let app = build_test_app(provider.uri(), ServerSettings::default());

    assert_eq!(get(&app, "/api/weather?city=paris").await.status(), StatusCode::OK);

    // Only the topic listener fills the cache.
    let response = get(&app, "/data").await;
    assert_eq!(body_bytes(response).await, NO_DATA_PLACEHOLDER.as_bytes());
}

// ---------------------------------------------------------------------------
// Static files
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unmatched_paths_serve_static_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>weather</h1>").unwrap();
    let settings = ServerSettings {
        static_dir: dir.path().to_path_buf(),
        ..ServerSettings::default()
    };
    let app = build_test_app("http://127.0.0.1:9".into(), settings);

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, "<h1>weather</h1>".as_bytes());

    let missing = get(&app, "/missing.js").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
