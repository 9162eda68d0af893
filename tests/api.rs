use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, StatusCode},
    routing::get,
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weather_gateway::app;
use weather_gateway::rate_limit::AdmissionGateway;
use weather_gateway::relay::{HttpConfig, Relay, ReqwestTransport};
use weather_gateway::state::AppState;
use weather_gateway::weather::WeatherApi;

const API_KEY: &str = "test-key";

fn state(api_url: &str, limit: u32) -> Arc<AppState> {
    let transport = ReqwestTransport::new(HttpConfig {
        connect_timeout: Duration::from_secs(1),
        request_timeout: Duration::from_secs(5),
        ..HttpConfig::default()
    })
    .unwrap();

    Arc::new(AppState {
        gateway: Arc::new(AdmissionGateway::new(limit, Duration::from_secs(60))),
        relay: Relay::new(Arc::new(transport)),
        weather: WeatherApi::new(api_url, Some(API_KEY.to_string())),
        environment: "test".to_string(),
        trust_proxy: false,
    })
}

fn gateway(api_url: &str, limit: u32) -> Router {
    app::router(state(api_url, limit), None)
}

fn get_from(uri: &str, peer: &str) -> Request<Body> {
    let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
    request
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn call(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, get_from(uri, "127.0.0.1:40000")).await
}

fn london() -> Value {
    json!({
        "name": "London",
        "sys": {"country": "GB"},
        "main": {"temp": 12.4, "humidity": 81}
    })
}

#[tokio::test]
async fn health_reports_status_and_environment() {
    let app = gateway("http://127.0.0.1:9", 60);

    for uri in ["/health", "/api/health"] {
        let (status, body) = call(&app, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["environment"], "test");

        // millisecond precision, UTC with a Z suffix
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(timestamp.ends_with('Z'), "{}", timestamp);
        assert_eq!(timestamp.len(), "2026-01-01T00:00:00.000Z".len());
    }
}

#[tokio::test]
async fn wrong_method_on_known_route_is_not_found() {
    let app = gateway("http://127.0.0.1:9", 60);

    for uri in [
        "/weather/current?city=London",
        "/api/weather/forecast?city=London",
        "/health",
        "/metrics",
    ] {
        let mut request = get_from(uri, "127.0.0.1:40000");
        *request.method_mut() = Method::POST;

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, json!({"error": "Endpoint not found"}));
    }
}

#[tokio::test]
async fn missing_city_is_a_bad_request() {
    let app = gateway("http://127.0.0.1:9", 60);

    let (status, body) = call(&app, "/weather/current").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "City parameter is required"}));

    let (status, body) = call(&app, "/weather/forecast?city=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "City parameter is required"}));
}

#[tokio::test]
async fn invalid_units_are_a_bad_request() {
    let app = gateway("http://127.0.0.1:9", 60);

    let (status, body) = call(&app, "/weather/current?city=London&units=kelvin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Units must be one of metric, imperial or standard"})
    );
}

#[tokio::test]
async fn current_weather_is_relayed_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "London"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(london()))
        .expect(2)
        .mount(&server)
        .await;

    let app = gateway(&server.uri(), 60);

    let (status, body) = call(&app, "/weather/current?city=London").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, london());

    let (status, _) = call(&app, "/api/weather/current?city=London&units=metric").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn sixty_first_request_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london()))
        .expect(60)
        .mount(&server)
        .await;

    let app = gateway(&server.uri(), 60);

    for i in 1..=60 {
        let (status, _) = call(&app, "/weather/current?city=London").await;
        assert_eq!(status, StatusCode::OK, "request {} was not admitted", i);
    }

    let (status, body) = call(&app, "/weather/current?city=London").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({"error": "Too many requests. Please try again later."})
    );
}

#[tokio::test]
async fn invalid_requests_do_not_use_up_the_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"list": []})))
        .expect(1)
        .mount(&server)
        .await;

    let app = gateway(&server.uri(), 1);

    let (status, _) = call(&app, "/weather/forecast").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, "/weather/forecast?city=Oslo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"list": []}));
}

#[tokio::test]
async fn clients_are_limited_separately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london()))
        .mount(&server)
        .await;

    let app = gateway(&server.uri(), 1);
    let uri = "/weather/current?city=London";

    let (status, _) = send(&app, get_from(uri, "10.0.0.1:5000")).await;
    assert_eq!(status, StatusCode::OK);

    // same address, different port: same client
    let (status, _) = send(&app, get_from(uri, "10.0.0.1:5001")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = send(&app, get_from(uri, "10.0.0.2:5000")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn downstream_error_status_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&server)
        .await;

    let app = gateway(&server.uri(), 60);

    let (status, body) = call(&app, "/weather/current?city=Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "city not found"}));
}

#[tokio::test]
async fn forecast_failure_without_message_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = gateway(&server.uri(), 60);

    let (status, body) = call(&app, "/weather/forecast?city=Oslo").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "Failed to fetch forecast data"}));
}

#[tokio::test]
async fn coordinates_are_validated_and_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(london()))
        .expect(1)
        .mount(&server)
        .await;

    let app = gateway(&server.uri(), 60);

    let (status, body) = call(&app, "/weather/coordinates?lat=51.5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Latitude and longitude parameters are required"})
    );

    let (status, body) = call(&app, "/weather/coordinates?lat=abc&lon=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Latitude and longitude must be numbers"}));

    let (status, body) =
        call(&app, "/weather/coordinates?lat=51.5&lon=-0.12&units=imperial").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, london());
}

#[tokio::test]
async fn unreachable_downstream_is_a_bad_gateway() {
    let app = gateway("http://127.0.0.1:9", 60);

    let (status, body) = call(&app, "/weather/current?city=London").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"error": "internal error"}));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = gateway("http://127.0.0.1:9", 60);

    for uri in ["/nope", "/api/nope", "/weather"] {
        let (status, body) = call(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, json!({"error": "Endpoint not found"}));
    }
}

async fn boom() -> &'static str {
    panic!("lost the database")
}

#[tokio::test]
async fn panics_become_generic_server_errors() {
    let app = app::apply_layers(
        Router::new().route("/boom", get(boom)),
    );

    let (status, body) = call(&app, "/boom").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Something went wrong!"}));
}

#[tokio::test]
async fn metrics_are_exposed() {
    let app = gateway("http://127.0.0.1:9", 60);
    call(&app, "/weather/current").await;

    let response = app
        .clone()
        .oneshot(get_from("/metrics", "127.0.0.1:40000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("weather_requests_total"));
}

#[tokio::test]
async fn static_client_is_served_with_json_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Weather</h1>").unwrap();

    let app = app::router(state("http://127.0.0.1:9", 60), Some(dir.path()));

    let response = app
        .clone()
        .oneshot(get_from("/", "127.0.0.1:40000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"<h1>Weather</h1>");

    let (status, body) = call(&app, "/missing.js").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Endpoint not found"}));

    let mut request = get_from("/index.html", "127.0.0.1:40000");
    *request.method_mut() = Method::POST;
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Endpoint not found"}));

    // API routes still win over the static directory
    let (status, _) = call(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
}
