//! Integration tests for the IP geolocation collaborator against a mock
//! HTTP server: coordinate extraction and the mapping of lookup failures
//! onto the location error causes.

use weatherdash_core::{GeoLocator, IpGeoLocator, LocationError};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn locator(server: &MockServer) -> IpGeoLocator {
    IpGeoLocator::with_base(server.uri()).expect("client should build")
}

#[tokio::test]
async fn successful_lookup_yields_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 17.38,
            "lon": 78.48,
        })))
        .mount(&server)
        .await;

    let (lat, lon) = locator(&server)
        .current_position()
        .await
        .expect("lookup should succeed");

    assert!((lat - 17.38).abs() < 1e-9);
    assert!((lon - 78.48).abs() < 1e-9);
}

#[tokio::test]
async fn failed_lookup_status_maps_to_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "private range",
        })))
        .mount(&server)
        .await;

    let err = locator(&server)
        .current_position()
        .await
        .expect_err("lookup should fail");

    assert_eq!(err, LocationError::Unavailable);
}

#[tokio::test]
async fn missing_coordinates_map_to_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 17.38,
        })))
        .mount(&server)
        .await;

    let err = locator(&server)
        .current_position()
        .await
        .expect_err("lookup should fail");

    assert_eq!(err, LocationError::Unavailable);
}

#[tokio::test]
async fn throttled_lookup_maps_to_denied() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = locator(&server)
        .current_position()
        .await
        .expect_err("lookup should fail");

    assert_eq!(err, LocationError::Denied);
}

#[tokio::test]
async fn server_error_maps_to_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = locator(&server)
        .current_position()
        .await
        .expect_err("lookup should fail");

    assert_eq!(err, LocationError::Unavailable);
}
