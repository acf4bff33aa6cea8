use super::*;

use std::collections::HashMap;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

fn sf_start() -> Coordinate {
    Coordinate::new(37.7749, -122.4194)
}

fn sf_end() -> Coordinate {
    Coordinate::new(37.7765, -122.418)
}

fn response(value: serde_json::Value) -> OsrmResponse {
    serde_json::from_value(value).expect("response")
}

#[test]
fn request_url_puts_longitude_first() {
    let source = OsrmRouteSource::new(
        "https://router.project-osrm.org",
        sf_start(),
        sf_end(),
        TravelMode::Walking,
    )
    .expect("source");

    assert_eq!(
        source.request_url().expect("url").as_str(),
        "https://router.project-osrm.org/route/v1/walking/-122.4194,37.7749;-122.418,37.7765?overview=full&geometries=geojson"
    );
}

#[test]
fn request_url_keeps_base_path_prefix() {
    let source = OsrmRouteSource::new(
        "http://localhost:5000/osrm/",
        sf_start(),
        sf_end(),
        TravelMode::Driving,
    )
    .expect("source");

    assert!(source
        .request_url()
        .expect("url")
        .as_str()
        .starts_with("http://localhost:5000/osrm/route/v1/driving/"));
}

#[test]
fn rejects_unparseable_base_url() {
    assert!(matches!(
        OsrmRouteSource::new("not a url", sf_start(), sf_end(), TravelMode::Driving),
        Err(RouteError::Http(_))
    ));
}

#[test]
fn converts_geojson_positions_and_appends_destination() {
    let route = route_from_response(
        response(json!({
            "code": "Ok",
            "routes": [{ "geometry": { "coordinates": [[-122.4194, 37.7749], [-122.419, 37.7755]] } }]
        })),
        sf_end(),
    )
    .expect("route");

    assert_eq!(
        route,
        vec![sf_start(), Coordinate::new(37.7755, -122.419), sf_end()]
    );
}

#[test]
fn does_not_duplicate_destination_already_present() {
    let route = route_from_response(
        response(json!({
            "routes": [{ "geometry": { "coordinates": [[-122.4194, 37.7749], [-122.418, 37.7765]] } }]
        })),
        sf_end(),
    )
    .expect("route");

    assert_eq!(route, vec![sf_start(), sf_end()]);
}

#[test]
fn maps_missing_routes_and_geometry_to_errors() {
    assert_eq!(
        route_from_response(response(json!({ "routes": [] })), sf_end()),
        Err(RouteError::NoRoute)
    );
    assert_eq!(
        route_from_response(response(json!({ "routes": [{}] })), sf_end()),
        Err(RouteError::InvalidGeometry)
    );
    assert_eq!(
        route_from_response(
            response(json!({ "routes": [{ "geometry": { "coordinates": [] } }] })),
            sf_end()
        ),
        Err(RouteError::Empty)
    );
}

#[tokio::test]
async fn fetches_route_from_server() {
    let router = Router::new().route(
        "/route/v1/:mode/:coordinates",
        get(
            |Path((mode, coordinates)): Path<(String, String)>,
             Query(query): Query<HashMap<String, String>>| async move {
                assert_eq!(mode, "cycling");
                assert_eq!(coordinates, "-122.4194,37.7749;-122.418,37.7765");
                assert_eq!(query.get("geometries").map(String::as_str), Some("geojson"));
                Json(json!({
                    "code": "Ok",
                    "routes": [{ "geometry": { "coordinates": [[-122.4194, 37.7749], [-122.4185, 37.776]] } }]
                }))
            },
        ),
    );
    let base_url = serve(router).await;

    let source =
        OsrmRouteSource::new(&base_url, sf_start(), sf_end(), TravelMode::Cycling).expect("source");
    let route = source.load().await.expect("route");

    assert_eq!(
        route,
        vec![sf_start(), Coordinate::new(37.776, -122.4185), sf_end()]
    );
}

#[tokio::test]
async fn no_route_status_maps_to_no_route() {
    let router = Router::new().route(
        "/route/v1/:mode/:coordinates",
        get(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "code": "NoRoute", "message": "Impossible route between points" })),
            )
        }),
    );
    let base_url = serve(router).await;

    let source =
        OsrmRouteSource::new(&base_url, sf_start(), sf_end(), TravelMode::Driving).expect("source");

    assert_eq!(source.load().await, Err(RouteError::NoRoute));
}

#[tokio::test]
async fn server_error_maps_to_http_error() {
    let router = Router::new().route(
        "/route/v1/:mode/:coordinates",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
    );
    let base_url = serve(router).await;

    let source =
        OsrmRouteSource::new(&base_url, sf_start(), sf_end(), TravelMode::Driving).expect("source");

    match source.load().await {
        Err(RouteError::Http(message)) => {
            assert!(message.contains("503"), "{message}");
            assert!(message.contains("overloaded"), "{message}");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
