//! HTTP client tests against a mock catalog server.

#![allow(clippy::unwrap_used)]

use heritage_auth::{Anonymous, Identity, Role, SessionProvider, SharedSession, UserId};
use heritage_client::{ApiConfig, ApiError, EventApi, EventId, HttpEventApi, RegionId};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, session: Arc<dyn SessionProvider>) -> HttpEventApi {
    let config = ApiConfig::new(&format!("{}/api", server.uri())).unwrap();
    HttpEventApi::new(config, session)
}

fn signed_in() -> Arc<dyn SessionProvider> {
    Arc::new(SharedSession::signed_in(
        Identity::new(UserId(7), Role::Visitor),
        "token-7",
    ))
}

#[tokio::test]
async fn test_fetch_event_decodes_projection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "name": "Lantern Festival",
            "description": "Paper lanterns on the river",
            "image": "lantern.jpg",
            "date": "2025-02-12",
            "location": "Old Town",
            "regionId": 3,
            "attendeeCount": 18
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, Arc::new(Anonymous));
    let event = api.fetch_event(EventId(42)).await.unwrap();

    assert_eq!(event.name, "Lantern Festival");
    assert_eq!(event.region_id, Some(RegionId(3)));
    assert_eq!(event.attendee_count, 18);
}

#[tokio::test]
async fn test_missing_event_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = client_for(&server, Arc::new(Anonymous));
    assert_eq!(api.fetch_event(EventId(404)).await, Err(ApiError::NotFound));
}

#[tokio::test]
async fn test_ratings_keep_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/42/ratings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "user": {"username": "zoe"}, "rating": 2},
            {"id": 3, "user": {"username": "ana"}, "rating": 5, "comment": "Loved it"}
        ])))
        .mount(&server)
        .await;

    let api = client_for(&server, Arc::new(Anonymous));
    let ratings = api.fetch_ratings(EventId(42)).await.unwrap();

    let usernames: Vec<_> = ratings.iter().map(|r| r.user.username.as_str()).collect();
    assert_eq!(usernames, ["zoe", "ana"]);
}

#[tokio::test]
async fn test_server_error_is_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/42/ratings/average"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let api = client_for(&server, Arc::new(Anonymous));
    assert_eq!(
        api.fetch_average(EventId(42)).await,
        Err(ApiError::ServiceUnavailable("maintenance".to_string()))
    );
}

#[tokio::test]
async fn test_garbage_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/42/ratings/average"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let api = client_for(&server, Arc::new(Anonymous));
    assert!(matches!(
        api.fetch_average(EventId(42)).await,
        Err(ApiError::Decode(_))
    ));
}

#[tokio::test]
async fn test_user_status_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/7/events/42/rating-status"))
        .and(header("authorization", "Bearer token-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isJoined": true,
            "hasRated": true,
            "rating": {"rating": 4, "comment": "Nice"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, signed_in());
    let status = api.fetch_user_status(UserId(7), EventId(42)).await.unwrap();

    assert!(status.has_rated);
    assert_eq!(status.rating.unwrap().valid_score(), Some(4));
}

#[tokio::test]
async fn test_user_without_record_gets_default_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/7/events/42/rating-status"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let api = client_for(&server, signed_in());
    let status = api.fetch_user_status(UserId(7), EventId(42)).await.unwrap();

    assert!(!status.is_joined);
    assert!(!status.has_rated);
}

#[tokio::test]
async fn test_duplicate_join_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/42/participants"))
        .and(body_json(json!({"userId": 7})))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let api = client_for(&server, signed_in());
    assert_eq!(api.join(EventId(42), UserId(7)).await, Err(ApiError::Conflict));
}

#[tokio::test]
async fn test_leave_without_session_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/events/42/participants/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let api = client_for(&server, Arc::new(Anonymous));
    assert_eq!(api.leave(EventId(42)).await, Err(ApiError::Unauthorized));
}

#[tokio::test]
async fn test_submit_rating_posts_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/42/ratings"))
        .and(body_json(json!({"userId": 7, "rating": 3, "comment": "Great!"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, signed_in());
    api.submit_rating(EventId(42), UserId(7), 3, "Great!".to_string())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_out_of_range_score_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let api = client_for(&server, signed_in());
    for score in [0, 6] {
        let result = api
            .submit_rating(EventId(42), UserId(7), score, String::new())
            .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}

#[tokio::test]
async fn test_geography_bulk_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/regions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "name": "Riverlands", "provinceId": 1}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/provinces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "North"}
        ])))
        .mount(&server)
        .await;

    let api = client_for(&server, Arc::new(Anonymous));
    let (regions, provinces) = tokio::join!(api.fetch_regions(), api.fetch_provinces());

    assert_eq!(regions.unwrap()[0].province_id.0, 1);
    assert_eq!(provinces.unwrap()[0].name, "North");
}
