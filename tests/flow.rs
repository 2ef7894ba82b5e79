use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use holiday_counter::cli::{Args, Endpoints};
use holiday_counter::oauth::Credentials;
use holiday_counter::server::{router, AppState};
use holiday_counter::tags::TagRule;
use serde_json::json;
use tokio::time::Duration;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{body_string_contains, header as header_matcher, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn args(mock_server: &MockServer) -> Args {
    Args {
        address: ([127, 0, 0, 1], 0).into(),
        redirect_uri: Url::parse("http://localhost:3000/oauthcallback").unwrap(),
        session_ttl: Duration::from_secs(60),
        session_capacity: 64,
        max_pages: 5,
        request_timeout: Duration::from_secs(5),
        allowance: 26,
        tag_rule: TagRule::Delimited,
        credentials: Credentials {
            client_id: "client-id".to_owned(),
            client_secret: "client-secret".to_owned(),
        },
        endpoints: Endpoints {
            authorize: Url::parse("https://accounts.example.com/o/oauth2/auth").unwrap(),
            token: Url::parse(&format!("{}/token", mock_server.uri())).unwrap(),
            calendar_api: Url::parse(&mock_server.uri()).unwrap(),
        },
    }
}

fn app(args: &Args) -> Router {
    router(AppState::in_memory(args).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_owned());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, location, String::from_utf8(body.to_vec()).unwrap())
}

/// Follows the login redirect and returns the state token handed to the provider.
async fn login(app: &Router, start: &str, end: &str) -> String {
    let (status, location, _) = get(app, &format!("/{start}/{end}")).await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);

    let location = Url::parse(&location.unwrap()).unwrap();
    assert_eq!(location.host_str(), Some("accounts.example.com"));

    location
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

async fn mock_token(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=auth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-token",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .mount(mock_server)
        .await;
}

async fn mock_events(mock_server: &MockServer, items: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header_matcher("Authorization", "Bearer access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
        .mount(mock_server)
        .await;
}

fn all_day(summary: &str, start: &str, end: &str) -> serde_json::Value {
    json!({
        "id": summary,
        "summary": summary,
        "start": { "date": start },
        "end": { "date": end }
    })
}

#[tokio::test]
async fn computes_remaining_holiday_days() {
    let mock_server = MockServer::start().await;
    mock_token(&mock_server).await;
    mock_events(
        &mock_server,
        json!([
            all_day("#holiday# ski trip", "2024-01-10", "2024-01-17"),
            all_day("lunch with team", "2024-01-20", "2024-01-21"),
        ]),
    )
    .await;

    let app = app(&args(&mock_server));
    let state = login(&app, "2024-Jan-01", "2024-Feb-01").await;

    let (status, _, body) = get(&app, &format!("/oauthcallback?state={state}&code=auth-code")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "19");
}

#[tokio::test]
async fn urlop_and_timed_events() {
    let mock_server = MockServer::start().await;
    mock_token(&mock_server).await;
    mock_events(
        &mock_server,
        json!([
            all_day("Wakacje #urlop#", "2024-07-01", "2024-07-11"),
            {
                "id": "timed",
                "summary": "#holiday# long lunch",
                "start": { "dateTime": "2024-07-15T12:00:00+02:00" },
                "end": { "dateTime": "2024-07-20T12:00:00+02:00" }
            },
            all_day("#conference#", "2024-07-22", "2024-07-25"),
        ]),
    )
    .await;

    let app = app(&args(&mock_server));
    let state = login(&app, "2024-Jul-01", "2024-Aug-01").await;

    let (status, _, body) = get(&app, &format!("/oauthcallback?state={state}&code=auth-code")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "16");
}

#[tokio::test]
async fn sums_holidays_across_pages() {
    let mock_server = MockServer::start().await;
    mock_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [all_day("#urlop# Bali", "2024-08-05", "2024-08-15")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [all_day("#holiday# ski trip", "2024-02-10", "2024-02-17")],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = app(&args(&mock_server));
    let state = login(&app, "2024-Jan-01", "2024-Dec-31").await;

    let (status, _, body) = get(&app, &format!("/oauthcallback?state={state}&code=auth-code")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "9");
}

#[tokio::test]
async fn failure_on_a_later_page() {
    let mock_server = MockServer::start().await;
    mock_token(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Backend Error"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [all_day("#holiday#", "2024-02-10", "2024-02-17")],
            "nextPageToken": "page-2"
        })))
        .mount(&mock_server)
        .await;

    let app = app(&args(&mock_server));
    let state = login(&app, "2024-Jan-01", "2024-Dec-31").await;

    let (status, _, body) = get(&app, &format!("/oauthcallback?state={state}&code=auth-code")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.starts_with("Couldn't fetch calendar events"));
}

#[tokio::test]
async fn uses_configured_allowance() {
    let mock_server = MockServer::start().await;
    mock_token(&mock_server).await;
    mock_events(
        &mock_server,
        json!([all_day("#holiday#", "2024-03-04", "2024-03-09")]),
    )
    .await;

    let mut args = args(&mock_server);
    args.allowance = 2;
    let app = app(&args);
    let state = login(&app, "2024-Mar-01", "2024-Apr-01").await;

    let (_, _, body) = get(&app, &format!("/oauthcallback?state={state}&code=auth-code")).await;

    assert_eq!(body, "-3");
}

#[tokio::test]
async fn callback_follows_the_redirect_uri() {
    let mock_server = MockServer::start().await;
    mock_token(&mock_server).await;
    mock_events(
        &mock_server,
        json!([all_day("#holiday#", "2024-01-10", "2024-01-12")]),
    )
    .await;

    let mut args = args(&mock_server);
    args.redirect_uri = Url::parse("http://holidays.example.com/callback").unwrap();
    let app = app(&args);
    let state = login(&app, "2024-Jan-01", "2024-Feb-01").await;

    let (status, _, _) = get(&app, &format!("/oauthcallback?state={state}&code=auth-code")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = get(&app, &format!("/callback?state={state}&code=auth-code")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "24");
}

#[tokio::test]
async fn inverted_event_dates() {
    let mock_server = MockServer::start().await;
    mock_token(&mock_server).await;
    mock_events(
        &mock_server,
        json!([all_day("#holiday#", "2024-01-17", "2024-01-10")]),
    )
    .await;

    let app = app(&args(&mock_server));
    let state = login(&app, "2024-Jan-01", "2024-Feb-01").await;

    let (status, _, body) = get(&app, &format!("/oauthcallback?state={state}&code=auth-code")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("is after end date"));
}

#[tokio::test]
async fn malformed_path_dates() {
    let mock_server = MockServer::start().await;
    let app = app(&args(&mock_server));

    let (status, location, body) = get(&app, "/2024-01-01/2024-Feb-01").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(location, None);
    assert!(body.contains("2024-01-01"));
}

#[tokio::test]
async fn unknown_state() {
    let mock_server = MockServer::start().await;
    let app = app(&args(&mock_server));

    let (status, _, body) = get(&app, "/oauthcallback?state=forged&code=auth-code").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Your OAuth2 state has not been found.");
}

#[tokio::test]
async fn state_is_single_use() {
    let mock_server = MockServer::start().await;
    mock_token(&mock_server).await;
    mock_events(&mock_server, json!([])).await;

    let app = app(&args(&mock_server));
    let state = login(&app, "2024-Jan-01", "2024-Feb-01").await;
    let callback = format!("/oauthcallback?state={state}&code=auth-code");

    let (status, _, body) = get(&app, &callback).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "26");

    let (status, _, _) = get(&app, &callback).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_token_exchange() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .mount(&mock_server)
        .await;

    let app = app(&args(&mock_server));
    let state = login(&app, "2024-Jan-01", "2024-Feb-01").await;

    let (status, _, body) = get(&app, &format!("/oauthcallback?state={state}&code=auth-code")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.starts_with("OAuth2 exchange failed"));
}

#[tokio::test]
async fn denied_consent() {
    let mock_server = MockServer::start().await;
    let app = app(&args(&mock_server));
    let state = login(&app, "2024-Jan-01", "2024-Feb-01").await;

    let (status, _, body) = get(&app, &format!("/oauthcallback?state={state}&error=access_denied")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("access_denied"));
}

#[tokio::test]
async fn malformed_event_date() {
    let mock_server = MockServer::start().await;
    mock_token(&mock_server).await;
    mock_events(
        &mock_server,
        json!([all_day("#holiday#", "next monday", "2024-01-17")]),
    )
    .await;

    let app = app(&args(&mock_server));
    let state = login(&app, "2024-Jan-01", "2024-Feb-01").await;

    let (status, _, _) = get(&app, &format!("/oauthcallback?state={state}&code=auth-code")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
