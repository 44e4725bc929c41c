use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, CheckResponse, SelectResponse};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<String> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(http::header::COOKIE, cookie);
    }
    builder.body(body.to_string()).unwrap()
}

/// Run a check and return the `session=<id>` pair plus the parsed body.
async fn checked(app: &Router, body: &str) -> (String, CheckResponse) {
    let resp = app
        .clone()
        .oneshot(json_request("/shop/check", body, None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(http::header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    (cookie, body_json(resp).await)
}

// --- check ---

#[tokio::test]
async fn check_serviceable_address_returns_candidate_and_session() {
    let app = app();
    let (cookie, body) = checked(
        &app,
        r#"{"Address1":" 718 25th St ","Zip":"50312","City":"Des Moines","UnitNumber":"4"}"#,
    )
    .await;

    assert!(cookie.starts_with("session="));
    assert!(body.serviceable);
    assert_eq!(body.candidates.len(), 1);
    let candidate = &body.candidates[0];
    assert_eq!(candidate.address1, "718 25th St");
    assert_eq!(candidate.city.as_deref(), Some("Des Moines"));
    assert_eq!(candidate.unit_id.as_deref(), Some("unit-4"));
}

#[tokio::test]
async fn check_unserviceable_zip_has_no_candidates() {
    let app = app();
    let (_, body) = checked(&app, r#"{"Address1":"1 Main St","Zip":"01234"}"#).await;
    assert!(!body.serviceable);
    assert!(body.candidates.is_empty());
}

#[tokio::test]
async fn check_reuses_known_session() {
    let app = app();
    let (cookie, _) = checked(&app, r#"{"Address1":"718 25th St","Zip":"50312"}"#).await;

    let resp = app
        .oneshot(json_request(
            "/shop/check",
            r#"{"Address1":"718 25th St","Zip":"50312"}"#,
            Some(cookie.as_str()),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(http::header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn check_missing_zip_returns_400() {
    let app = app();
    let resp = app
        .oneshot(json_request("/shop/check", r#"{"Address1":"718 25th St"}"#, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_bytes(resp).await;
    assert!(!body.is_empty());
}

#[tokio::test]
async fn check_blank_address1_returns_400() {
    let app = app();
    let resp = app
        .oneshot(json_request("/shop/check", r#"{"Address1":"  ","Zip":"50312"}"#, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn check_malformed_json_is_rejected() {
    let app = app();
    let resp = app
        .oneshot(json_request("/shop/check", "{not json", None))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

// --- select ---

#[tokio::test]
async fn select_offered_location_succeeds() {
    let app = app();
    let (cookie, body) = checked(&app, r#"{"Address1":"718 25th St","Zip":"50312"}"#).await;
    let location_id = body.candidates[0].location_id;

    let resp = app
        .oneshot(json_request(
            "/shop/select",
            &format!(r#"{{"Address1":"718 25th St","Zip":"50312","LocationId":"{location_id}"}}"#),
            Some(cookie.as_str()),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let selected: SelectResponse = body_json(resp).await;
    assert!(selected.selected);
    assert_eq!(selected.location_id, location_id);
}

#[tokio::test]
async fn select_without_session_returns_401() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "/shop/select",
            r#"{"Address1":"718 25th St","Zip":"50312","LocationId":"00000000-0000-0000-0000-000000000000"}"#,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn select_unknown_location_returns_404() {
    let app = app();
    let (cookie, _) = checked(&app, r#"{"Address1":"718 25th St","Zip":"50312"}"#).await;

    let resp = app
        .oneshot(json_request(
            "/shop/select",
            r#"{"Address1":"718 25th St","Zip":"50312","LocationId":"00000000-0000-0000-0000-000000000000"}"#,
            Some(cookie.as_str()),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn select_missing_address_returns_400() {
    let app = app();
    let resp = app
        .oneshot(json_request("/shop/select", r#"{"Zip":"50312"}"#, None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = app();
    let resp = app
        .oneshot(json_request("/shop/unknown", "{}", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
