use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, AuthResponse, Card, CardSet, CollectionEntry, ErrorBody, MessageResponse, RESET_CODE};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn authed(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, request: Request<String>) -> axum::response::Response {
    app.clone().oneshot(request).await.unwrap()
}

const ASH: &str = r#"{"name":"Ash","email":"ash@example.com","password":"Abc12345!"}"#;

async fn register_ash(app: &Router) -> AuthResponse {
    let resp = send(app, json_request("POST", "/api/auth/register", ASH)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

// --- auth ---

#[tokio::test]
async fn register_then_duplicate_conflicts() {
    let app = app();
    let first = register_ash(&app).await;
    assert_eq!(first.user_id, 1);
    assert!(!first.token.is_empty());

    let resp = send(&app, json_request("POST", "/api/auth/register", ASH)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.status, 409);
    assert_eq!(err.message, "User already exists");
}

#[tokio::test]
async fn register_reports_field_details() {
    let app = app();
    let resp = send(
        &app,
        json_request("POST", "/api/auth/register", r#"{"name":"","email":"nope","password":"x"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: ErrorBody = body_json(resp).await;
    let details = err.details.unwrap();
    assert!(details.contains_key("name"));
    assert!(details.contains_key("email"));
    assert!(details.contains_key("password"));
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let app = app();
    register_ash(&app).await;

    let resp = send(
        &app,
        json_request("POST", "/api/auth/login", r#"{"email":"ash@example.com","password":"Wrong123!"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.error, "Unauthorized");
    assert_eq!(err.message, "Bad credentials");
}

#[tokio::test]
async fn token_check_requires_bearer() {
    let app = app();
    let resp = send(&app, Request::builder().uri("/api/test").body(String::new()).unwrap()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&app, authed("GET", "/api/test", "bogus", "")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let token = register_ash(&app).await.token;
    let resp = send(&app, authed("GET", "/api/test", &token, "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let greeting: String = body_json(resp).await;
    assert_eq!(greeting, "Hello, World!");
}

#[tokio::test]
async fn password_reset_flow() {
    let app = app();
    register_ash(&app).await;

    let resp = send(
        &app,
        json_request("POST", "/api/auth/forgot-password", r#"{"email":"ash@example.com"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let _: MessageResponse = body_json(resp).await;

    let resp = send(
        &app,
        json_request(
            "POST",
            "/api/auth/verify-reset-code",
            r#"{"email":"ash@example.com","code":"000000"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let verify = format!(r#"{{"email":"ash@example.com","code":"{RESET_CODE}"}}"#);
    let resp = send(&app, json_request("POST", "/api/auth/verify-reset-code", &verify)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let reset = format!(
        r#"{{"email":"ash@example.com","code":"{RESET_CODE}","newPassword":"NewPass1!"}}"#
    );
    let resp = send(&app, json_request("POST", "/api/auth/reset-password", &reset)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let done: MessageResponse = body_json(resp).await;
    assert_eq!(done.message, "Password has been reset successfully.");

    // The code is single use.
    let resp = send(&app, json_request("POST", "/api/auth/reset-password", &reset)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(
        &app,
        json_request("POST", "/api/auth/login", r#"{"email":"ash@example.com","password":"NewPass1!"}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn reset_for_unknown_account_is_404() {
    let app = app();
    let reset = format!(r#"{{"email":"misty@example.com","code":"{RESET_CODE}","newPassword":"NewPass1!"}}"#);
    let resp = send(&app, json_request("POST", "/api/auth/reset-password", &reset)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- catalog ---

#[tokio::test]
async fn sets_by_series_decodes_path() {
    let app = app();
    let resp = send(
        &app,
        Request::builder()
            .uri("/api/sets/series/Scarlet%20%26%20Violet")
            .body(String::new())
            .unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let sets: Vec<CardSet> = body_json(resp).await;
    let ids: Vec<_> = sets.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["sv6", "sv5"]);
}

#[tokio::test]
async fn unknown_series_is_empty() {
    let app = app();
    let resp = send(
        &app,
        Request::builder().uri("/api/sets/series/Neo").body(String::new()).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let sets: Vec<CardSet> = body_json(resp).await;
    assert!(sets.is_empty());
}

#[tokio::test]
async fn cards_by_set() {
    let app = app();
    let resp = send(
        &app,
        Request::builder().uri("/api/cards/set/sv6").body(String::new()).unwrap(),
    )
    .await;
    let cards: Vec<Card> = body_json(resp).await;
    assert_eq!(cards.len(), 3);
    assert_eq!(cards[2].name, "Leavanny");
}

#[tokio::test]
async fn image_route_serves_png() {
    let app = app();
    let resp = send(
        &app,
        Request::builder().uri("/images/sv6-1.png").body(String::new()).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "image/png");
    let bytes = body_bytes(resp).await;
    assert_eq!(&bytes[..4], b"\x89PNG");

    let resp = send(
        &app,
        Request::builder().uri("/images/sv6-1.gif").body(String::new()).unwrap(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- collection ---

#[tokio::test]
async fn collection_requires_token() {
    let app = app();
    let resp = send(
        &app,
        json_request("POST", "/api/collection/add", r#"{"cardId":"sv6-1","userId":1,"quantity":1}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn add_unknown_card_is_404() {
    let app = app();
    let token = register_ash(&app).await.token;
    let resp = send(
        &app,
        authed("POST", "/api/collection/add", &token, r#"{"cardId":"base1-4","userId":1,"quantity":1}"#),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let err: ErrorBody = body_json(resp).await;
    assert_eq!(err.message, "Card not found");
}

#[tokio::test]
async fn collection_lifecycle() {
    let app = app();
    let ash = register_ash(&app).await;
    let token = ash.token.as_str();
    let add = format!(r#"{{"cardId":"sv6-3","userId":{},"quantity":2}}"#, ash.user_id);

    // insert
    let resp = send(&app, authed("POST", "/api/collection/add", token, &add)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: CollectionEntry = body_json(resp).await;
    assert_eq!(created.quantity, 2);
    assert_eq!(created.card.name, "Leavanny");

    // upsert on the same (user, card)
    let update = add.replace("\"quantity\":2", "\"quantity\":5");
    let resp = send(&app, authed("POST", "/api/collection/add", token, &update)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: CollectionEntry = body_json(resp).await;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.quantity, 5);

    // list
    let uri = format!("/api/collection/user/{}", ash.user_id);
    let resp = send(&app, authed("GET", &uri, token, "")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let items: Vec<CollectionEntry> = body_json(resp).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 5);

    // delete
    let uri_delete = format!("/api/collection/delete/{}", created.id);
    let resp = send(&app, authed("DELETE", &uri_delete, token, "")).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // delete again
    let resp = send(&app, authed("DELETE", &uri_delete, token, "")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // list after delete
    let resp = send(&app, authed("GET", &uri, token, "")).await;
    let items: Vec<CollectionEntry> = body_json(resp).await;
    assert!(items.is_empty());
}

#[tokio::test]
async fn unknown_user_collection_is_404() {
    let app = app();
    let token = register_ash(&app).await.token;
    let resp = send(&app, authed("GET", "/api/collection/user/99", &token, "")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
