use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use configs::Argon2Config;
use server::{routes, ServerState};
use service::auth::{
    password::CredentialVerifier, repository::mock::InMemoryStore, AuthSettings, TokenService,
};
use service::catalog::repository::mock::InMemoryProductStore;

const SECRET: &str = "flow-secret";

struct TestApp {
    app: Router,
    store: Arc<InMemoryStore>,
    products: Arc<InMemoryProductStore>,
    tokens: Arc<TokenService>,
}

fn test_app() -> TestApp {
    let store = Arc::new(InMemoryStore::with_roles(&["admin", "manager", "customer"]));
    let cheap = Argon2Config { memory_kib: 1024, iterations: 1, parallelism: 1 };
    let verifier = Arc::new(CredentialVerifier::from_config(&cheap).unwrap());
    let tokens = Arc::new(TokenService::new(Some(SECRET)));
    let products = Arc::new(InMemoryProductStore::default());
    let state =
        ServerState::new(store.clone(), store.clone(), products.clone(), verifier, tokens.clone(), AuthSettings::default());
    TestApp { app: routes::build_router(state), store, products, tokens }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, headers, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    authed_json("PUT", uri, Some(token), body)
}

fn authed_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::from(body.to_string())).unwrap()
}

fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("DELETE").uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

fn new_product(token: Option<&str>, name: &str, price: f64) -> Request<Body> {
    authed_json("POST", "/admin/product", token, json!({"name": name, "price": price}))
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> Value {
    let (status, _, body) =
        send(app, post_json("/auth/register", json!({"name": name, "email": email, "password": password}))).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, _, body) = send(app, post_json("/auth/login", json!({"email": email, "password": password}))).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_and_login_issue_a_customer_token() {
    let t = test_app();
    let user = register(&t.app, "Ana", "ana@example.com", "S3curePass!").await;
    assert_eq!(user["email"], "ana@example.com");
    assert!(user.get("password_hash").is_none());

    let (status, headers, body) =
        send(&t.app, post_json("/auth/login", json!({"email": "ana@example.com", "password": "S3curePass!"}))).await;
    assert_eq!(status, StatusCode::OK);
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));

    let claims = t.tokens.verify(body["access_token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.sub, user["id"].as_str().unwrap());
    let customer_id = t.store.role_id("customer").unwrap().to_string();
    assert_eq!(claims.role_claim(), Some(customer_id.as_str()));
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let t = test_app();
    register(&t.app, "Ana", "ana@example.com", "S3curePass!").await;

    let (status, _, body) =
        send(&t.app, post_json("/auth/login", json!({"email": "ana@example.com", "password": "nope"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));

    let (status, _, _) =
        send(&t.app, post_json("/auth/login", json!({"email": "ghost@example.com", "password": "nope"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_validates_and_rejects_duplicates() {
    let t = test_app();
    let (status, _, body) =
        send(&t.app, post_json("/auth/register", json!({"name": "", "email": "nope", "password": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["name", "email", "password"] {
        assert!(body["errors"][field].is_string(), "missing {field} in {body}");
    }

    register(&t.app, "Ana", "ana@example.com", "pw").await;
    let (status, _, _) =
        send(&t.app, post_json("/auth/register", json!({"name": "Other", "email": "ana@example.com", "password": "pw"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn gate_admits_only_allowed_roles() {
    let t = test_app();
    register(&t.app, "Cid", "cid@example.com", "pw").await;
    let customer = login(&t.app, "cid@example.com", "pw").await;

    let (status, _, body) = send(&t.app, new_product(Some(&customer), "Desk", 120.0)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "forbidden"}));
    assert!(t.products.is_empty());

    let by_name = t.tokens.issue("u1", "admin", 60).await.unwrap();
    let (status, _, body) = send(&t.app, new_product(Some(&by_name), "Desk", 120.0)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Desk");
    let id = body["id"].as_str().unwrap().to_string();

    let manager_id = t.store.role_id("manager").unwrap().to_string();
    let by_id = t.tokens.issue("u2", &manager_id, 60).await.unwrap();
    let uri = format!("/admin/product/{id}");
    let (status, _, body) = send(&t.app, authed_json("PUT", &uri, Some(&by_id), json!({"price": 99.5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 99.5);
    assert_eq!(body["name"], "Desk");

    let (status, _, _) = send(&t.app, delete(&uri, Some(&customer))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let unknown = t.tokens.issue("u3", &Uuid::new_v4().to_string(), 60).await.unwrap();
    let (status, _, _) = send(&t.app, delete(&uri, Some(&unknown))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(t.products.len(), 1);

    let (status, _, body) = send(&t.app, delete(&uri, Some(&by_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "product deleted successfully"}));
    let (status, _, _) = send(&t.app, delete(&uri, Some(&by_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn gate_rejects_missing_or_invalid_tokens() {
    let t = test_app();
    let (status, _, body) = send(&t.app, new_product(None, "Desk", 120.0)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "forbidden"}));

    let (status, _, _) = send(&t.app, new_product(Some("not.a.jwt"), "Desk", 120.0)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let exp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64 + 60;
    let no_role = encode(
        &Header::default(),
        &json!({"sub": "u1", "exp": exp}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    let (status, _, body) = send(&t.app, new_product(Some(&no_role), "Desk", 120.0)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "invalid token");
    assert_eq!(body["claims"]["sub"], "u1");
    assert!(t.products.is_empty());
}

#[tokio::test]
async fn catalog_reads_are_public_and_paginated() {
    let t = test_app();
    let admin = t.tokens.issue("u1", "admin", 60).await.unwrap();
    let mut ids = Vec::new();
    for (name, price) in [("Desk", 120.0), ("Lamp", 35.5), ("Chair", 80.0)] {
        let (status, _, body) = send(&t.app, new_product(Some(&admin), name, price)).await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["id"].as_str().unwrap().to_string());
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let (status, _, body) = send(&t.app, get("/product?page=1&limit=2", None)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Desk", "Lamp"]);

    let (_, _, body) = send(&t.app, get("/product?page=2&limit=2", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, _, body) = send(&t.app, get("/product?sort=desc", None)).await;
    assert_eq!(body[0]["id"], ids[2].as_str());

    let (status, _, body) = send(&t.app, get("/product?page=x&limit=-1&sort=price", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Desk");

    let (status, _, body) = send(&t.app, get(&format!("/product/{}", ids[1]), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 35.5);
    let (status, _, body) = send(&t.app, get(&format!("/product/{}", Uuid::new_v4()), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "product not found"}));
}

#[tokio::test]
async fn product_writes_are_validated() {
    let t = test_app();
    let admin = t.tokens.issue("u1", "admin", 60).await.unwrap();
    let (status, _, body) = send(&t.app, new_product(Some(&admin), "", 0.0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["name"].is_string() && body["errors"]["price"].is_string());

    let (status, _, body) = send(&t.app, new_product(Some(&admin), "Desk", -3.0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["price"], "invalid price");

    let uri = format!("/admin/product/{}", Uuid::new_v4());
    let (status, _, _) = send(&t.app, authed_json("PUT", &uri, Some(&admin), json!({"name": "X"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(t.products.is_empty());
}

#[tokio::test]
async fn profile_routes_need_a_valid_token() {
    let t = test_app();
    let user = register(&t.app, "Ana", "ana@example.com", "pw").await;
    let token = login(&t.app, "ana@example.com", "pw").await;

    let (status, _, body) = send(&t.app, get("/user/profile", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user["id"]);

    let by_cookie = Request::builder()
        .uri("/user/profile")
        .header(header::COOKIE, format!("auth_token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&t.app, by_cookie).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&t.app, get("/user/profile", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, body) = send(&t.app, get("/user/profile", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid token");

    let uri = format!("/user/{}", user["id"].as_str().unwrap());
    let (status, _, _) = send(&t.app, get(&uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&t.app, get(&format!("/user/{}", Uuid::new_v4()), Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_update_paths() {
    let t = test_app();
    let ana = register(&t.app, "Ana", "ana@example.com", "pw").await;
    register(&t.app, "Bob", "bob@example.com", "bob-pw").await;
    let token = login(&t.app, "ana@example.com", "pw").await;
    let ana_id = Uuid::parse_str(ana["id"].as_str().unwrap()).unwrap();
    let before = t.store.user(ana_id).unwrap();

    let (status, _, body) = send(
        &t.app,
        put_json("/user/profile", &token, json!({"name": "Ana", "email": "bob@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "this email is already used");
    assert_eq!(t.store.user(ana_id).unwrap(), before);

    let (status, _, _) = send(
        &t.app,
        put_json("/user/profile", &token, json!({"name": "Eve", "email": "eve@example.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(t.store.user(ana_id).unwrap(), before);

    let (status, _, body) = send(
        &t.app,
        put_json(
            "/user/profile",
            &token,
            json!({"name": "Ana Maria", "email": "ana.m@example.com", "password": "pw", "new_password": "pw2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ana Maria");
    assert_eq!(body["role_id"], ana["role_id"]);

    // the old token still works until it expires
    let (status, _, body) = send(&t.app, get("/user/profile", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ana.m@example.com");
    login(&t.app, "ana.m@example.com", "pw2").await;
}

#[tokio::test]
async fn health_logout_and_openapi() {
    let t = test_app();
    let (status, _, body) = send(&t.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, headers, _) = send(&t.app, post_json("/auth/logout", json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("auth_token="));
    assert!(cleared.contains("Max-Age=0"));

    // bearer-only clients get the same expired cookie
    let token = t.tokens.issue("u1", "customer", 60).await.unwrap();
    let (status, headers, _) = send(&t.app, authed_json("POST", "/auth/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(headers.get(header::SET_COOKIE).unwrap().to_str().unwrap().contains("Max-Age=0"));

    let (status, _, body) = send(&t.app, get("/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/auth/login"].is_object());
    assert!(body["paths"]["/user/{id}"].is_object());
    assert!(body["paths"]["/admin/product/{id}"]["delete"].is_object());
}
