//! HTTP-level tests for the Can I Go server.
//!
//! These drive the full router (auth middleware, ownership gates, error
//! mapping) against the in-memory store, so no database is needed.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use hyper::{Request, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use canigo_core::config::AuthConfig;
use canigo_core::memory::MemoryStore;
use canigo_core::ports::{Clock, Email, EmailSender, FixedClock, UserStore};
use canigo_core::types::{PassLevel, Place, Role, User};
use canigo_server::router::build_router;
use canigo_server::state::AppState;

// ── Test JWT helpers ───────────────────────────────────────────

const TEST_JWT_SECRET: &[u8] = b"test-secret-for-http-tests";

#[derive(Debug, Serialize)]
struct TestClaims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

fn make_jwt(sub: Uuid, iat: i64) -> String {
    let claims = TestClaims {
        sub,
        iat,
        exp: iat + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET),
    )
    .expect("failed to encode test JWT")
}

// ── Test app builder ───────────────────────────────────────────

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, email: Email) -> canigo_core::ports::Result<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// P1 is owned by alice and accepted at the bar; P2 is bob's.
struct TestApp {
    app: Router,
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
    mailer: Arc<RecordingMailer>,
    alice: User,
    bob: User,
    admin: User,
    p1: PassLevel,
    p2: PassLevel,
    bar: Place,
}

impl TestApp {
    fn token(&self, user: &User) -> String {
        make_jwt(user.id, self.clock.now().timestamp())
    }
}

fn seed_user(pass_level_id: Uuid, age: u32, role: Role, email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        first_name: None,
        last_name: None,
        age,
        phone_number: "06 34 43".into(),
        address: None,
        email: email.into(),
        password_hash: "not-a-real-hash".into(),
        role,
        pass_level_id,
        password_changed_at: None,
        password_reset_token: None,
        password_reset_expires: None,
    }
}

fn build_test_app() -> TestApp {
    let clock = Arc::new(FixedClock::at(Utc::now()));
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());

    let p1 = PassLevel {
        id: Uuid::new_v4(),
        level: "vip".into(),
        owner_id: None,
        created_at: clock.now(),
        updated_at: None,
    };
    let p2 = PassLevel {
        id: Uuid::new_v4(),
        level: "standard".into(),
        ..p1.clone()
    };
    let alice = seed_user(p1.id, 45, Role::User, "alice@example.com");
    let bob = seed_user(p2.id, 20, Role::User, "bob@example.com");
    let admin = seed_user(p2.id, 50, Role::Admin, "admin@example.com");
    let p1 = PassLevel {
        owner_id: Some(alice.id),
        ..p1
    };
    let bar = Place {
        id: Uuid::new_v4(),
        address: "Nightmare Alley".into(),
        phone_number: "06 34 43".into(),
        age_require: 40,
        pass_level_ids: vec![p1.id],
        owner_id: Some(alice.id),
    };

    store.put_pass_level(p1.clone());
    store.put_pass_level(p2.clone());
    for u in [&alice, &bob, &admin] {
        store.put_user(u.clone());
    }
    store.put_place(bar.clone());

    let mut auth = AuthConfig::from_secret(TEST_JWT_SECRET);
    auth.bcrypt_cost = 4;
    let state = AppState::new(
        &auth,
        store.stores(),
        mailer.clone(),
        clock.clone(),
        "http://localhost:3000",
    );

    TestApp {
        app: build_router(state),
        store,
        clock,
        mailer,
        alice,
        bob,
        admin,
        p1,
        p2,
        bar,
    }
}

// ── Request helpers ────────────────────────────────────────────

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or_else(
        |_| json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }),
    );
    (status, json)
}

fn signup_body(email: &str, pass_level_id: Uuid) -> Value {
    json!({
        "age": 30,
        "phone_number": "06 34 43",
        "email": email,
        "password": "correct horse",
        "password_confirm": "correct horse",
        "pass_level_id": pass_level_id,
    })
}

// ── Public routes ──────────────────────────────────────────────

#[tokio::test]
async fn test_health_no_auth() {
    let t = build_test_app();
    let (status, body) = send(&t.app, "GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_public_listings() {
    let t = build_test_app();
    let (status, body) = send(&t.app, "GET", "/api/v1/place", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/pass/{}", t.p2.id);
    let (status, body) = send(&t.app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["level"], "standard");

    let uri = format!("/api/v1/place/{}", Uuid::new_v4());
    let (status, body) = send(&t.app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No place found");
}

#[tokio::test]
async fn test_malformed_id_and_body_are_400() {
    let t = build_test_app();
    let (status, body) = send(&t.app, "GET", "/api/v1/pass/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/v1/users/signup",
        None,
        Some(json!({ "email": "x@y.io" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// ── Authentication ─────────────────────────────────────────────

#[tokio::test]
async fn test_missing_and_garbage_tokens_are_401() {
    let t = build_test_app();
    let (status, body) = send(&t.app, "GET", "/api/v1/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "You are not logged in");

    let (status, _) = send(&t.app, "GET", "/api/v1/users/me", Some("a.b.c"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_401() {
    let t = build_test_app();
    let token = make_jwt(t.alice.id, t.clock.now().timestamp() - 7200);
    let (status, _) = send(&t.app, "GET", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_401() {
    let t = build_test_app();
    let ghost = make_jwt(Uuid::new_v4(), t.clock.now().timestamp());
    let (status, _) = send(&t.app, "GET", "/api/v1/users/me", Some(&ghost), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_older_than_password_change_is_401() {
    let t = build_test_app();
    let token = t.token(&t.alice);
    let mut alice = t.alice.clone();
    alice.password_changed_at = Some(t.clock.now() + Duration::seconds(10));
    t.store.put_user(alice);

    let (status, body) = send(&t.app, "GET", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("Password changed"));
}

#[tokio::test]
async fn test_signup_then_me() {
    let t = build_test_app();
    let (status, body) = send(
        &t.app,
        "POST",
        "/api/v1/users/signup",
        None,
        Some(signup_body("carol@example.com", t.p2.id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap().to_string();
    let (status, body) = send(&t.app, "GET", "/api/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "carol@example.com");
}

#[tokio::test]
async fn test_login() {
    let t = build_test_app();
    send(
        &t.app,
        "POST",
        "/api/v1/users/signup",
        None,
        Some(signup_body("carol@example.com", t.p2.id)),
    )
    .await;

    let (status, body) = send(
        &t.app,
        "POST",
        "/api/v1/users/login",
        None,
        Some(json!({ "email": "carol@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/v1/users/login",
        None,
        Some(json!({ "email": "carol@example.com", "password": "battery staple" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&t.app, "POST", "/api/v1/users/login", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email and password are required");
}

#[tokio::test]
async fn test_update_password_retires_old_token() {
    let t = build_test_app();
    let (_, body) = send(
        &t.app,
        "POST",
        "/api/v1/users/signup",
        None,
        Some(signup_body("carol@example.com", t.p2.id)),
    )
    .await;
    let old = body["token"].as_str().unwrap().to_string();

    t.clock.set(t.clock.now() + Duration::seconds(5));
    let (status, body) = send(
        &t.app,
        "PATCH",
        "/api/v1/users/update-password",
        Some(&old),
        Some(json!({
            "current_password": "correct horse",
            "new_password": "battery staple",
            "new_password_confirm": "battery staple",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(&t.app, "GET", "/api/v1/users/me", Some(&old), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&t.app, "GET", "/api/v1/users/me", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let t = build_test_app();
    send(
        &t.app,
        "POST",
        "/api/v1/users/signup",
        None,
        Some(signup_body("carol@example.com", t.p2.id)),
    )
    .await;

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/v1/users/forgot-password",
        None,
        Some(json!({ "email": "carol@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = t.mailer.sent.lock().unwrap()[0].body.clone();
    let marker = "/api/v1/users/reset-password/";
    let start = body.find(marker).unwrap() + marker.len();
    let raw: String = body[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect();

    let uri = format!("{marker}{raw}");
    let reset = json!({ "password": "battery staple", "password_confirm": "battery staple" });
    let (status, body) = send(&t.app, "PATCH", &uri, None, Some(reset.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, _) = send(&t.app, "PATCH", &uri, None, Some(reset)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Roles ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_admin_routes_need_admin_role() {
    let t = build_test_app();
    let (status, body) = send(&t.app, "GET", "/api/v1/users", Some(&t.token(&t.bob)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, _) = send(&t.app, "GET", "/api/v1/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        send(&t.app, "GET", "/api/v1/users", Some(&t.token(&t.admin)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_admin_can_promote_and_delete() {
    let t = build_test_app();
    let admin = t.token(&t.admin);
    let uri = format!("/api/v1/users/{}", t.bob.id);

    let (status, body) =
        send(&t.app, "PATCH", &uri, Some(&admin), Some(json!({ "role": "admin" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    let (status, _) = send(&t.app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&t.app, "GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No user found");
}

#[tokio::test]
async fn test_admin_creates_pass_level() {
    let t = build_test_app();
    let body = json!({ "level": "gold" });
    let (status, _) = send(&t.app, "POST", "/api/v1/pass", Some(&t.token(&t.bob)), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, resp) =
        send(&t.app, "POST", "/api/v1/pass", Some(&t.token(&t.admin)), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["data"]["level"], "gold");

    let (status, _) = send(&t.app, "POST", "/api/v1/pass", Some(&t.token(&t.admin)), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_user_cannot_change_own_role() {
    let t = build_test_app();
    let (status, _) = send(
        &t.app,
        "PATCH",
        "/api/v1/users/me",
        Some(&t.token(&t.bob)),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &t.app,
        "PATCH",
        "/api/v1/users/me",
        Some(&t.token(&t.bob)),
        Some(json!({ "first_name": "Robert" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Robert");
    assert_eq!(body["data"]["role"], "user");
}

#[tokio::test]
async fn test_user_cannot_raise_own_eligibility() {
    let t = build_test_app();
    let bob = t.token(&t.bob);
    let access = format!("/api/v1/place/{}/access", t.bar.id);
    let (_, before) = send(&t.app, "GET", &access, Some(&bob), None).await;
    assert_eq!(before["granted"], false);

    for patch in [
        json!({ "pass_level_id": t.p1.id, "age": 99 }),
        json!({ "pass_level_id": t.p1.id }),
        json!({ "age": 99 }),
    ] {
        let (status, body) = send(&t.app, "PATCH", "/api/v1/users/me", Some(&bob), Some(patch)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().starts_with("You cannot change your own"));
    }

    let (_, after) = send(&t.app, "GET", &access, Some(&bob), None).await;
    assert_eq!(after["granted"], false);
    let stored = UserStore::find_by_id(t.store.as_ref(), t.bob.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!((stored.age, stored.pass_level_id), (20, t.p2.id));

    // the admin route still can
    let uri = format!("/api/v1/users/{}", t.bob.id);
    let (status, body) = send(
        &t.app,
        "PATCH",
        &uri,
        Some(&t.token(&t.admin)),
        Some(json!({ "pass_level_id": t.p1.id, "age": 41 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["age"], 41);
    let (_, after) = send(&t.app, "GET", &access, Some(&bob), None).await;
    assert_eq!(after["granted"], true);
}

// ── Ownership ──────────────────────────────────────────────────

#[tokio::test]
async fn test_place_ownership() {
    let t = build_test_app();
    let uri = format!("/api/v1/place/{}", t.bar.id);
    let patch = json!({ "age_require": 18 });

    let (status, body) = send(&t.app, "PUT", &uri, Some(&t.token(&t.bob)), Some(patch.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You are not the owner of this place");

    let (status, body) = send(&t.app, "PUT", &uri, Some(&t.token(&t.alice)), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["age_require"], 18);

    let missing = format!("/api/v1/place/{}", Uuid::new_v4());
    let (status, _) = send(&t.app, "DELETE", &missing, Some(&t.token(&t.alice)), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, "DELETE", &uri, Some(&t.token(&t.alice)), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_pass_level_rights_follow_the_held_level() {
    let t = build_test_app();
    let p1 = format!("/api/v1/pass/{}", t.p1.id);
    let p2 = format!("/api/v1/pass/{}", t.p2.id);

    // bob holds P2, which has no owner, so he manages no pass level
    let (status, body) = send(&t.app, "PATCH", &p1, Some(&t.token(&t.bob)), Some(json!({ "level": "vip+" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You are not the owner of this pass level");
    let (status, _) = send(&t.app, "PATCH", &p2, Some(&t.token(&t.admin)), Some(json!({ "level": "basic" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // alice owns the level she holds, which covers other levels too
    let (status, body) = send(&t.app, "PATCH", &p2, Some(&t.token(&t.alice)), Some(json!({ "level": "basic" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["level"], "basic");
    assert!(body["data"]["updated_at"].is_string());

    // bob and the admin still hold P2
    let (status, body) = send(&t.app, "DELETE", &p2, Some(&t.token(&t.alice)), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "pass level is still in use");
}

#[tokio::test]
async fn test_user_places_by_id_is_owner_only() {
    let t = build_test_app();
    let mine = format!("/api/v1/users/{}/places", t.alice.id);
    let (status, body) = send(&t.app, "GET", &mine, Some(&t.token(&t.alice)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], t.bar.id.to_string());

    let (status, body) = send(&t.app, "GET", &mine, Some(&t.token(&t.bob)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You are not the owner of this user");
}

#[tokio::test]
async fn test_create_place_makes_caller_owner() {
    let t = build_test_app();
    let (status, body) = send(
        &t.app,
        "POST",
        "/api/v1/place",
        Some(&t.token(&t.bob)),
        Some(json!({
            "address": "1 Main Street",
            "phone_number": "01 02 03",
            "age_require": 18,
            "pass_level_ids": [t.p2.id],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["owner_id"], t.bob.id.to_string());

    let (status, _) = send(
        &t.app,
        "POST",
        "/api/v1/place",
        Some(&t.token(&t.bob)),
        Some(json!({
            "address": "2 Main Street",
            "phone_number": "01 02 03",
            "age_require": 18,
            "pass_level_ids": [],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Place access ───────────────────────────────────────────────

#[tokio::test]
async fn test_place_access_is_advisory() {
    let t = build_test_app();
    let uri = format!("/api/v1/place/{}/access", t.bar.id);

    let (status, body) = send(&t.app, "GET", &uri, Some(&t.token(&t.alice)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], true);
    assert!(body.get("reasons").is_none());

    let (status, body) = send(&t.app, "GET", &uri, Some(&t.token(&t.bob)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], false);
    let reasons: Vec<&str> = body["reasons"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["reason"].as_str().unwrap())
        .collect();
    assert_eq!(reasons, ["pass_level_not_accepted", "under_age"]);

    let (status, _) = send(&t.app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_my_places_lists_only_granted() {
    let t = build_test_app();
    let (status, body) =
        send(&t.app, "GET", "/api/v1/users/me/places", Some(&t.token(&t.alice)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], t.bar.id.to_string());

    let (status, body) =
        send(&t.app, "GET", "/api/v1/users/me/places", Some(&t.token(&t.bob)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}
