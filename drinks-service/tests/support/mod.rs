#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use common_auth::{InMemoryKeyStore, JwtConfig, TokenValidator};
use drinks_service::store::{InMemoryMenuStore, MenuStore};
use drinks_service::{build_router, AppState};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use once_cell::sync::Lazy;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::RsaPrivateKey;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;

pub const ISSUER: &str = "https://coffee.example.auth0.com/";
pub const AUDIENCE: &str = "drinks";
pub const KID: &str = "test-key";

pub const BARISTA: &[&str] = &["get:drinks-detail"];
pub const MANAGER: &[&str] = &[
    "get:drinks-detail",
    "post:drinks",
    "patch:drinks",
    "delete:drinks",
];

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    foreign: EncodingKey,
}

fn rsa_pair() -> (EncodingKey, DecodingKey) {
    let private_key = RsaPrivateKey::new(&mut OsRng, 2048).expect("key generation");
    let private_pem = private_key.to_pkcs1_pem(LineEnding::LF).expect("private pem");
    let public_pem = private_key
        .to_public_key()
        .to_pkcs1_pem(LineEnding::LF)
        .expect("public pem");
    (
        EncodingKey::from_rsa_pem(private_pem.as_bytes()).expect("encoding key"),
        DecodingKey::from_rsa_pem(public_pem.as_bytes()).expect("decoding key"),
    )
}

static KEYS: Lazy<Keys> = Lazy::new(|| {
    let (encoding, decoding) = rsa_pair();
    let (foreign, _) = rsa_pair();
    Keys {
        encoding,
        decoding,
        foreign,
    }
});

#[derive(Serialize)]
struct TokenClaims<'a> {
    sub: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<&'a [&'a str]>,
    iss: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

fn sign(encoding: &EncodingKey, permissions: Option<&[&str]>, expires_in: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: "auth0|test-user",
        permissions,
        iss: ISSUER,
        aud: AUDIENCE,
        exp: now + expires_in,
        iat: now,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    encode(&header, &claims, encoding).expect("sign token")
}

pub fn token(permissions: &[&str]) -> String {
    sign(&KEYS.encoding, Some(permissions), 3600)
}

pub fn token_without_permissions_claim() -> String {
    sign(&KEYS.encoding, None, 3600)
}

pub fn expired_token(permissions: &[&str]) -> String {
    sign(&KEYS.encoding, Some(permissions), -3600)
}

pub fn forged_token(permissions: &[&str]) -> String {
    sign(&KEYS.foreign, Some(permissions), 3600)
}

pub fn validator() -> Arc<TokenValidator> {
    let store = InMemoryKeyStore::new();
    store.insert_key(KID, KEYS.decoding.clone());
    let config = JwtConfig::new(ISSUER, AUDIENCE).with_leeway(0);
    Arc::new(TokenValidator::with_store(config, store))
}

pub fn app_with_store(store: Arc<dyn MenuStore>) -> Router {
    build_router(AppState::new(store, validator()))
}

/// Router over a freshly seeded in-memory menu.
pub async fn seeded_app() -> Router {
    let store = Arc::new(InMemoryMenuStore::new());
    store.reset().await.expect("seed menu");
    app_with_store(store)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub error_code: Option<String>,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let error_code = response
        .headers()
        .get("X-Error-Code")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    TestResponse {
        status,
        error_code,
        body,
    }
}
