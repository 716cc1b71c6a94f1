//! Integration tests for `HttpRemoteStore` and the data access facade
//! against a live axum API on localhost.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use url::Url;

use console_sync::adapters::{HttpRemoteConfig, HttpRemoteStore, TtlCache};
use console_sync::application::{DataAccessError, DataAccessFacade, FacadeOptions, TtlPolicy};
use console_sync::domain::cache::Filters;
use console_sync::domain::policy::{Action, PolicyEvaluator, Principal, Role};
use console_sync::ports::{RemoteError, RemoteStore};

// =============================================================================
// Test API
// =============================================================================

#[derive(Default)]
struct Api {
    reads: AtomicUsize,
}

fn bearer(headers: &HeaderMap) -> Value {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(|value| Value::String(value.to_string()))
        .unwrap_or(Value::Null)
}

async fn list_clients(
    State(api): State<Arc<Api>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let reads = api.reads.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({"query": query, "auth": bearer(&headers), "reads": reads}))
}

async fn create_client(Json(body): Json<Value>) -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({"method": "POST", "body": body})))
}

async fn update_client(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"method": "PATCH", "body": body}))
}

async fn delete_client() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn start() -> (Url, Arc<Api>) {
    let api = Arc::new(Api::default());
    let app = Router::new()
        .route(
            "/api/clients",
            get(list_clients)
                .post(create_client)
                .patch(update_client)
                .delete(delete_client),
        )
        .route(
            "/api/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/api/garbage", get(|| async { "not json" }))
        .with_state(api.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (Url::parse(&format!("http://{addr}/api")).unwrap(), api)
}

fn store(base: &Url) -> HttpRemoteStore {
    HttpRemoteStore::new(HttpRemoteConfig::new(base.clone())).unwrap()
}

fn filters(pairs: &[(&str, &str)]) -> Filters {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// RemoteStore over HTTP
// =============================================================================

#[tokio::test]
async fn fetch_sends_filters_as_query() {
    let (base, _api) = start().await;

    let value = store(&base)
        .fetch("clients", &filters(&[("tier", "gold"), ("q", "ada")]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value["query"]["tier"], "gold");
    assert_eq!(value["query"]["q"], "ada");
    assert_eq!(value["auth"], Value::Null);
}

#[tokio::test]
async fn fetch_sends_bearer_token() {
    let (base, _api) = start().await;
    let config =
        HttpRemoteConfig::new(base).with_auth_token(SecretString::new("api-token".into()));
    let store = HttpRemoteStore::new(config).unwrap();

    let value = store.fetch("clients", &Filters::new()).await.unwrap().unwrap();

    assert_eq!(value["auth"], "Bearer api-token");
}

#[tokio::test]
async fn not_found_is_a_miss() {
    let (base, _api) = start().await;

    let value = store(&base).fetch("nothing-here", &Filters::new()).await.unwrap();

    assert_eq!(value, None);
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let (base, _api) = start().await;

    let err = store(&base).fetch("broken", &Filters::new()).await.unwrap_err();

    assert_eq!(
        err,
        RemoteError::Status {
            status: 500,
            message: "boom".to_string()
        }
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let (base, _api) = start().await;

    let err = store(&base).fetch("garbage", &Filters::new()).await.unwrap_err();

    assert!(matches!(err, RemoteError::Decode(_)));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn mutations_use_the_matching_method() {
    let (base, _api) = start().await;
    let store = store(&base);
    let patch = json!({"name": "Ada"});

    let created = store.mutate("clients", Action::Create, &patch).await.unwrap();
    assert_eq!(created["method"], "POST");
    assert_eq!(created["body"], patch);

    let updated = store.mutate("clients", Action::Update, &patch).await.unwrap();
    assert_eq!(updated["method"], "PATCH");

    let deleted = store.mutate("clients", Action::Delete, &json!({})).await.unwrap();
    assert_eq!(deleted, Value::Null);
}

// =============================================================================
// Facade over HTTP
// =============================================================================

fn facade(base: &Url) -> DataAccessFacade {
    DataAccessFacade::new(
        Arc::new(TtlCache::<Value>::new()),
        Arc::new(store(base)),
        PolicyEvaluator::with_default_policy(),
        TtlPolicy::default(),
        FacadeOptions::default(),
    )
}

fn principal(role: &str) -> Principal {
    Principal::new("user-1", Role::new(role).unwrap())
}

#[tokio::test]
async fn facade_caches_until_a_mutation() {
    let (base, api) = start().await;
    let facade = facade(&base);
    let agent = principal("agent");
    let gold = filters(&[("tier", "gold")]);

    facade.get(&agent, "clients", &gold).await.unwrap();
    facade.get(&agent, "clients", &gold).await.unwrap();
    assert_eq!(api.reads.load(Ordering::SeqCst), 1);

    facade
        .mutate(&agent, "clients", Action::Update, &json!({"id": "42"}))
        .await
        .unwrap();
    let fresh = facade.get(&agent, "clients", &gold).await.unwrap().unwrap();

    assert_eq!(api.reads.load(Ordering::SeqCst), 2);
    assert_eq!(fresh["reads"], 2);
}

#[tokio::test]
async fn facade_denies_before_any_request() {
    let (base, api) = start().await;
    let facade = facade(&base);

    let result = facade
        .get(&principal("client"), "clients", &Filters::new())
        .await;

    assert!(matches!(result, Err(DataAccessError::Denied(_))));
    assert_eq!(api.reads.load(Ordering::SeqCst), 0);
}
