//! HTTP surface over the demo graph and demo paper corpus.

use std::sync::Arc;

use astrokg_db::MemoryPaperStore;
use astrokg_kg::MemoryGraphStore;
use astrokg_query::QueryEngine;
use astrokg_web::{build_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

fn app() -> Router {
    let engine = QueryEngine::new(Arc::new(MemoryGraphStore::demo()), Arc::new(MemoryPaperStore::demo())).unwrap();
    build_router(AppState::new(engine))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(uri: &str) -> (StatusCode, Value) {
    send(Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_query(query: &str) -> (StatusCode, Value) {
    let body = serde_json::json!({ "query": query }).to_string();
    send(
        Request::post("/api/query")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn test_health_names_backends() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["paper_backend"], "demo");
}

#[tokio::test]
async fn test_query_endpoint_answers_hybrid() {
    let (status, body) = post_query("papers related to radiation and in cluster 3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "hybrid");
    assert_eq!(body["combined"].as_array().unwrap().len(), 1);
    assert_eq!(body["combined"][0]["paper_id"], "P2");
}

#[tokio::test]
async fn test_empty_query_is_bad_request() {
    let (status, body) = post_query("   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_translate_preview() {
    let (status, body) = get("/api/translate?q=what%20affects%20bone").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["params"]["entity"], "bone");
    assert_eq!(body["params"]["relations"].as_array().unwrap().len(), 4);
    assert!(body["cypher"].as_str().unwrap().contains("$relations"));

    let (status, _) = get("/api/translate?q=hello").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_examples_listed() {
    let (status, body) = get("/api/examples").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_entities_by_type() {
    let (status, body) = get("/api/entities?type=conditions&limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let entities = body.as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert!(entities.iter().all(|e| e["type"] == "condition"));

    let (status, _) = get("/api/entities?type=planet").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_paper_and_cluster_lookups() {
    let (status, body) = get("/api/papers/P2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paper_id"], "P2");
    assert_eq!(body["clusters"][0], "3");

    let (status, _) = get("/api/papers/P404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get("/api/clusters/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = get("/api/clusters").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
}
