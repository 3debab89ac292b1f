//! End-to-end tests of the HTTP surface with mocked reference data and model.

use std::io::Write;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use cohort_builder::error::ErrorBody;
use cohort_builder::routes::QUERY_ROUTE;
use cohort_builder::testing::{MockQueryModel, MockReferenceData};
use cohort_builder::{router, AppState, Config, GrammarSource, QueryGenerator, QueryResponse};

fn app(reference: Arc<MockReferenceData>, model: Arc<MockQueryModel>) -> Router {
    let generator = QueryGenerator::new(
        GrammarSource::fixed("grammar QueryDSL;\nquery : expression EOF ;"),
        reference,
        model,
    );
    router(Arc::new(AppState::new(generator)))
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(QUERY_ROUTE)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn dogs_with_skin_conditions_round_trip() {
    let reference = Arc::new(MockReferenceData::new().with_species(&["Canine", "Feline"]));
    let model = Arc::new(MockQueryModel::replying(
        "cases{diagnosis{species:Canine}}",
        "Maps dog to Canine and searches diagnosis notes",
    ));

    let (status, body) = send(
        app(reference, model.clone()),
        post_json(r#"{"prompt": "dogs with skin conditions"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "query": "cases{diagnosis{species:Canine}}",
            "description": "Maps dog to Canine and searches diagnosis notes"
        })
    );
    let parsed: QueryResponse = serde_json::from_value(body).unwrap();
    assert_eq!(parsed.query, "cases{diagnosis{species:Canine}}");

    let (system, _) = model.last_prompts().unwrap();
    assert!(system.contains(r#"["Canine","Feline"]"#));
}

#[tokio::test]
async fn missing_prompt_is_bad_request() {
    let reference = Arc::new(MockReferenceData::new());
    let model = Arc::new(MockQueryModel::replying("q", "d"));

    let (status, body) = send(
        app(reference.clone(), model.clone()),
        post_json(r#"{"question": "dogs"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorBody = serde_json::from_value(body).unwrap();
    assert!(error.error.contains("prompt"), "got {:?}", error.error);
    assert_eq!(reference.species_calls(), 0);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn empty_prompt_is_bad_request() {
    let reference = Arc::new(MockReferenceData::new());
    let model = Arc::new(MockQueryModel::replying("q", "d"));

    let (status, body) = send(app(reference, model.clone()), post_json(r#"{"prompt": "  "}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("prompt"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn invalid_json_is_bad_request() {
    let reference = Arc::new(MockReferenceData::new());
    let model = Arc::new(MockQueryModel::replying("q", "d"));

    let (status, body) = send(app(reference, model), post_json("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn species_outage_is_bad_gateway() {
    let reference = Arc::new(MockReferenceData::new().failing_species());
    let model = Arc::new(MockQueryModel::replying("q", "d"));

    let (status, body) = send(
        app(reference, model.clone()),
        post_json(r#"{"prompt": "cats"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Reference data unavailable"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn malformed_model_reply_is_bad_gateway() {
    let reference = Arc::new(MockReferenceData::new());
    let model = Arc::new(MockQueryModel::malformed());

    let (status, body) = send(app(reference, model), post_json(r#"{"prompt": "cats"}"#)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("Model error"));
}

#[tokio::test]
async fn unreadable_grammar_is_internal_error() {
    let generator = QueryGenerator::new(
        GrammarSource::per_request("/nonexistent/QueryDSL.g4"),
        Arc::new(MockReferenceData::new()),
        Arc::new(MockQueryModel::replying("q", "d")),
    );
    let app = router(Arc::new(AppState::new(generator)));

    let (status, body) = send(app, post_json(r#"{"prompt": "cats"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_check_is_ok() {
    let reference = Arc::new(MockReferenceData::new());
    let model = Arc::new(MockQueryModel::replying("q", "d"));

    let response = app(reference, model)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn state_wires_from_config_with_cached_grammar() {
    let mut grammar = tempfile::NamedTempFile::new().unwrap();
    grammar.write_all(b"grammar QueryDSL;").unwrap();
    let grammar_path = grammar.path().to_string_lossy().to_string();

    let config = Config::from_lookup(|key| match key {
        "ANTHROPIC_API_KEY" => Some("sk-ant-test".into()),
        "EZYVET_DATA_API" => Some("http://127.0.0.1:9".into()),
        "CUVMIT_JWT_SECRET" => Some("shh".into()),
        "GRAMMAR_PATH" => Some(grammar_path.clone()),
        "GRAMMAR_CACHE" => Some("true".into()),
        _ => None,
    })
    .unwrap();

    assert!(AppState::from_config(&config).await.is_ok());

    let uncached = Config {
        grammar_cache: false,
        ..config.clone()
    };
    assert!(AppState::from_config(&uncached).await.is_ok());

    let missing = Config {
        grammar_path: "/nonexistent/QueryDSL.g4".into(),
        ..config
    };
    assert!(AppState::from_config(&missing).await.is_err());
}

#[tokio::test]
async fn startup_rejects_missing_grammar_without_cache() {
    let config = Config::from_lookup(|key| match key {
        "ANTHROPIC_API_KEY" => Some("sk-ant-test".into()),
        "EZYVET_DATA_API" => Some("http://127.0.0.1:9".into()),
        "CUVMIT_JWT_SECRET" => Some("shh".into()),
        "GRAMMAR_PATH" => Some("/nonexistent/QueryDSL.g4".into()),
        _ => None,
    })
    .unwrap();
    assert!(!config.grammar_cache);

    let err = AppState::from_config(&config).await.err().unwrap();
    assert_eq!(err.kind(), "internal");
    assert!(err.to_string().contains("QueryDSL.g4"));
}
