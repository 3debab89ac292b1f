use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::warn;

use reference_data::{CachedReferenceData, ReferenceDataClient, SearchIndexClient, SpeciesClient};

use crate::config::Config;
use crate::error::CohortBuilderError;
use crate::generator::{QueryGenerator, QueryResponse};
use crate::grammar::GrammarSource;
use crate::model::ClaudeQueryModel;

pub const QUERY_ROUTE: &str = "/cohort-builder/query";

pub struct AppState {
    pub generator: QueryGenerator,
}

impl AppState {
    pub fn new(generator: QueryGenerator) -> Self {
        Self { generator }
    }

    /// Wire the live search, species and Claude clients from config.
    pub async fn from_config(config: &Config) -> Result<Self, CohortBuilderError> {
        let client_error = |e: reference_data::ReferenceDataError| {
            CohortBuilderError::Internal(format!("failed to build reference client: {e}"))
        };

        let mut search = SearchIndexClient::new(
            &config.search_url,
            &config.search_index,
            config.reference_timeout,
        )
        .map_err(client_error)?;
        if let (Some(user), Some(password)) = (&config.search_username, &config.search_password) {
            search = search.with_basic_auth(user, password);
        }
        let species = SpeciesClient::new(
            &config.species_api_url,
            &config.jwt_secret,
            config.reference_timeout,
        )
        .map_err(client_error)?;

        let reference = CachedReferenceData::new(
            ReferenceDataClient::new(search, species),
            config.reference_cache_ttl,
        );

        let grammar = if config.grammar_cache {
            GrammarSource::preload(&config.grammar_path).await?
        } else {
            GrammarSource::open(&config.grammar_path).await?
        };

        let generator = QueryGenerator::new(
            grammar,
            Arc::new(reference),
            Arc::new(ClaudeQueryModel::from_config(config)),
        );
        Ok(Self::new(generator))
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub prompt: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route(QUERY_ROUTE, post(generate_query))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Method + path only; prompts can describe patients.
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

async fn generate_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, CohortBuilderError> {
    let Json(body) =
        payload.map_err(|rejection| CohortBuilderError::BadRequest(rejection.body_text()))?;
    let prompt = body.prompt.ok_or_else(|| {
        CohortBuilderError::BadRequest("missing required field `prompt`".to_string())
    })?;

    match state.generator.generate(&prompt).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "Error generating query");
            Err(e)
        }
    }
}
