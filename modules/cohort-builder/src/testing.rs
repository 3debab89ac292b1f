// Test mocks for query generation.
//
// Two mocks matching the two trait boundaries:
// - MockReferenceData (ReferenceData) — fixed schema/species, optional failures
// - MockQueryModel (QueryModel) — canned reply, records the prompts it saw
//
// Both count calls so tests can assert what was (not) reached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use ai_client::AiError;
use reference_data::{IndexSchema, ReferenceData, ReferenceDataError, SpeciesList};

use crate::model::{CustomGrammarQuery, QueryModel};

// ---------------------------------------------------------------------------
// MockReferenceData
// ---------------------------------------------------------------------------

/// Animals-index fixture. Still carries the reserved `id` field so prompt
/// assembly is exercised on it.
pub fn animals_schema() -> IndexSchema {
    let mut schema = IndexSchema::new();
    schema.insert("id".into(), json!({"type": "keyword"}));
    schema.insert("code".into(), json!({"type": "keyword"}));
    schema.insert("name".into(), json!({"type": "text"}));
    schema.insert("species".into(), json!({"type": "keyword"}));
    schema.insert("breed".into(), json!({"type": "text"}));
    schema.insert(
        "cases".into(),
        json!({
            "type": "nested",
            "properties": {
                "assessment": {"properties": {"notes": {"type": "text"}}},
                "diagnosis": {"properties": {"notes": {"type": "text"}}}
            }
        }),
    );
    schema
}

pub struct MockReferenceData {
    schema: Option<IndexSchema>,
    species: Option<SpeciesList>,
    schema_calls: AtomicUsize,
    species_calls: AtomicUsize,
}

impl MockReferenceData {
    pub fn new() -> Self {
        Self {
            schema: Some(animals_schema()),
            species: Some(vec!["Canine".into(), "Feline".into(), "Equine".into()]),
            schema_calls: AtomicUsize::new(0),
            species_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_species(mut self, species: &[&str]) -> Self {
        self.species = Some(species.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn failing_species(mut self) -> Self {
        self.species = None;
        self
    }

    pub fn failing_schema(mut self) -> Self {
        self.schema = None;
        self
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }

    pub fn species_calls(&self) -> usize {
        self.species_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockReferenceData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReferenceData for MockReferenceData {
    async fn index_schema(&self) -> reference_data::Result<IndexSchema> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.schema.clone().ok_or_else(|| ReferenceDataError::Api {
            service: "search index",
            status: 503,
            message: "MockReferenceData: schema unavailable".into(),
        })
    }

    async fn species(&self) -> reference_data::Result<SpeciesList> {
        self.species_calls.fetch_add(1, Ordering::SeqCst);
        self.species
            .clone()
            .ok_or_else(|| ReferenceDataError::Network("MockReferenceData: species unavailable".into()))
    }
}

// ---------------------------------------------------------------------------
// MockQueryModel
// ---------------------------------------------------------------------------

pub struct MockQueryModel {
    reply: Option<CustomGrammarQuery>,
    calls: AtomicUsize,
    last_prompts: Mutex<Option<(String, String)>>,
}

impl MockQueryModel {
    pub fn replying(query: &str, description: &str) -> Self {
        Self {
            reply: Some(CustomGrammarQuery {
                query: query.to_string(),
                description: description.to_string(),
            }),
            calls: AtomicUsize::new(0),
            last_prompts: Mutex::new(None),
        }
    }

    /// A model whose reply does not fit the two-field shape.
    pub fn malformed() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            last_prompts: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(system, user)` from the most recent call.
    pub fn last_prompts(&self) -> Option<(String, String)> {
        self.last_prompts.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl QueryModel for MockQueryModel {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> ai_client::Result<CustomGrammarQuery> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_prompts.lock() {
            *guard = Some((system_prompt.to_string(), user_prompt.to_string()));
        }
        self.reply.clone().ok_or_else(|| {
            AiError::Parse("Failed to deserialize tool input: unknown field `confidence`".into())
        })
    }
}
