use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reference_data::ReferenceData;

use crate::error::CohortBuilderError;
use crate::grammar::GrammarSource;
use crate::model::{CustomGrammarQuery, QueryModel};
use crate::prompt::{build_system_prompt, build_user_prompt};

/// Successful reply of `POST /cohort-builder/query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub description: String,
}

impl From<CustomGrammarQuery> for QueryResponse {
    fn from(answer: CustomGrammarQuery) -> Self {
        Self {
            query: answer.query,
            description: answer.description,
        }
    }
}

/// Prompt in, grammar query out.
pub struct QueryGenerator {
    grammar: GrammarSource,
    reference: Arc<dyn ReferenceData>,
    model: Arc<dyn QueryModel>,
}

impl QueryGenerator {
    pub fn new(
        grammar: GrammarSource,
        reference: Arc<dyn ReferenceData>,
        model: Arc<dyn QueryModel>,
    ) -> Self {
        Self {
            grammar,
            reference,
            model,
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<QueryResponse, CohortBuilderError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CohortBuilderError::BadRequest(
                "field `prompt` must not be empty".to_string(),
            ));
        }
        debug!(prompt, "Generating cohort query");

        // Grammar, mapping and species are independent of each other.
        let (grammar, index_schema, species) = tokio::try_join!(
            self.grammar.load(),
            async {
                self.reference
                    .index_schema()
                    .await
                    .map_err(CohortBuilderError::from)
            },
            async { self.reference.species().await.map_err(CohortBuilderError::from) },
        )?;

        let system_prompt = build_system_prompt(&grammar, &index_schema, &species);
        let user_prompt = build_user_prompt(prompt);
        debug!(
            fields = index_schema.len(),
            species = species.len(),
            system_prompt_bytes = system_prompt.len(),
            "Prompts assembled"
        );

        let answer = self.model.generate(&system_prompt, &user_prompt).await?;
        info!(query = %answer.query, "Cohort query generated");

        Ok(answer.into())
    }
}
