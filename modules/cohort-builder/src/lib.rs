pub mod config;
pub mod error;
pub mod generator;
pub mod grammar;
pub mod model;
pub mod prompt;
pub mod routes;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config::Config;
pub use error::CohortBuilderError;
pub use generator::{QueryGenerator, QueryResponse};
pub use grammar::GrammarSource;
pub use model::{ClaudeQueryModel, CustomGrammarQuery, QueryModel};
pub use routes::{router, AppState};
