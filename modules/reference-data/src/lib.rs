pub mod cache;
pub mod error;
pub mod search;
pub mod species;

pub use cache::CachedReferenceData;
pub use error::{ReferenceDataError, Result};
pub use search::SearchIndexClient;
pub use species::SpeciesClient;

use async_trait::async_trait;

/// Field name → field-type descriptor, as reported by the index mapping.
pub type IndexSchema = serde_json::Map<String, serde_json::Value>;

/// Canonical species display names.
pub type SpeciesList = Vec<String>;

/// The two lookup tables every query generation needs.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    async fn index_schema(&self) -> Result<IndexSchema>;
    async fn species(&self) -> Result<SpeciesList>;
}

/// Live reference data straight from the search cluster and species service.
pub struct ReferenceDataClient {
    search: SearchIndexClient,
    species: SpeciesClient,
}

impl ReferenceDataClient {
    pub fn new(search: SearchIndexClient, species: SpeciesClient) -> Self {
        Self { search, species }
    }
}

#[async_trait]
impl ReferenceData for ReferenceDataClient {
    async fn index_schema(&self) -> Result<IndexSchema> {
        self.search.index_schema().await
    }

    async fn species(&self) -> Result<SpeciesList> {
        self.species.species().await
    }
}
