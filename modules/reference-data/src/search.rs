use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ReferenceDataError, Result};
use crate::IndexSchema;

const SERVICE: &str = "search index";

/// Internal identifier stripped from the mapping; the `code` field is the
/// identifier the model should use.
pub const RESERVED_FIELD: &str = "id";

/// Reads field mappings from an OpenSearch-compatible cluster.
pub struct SearchIndexClient {
    client: reqwest::Client,
    base_url: String,
    index: String,
    credentials: Option<(String, String)>,
}

impl SearchIndexClient {
    pub fn new(base_url: &str, index: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
            credentials: None,
        })
    }

    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    /// Fetch `GET /{index}` and return its top-level field mapping without
    /// the reserved `id` field.
    pub async fn index_schema(&self) -> Result<IndexSchema> {
        let url = format!("{}/{}", self.base_url, self.index);
        debug!(index = %self.index, "Fetching index mapping");

        let mut request = self.client.get(&url);
        if let Some((ref user, ref password)) = self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ReferenceDataError::Api {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = resp.json().await?;
        let schema = extract_properties(&self.index, body)?;
        info!(index = %self.index, fields = schema.len(), "Loaded index schema");

        Ok(schema)
    }
}

/// Pull `{index}.mappings.properties` out of an index description.
pub fn extract_properties(index: &str, mut body: Value) -> Result<IndexSchema> {
    let path = format!("/{index}/mappings/properties");

    match body.pointer_mut(&path).map(Value::take) {
        Some(Value::Object(mut properties)) => {
            properties.remove(RESERVED_FIELD);
            Ok(properties)
        }
        _ => Err(ReferenceDataError::MissingField {
            service: SERVICE,
            path: format!("{index}.mappings.properties"),
        }),
    }
}
