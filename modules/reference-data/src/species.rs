use std::time::Duration;

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ReferenceDataError, Result};
use crate::SpeciesList;

const SERVICE: &str = "species";
const SPECIES_PATH: &str = "/cornell/species";

/// Claims the species service expects; it only checks the signature.
#[derive(Debug, Serialize, Deserialize)]
struct ServiceClaims {
    payload: String,
}

#[derive(Debug, Deserialize)]
struct SpeciesRecord {
    name: String,
}

/// Authenticated client for the practice-management data API species list.
pub struct SpeciesClient {
    client: reqwest::Client,
    base_url: String,
    encoding_key: EncodingKey,
}

impl SpeciesClient {
    pub fn new(base_url: &str, jwt_secret: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
        })
    }

    /// HS256 token signed with the shared secret.
    pub fn service_token(&self) -> Result<String> {
        let claims = ServiceClaims {
            payload: "payload".to_string(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Canonical species display names, in the order the service returns them.
    pub async fn species(&self) -> Result<SpeciesList> {
        let url = format!("{}{}", self.base_url, SPECIES_PATH);
        debug!(url, "Fetching species list");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(self.service_token()?)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ReferenceDataError::Api {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let records: Vec<SpeciesRecord> = serde_json::from_str(&body)?;
        let names: SpeciesList = records.into_iter().map(|r| r.name).collect();
        info!(count = names.len(), "Loaded species list");

        Ok(names)
    }
}
