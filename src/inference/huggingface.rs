use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::HuggingFaceConfig;
use crate::error::CollaboratorError;

/// Environment variable holding the Hugging Face API token
pub const HF_TOKEN_VAR: &str = "HF_API_TOKEN";

/// Client for the Hugging Face Inference API
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HuggingFaceClient {
    pub fn new(config: &HuggingFaceConfig, token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Create a client, reading the token from the environment if set
    pub fn from_env(config: &HuggingFaceConfig) -> Self {
        Self::new(config, std::env::var(HF_TOKEN_VAR).ok())
    }

    /// Run a model on the given request body and decode its JSON response
    pub async fn infer<B, T>(&self, model: &str, body: &B) -> Result<T, CollaboratorError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, model);
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Api { status, body });
        }

        let text = response.text().await?;
        debug!("Inference response from {}: {} bytes", model, text.len());
        serde_json::from_str(&text).map_err(|e| CollaboratorError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let config = HuggingFaceConfig {
            base_url: "http://localhost:8080/models/".to_string(),
            timeout_secs: 5,
        };
        let client = HuggingFaceClient::new(&config, Some(String::new()));
        assert_eq!(client.base_url, "http://localhost:8080/models");
        assert!(client.token.is_none());
    }
}
