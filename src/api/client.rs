use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::envelope::{self, ApiResponse, Payload};
use crate::config::ApiConfig;
use crate::error::{PrmsError, Result};

/// HTTP transport to the PRMS backend.
///
/// Every call returns an [`ApiResponse`]: a backend-reported failure is a
/// value, not an `Err`. `Err` is reserved for transport, status and decoding
/// problems.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(|e| PrmsError::Transport(e.to_string()))?;
        Ok(Self { http, base_url: Self::parse_base(&config.base_url)? })
    }

    /// Client with default transport settings.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self { http: Client::new(), base_url: Self::parse_base(base_url)? })
    }

    fn parse_base(raw: &str) -> Result<Url> {
        // Url::join drops the last path segment unless it ends with '/'
        let normalized = format!("{}/", raw.trim_end_matches('/'));
        Url::parse(&normalized)
            .map_err(|e| PrmsError::Transport(format!("invalid base URL {raw:?}: {e}")))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, route: &str) -> Result<Url> {
        self.base_url
            .join(route)
            .map_err(|e| PrmsError::Transport(format!("invalid route {route:?}: {e}")))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        route: &str,
        params: &[(String, String)],
        payload: Payload,
    ) -> Result<ApiResponse<T>> {
        let request = self.http.get(self.url(route)?).query(params);
        envelope::decode(self.send(route, request).await?, payload)
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        route: &str,
        body: &B,
        payload: Payload,
    ) -> Result<ApiResponse<T>> {
        let request = self.http.post(self.url(route)?).json(body);
        envelope::decode(self.send(route, request).await?, payload)
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        route: &str,
        form: &[(&str, &str)],
        payload: Payload,
    ) -> Result<ApiResponse<T>> {
        let request = self.http.post(self.url(route)?).form(form);
        envelope::decode(self.send(route, request).await?, payload)
    }

    /// DELETE with a JSON body, as `delete_patient.php` expects.
    pub async fn delete_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        route: &str,
        body: &B,
        payload: Payload,
    ) -> Result<ApiResponse<T>> {
        let request = self.http.delete(self.url(route)?).json(body);
        envelope::decode(self.send(route, request).await?, payload)
    }

    /// Raw bytes of a file download.
    pub async fn get_bytes(&self, route: &str, params: &[(String, String)]) -> Result<Vec<u8>> {
        let response = self.http.get(self.url(route)?).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrmsError::Status { status: status.as_u16(), body });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn send(&self, route: &str, request: RequestBuilder) -> Result<Value> {
        debug!(route, "sending request");
        let response = request.send().await.map_err(|e| {
            warn!(route, error = %e, "request failed before a response arrived");
            PrmsError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(route, status = status.as_u16(), "backend answered with an error status");
            if status.is_client_error() {
                if let Some(message) = rejection_message(&body) {
                    return Err(PrmsError::Backend(message));
                }
            }
            return Err(PrmsError::Status { status: status.as_u16(), body });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(PrmsError::Decode("empty response from server".into()));
        }
        serde_json::from_str(&text)
            .map_err(|e| PrmsError::Decode(format!("invalid JSON response: {e}")))
    }
}

/// `error` (or `message`) of a JSON body sent along with a 4xx status.
fn rejection_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|message| !message.trim().is_empty())
        .map(str::to_owned)
}
