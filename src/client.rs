//! Talking to the calculation backend.
//!
//! [`Backend`] is the seam the calculator dispatches through. [`HttpBackend`]
//! is the real implementation: one HTTP request per calculation against the
//! endpoints listed on [`CalcRequest::path`].

use async_trait::async_trait;

use crate::error::CalcError;
use crate::modes::{CalcOutcome, CalcRequest};

#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, request: &CalcRequest) -> Result<CalcOutcome, CalcError>;
}

#[cfg(feature = "web")]
pub use remote::HttpBackend;

#[cfg(feature = "web")]
mod remote {
    use async_trait::async_trait;
    use log::{debug, warn};
    use std::time::Duration;

    use super::Backend;
    use crate::config::Config;
    use crate::error::CalcError;
    use crate::modes::{ApiResponse, CalcOutcome, CalcRequest, render_detail};

    #[derive(Debug, Clone)]
    pub struct HttpBackend {
        client: reqwest::Client,
        base_url: String,
    }

    impl HttpBackend {
        pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CalcError> {
            let client = reqwest::Client::builder().timeout(timeout).build()?;
            Ok(HttpBackend {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
            })
        }

        pub fn from_config(config: &Config) -> Result<Self, CalcError> {
            Self::new(
                &config.base_url,
                Duration::from_secs(config.request_timeout_secs),
            )
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        fn url(&self, request: &CalcRequest) -> String {
            format!("{}{}", self.base_url, request.path())
        }
    }

    #[async_trait]
    impl Backend for HttpBackend {
        async fn execute(&self, request: &CalcRequest) -> Result<CalcOutcome, CalcError> {
            let url = self.url(request);
            let builder = match request.body() {
                Some(body) => self.client.post(&url).json(&body),
                None => self.client.get(&url).query(&request.query()),
            };

            debug!("sending {} request to {}", request.mode(), url);
            let response = builder.send().await?;
            let status = response.status();
            let text = response.text().await?;

            if !status.is_success() {
                warn!("{} answered {}: {}", url, status, text);
                return Err(CalcError::Backend(error_message(status, &text)));
            }

            let envelope: ApiResponse = serde_json::from_str(&text)
                .map_err(|e| CalcError::MalformedResponse(format!("{}: {}", e, text)))?;
            envelope.into_outcome()
        }
    }

    /// Best effort: use the JSON `error`/`detail` field, else the status line.
    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let field = parsed.as_ref().and_then(|v| {
            v.get("error")
                .and_then(|e| e.as_str().map(str::to_string))
                .or_else(|| v.get("detail").map(render_detail))
        });
        match field {
            Some(message) => message,
            None => format!("HTTP {}", status),
        }
    }

}
