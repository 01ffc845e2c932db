//! Image Generation Provider
//!
//! The `ImageGenerator` trait is the seam between the HTTP handler and the
//! remote model; `ReplicateGenerator` talks to the Replicate predictions API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::GeneratorConfig;
use crate::error::GeneratorError;

/// Default image-to-image model
pub const DEFAULT_MODEL: &str = "black-forest-labs/flux-kontext-pro";

/// Upper bound for the poll backoff
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Input sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Source photo as a data URL
    pub input_image: String,
    pub prompt: String,
    pub aspect_ratio: String,
    pub output_format: String,
    pub safety_tolerance: u8,
    pub seed: u32,
}

impl GenerationRequest {
    /// Portrait trading-card request with a random seed
    pub fn portrait(input_image: String, prompt: String) -> Self {
        Self {
            input_image,
            prompt,
            aspect_ratio: "3:4".to_string(),
            output_format: "png".to_string(),
            safety_tolerance: 2,
            seed: rand::random_range(0..999_999),
        }
    }
}

/// A remote image model
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Model identifier reported to clients
    fn model(&self) -> &str;

    /// Whether the generator has what it needs to make calls
    fn is_configured(&self) -> bool;

    /// Run one generation; `Ok(None)` means the model produced no image
    async fn generate(&self, request: GenerationRequest) -> Result<Option<String>, GeneratorError>;
}

#[derive(Debug, Default, Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
    #[serde(default)]
    cancel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: PredictionUrls,
}

impl Prediction {
    /// `succeeded`, `failed` and `canceled` are final; anything else is still running
    fn is_final(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }
}

/// Replicate predictions API client
#[derive(Debug, Clone)]
pub struct ReplicateGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
    timeout: Duration,
    poll_interval: Duration,
}

impl ReplicateGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
            timeout: Duration::from_secs(config.timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    fn predictions_url(&self) -> String {
        format!("{}/v1/models/{}/predictions", self.base_url, self.model)
    }

    fn prediction_url(&self, prediction: &Prediction) -> String {
        prediction
            .urls
            .get
            .clone()
            .unwrap_or_else(|| format!("{}/v1/predictions/{}", self.base_url, prediction.id))
    }

    async fn read_prediction(response: reqwest::Response) -> Result<Prediction, GeneratorError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Poll until the prediction reaches a final status or `deadline` passes
    async fn wait_for(
        &self,
        token: &str,
        mut prediction: Prediction,
        deadline: Instant,
    ) -> Result<Prediction, GeneratorError> {
        let mut delay = self.poll_interval;

        while !prediction.is_final() {
            if Instant::now() + delay > deadline {
                self.cancel(token, &prediction).await;
                return Err(GeneratorError::Timeout(prediction.id, self.timeout.as_secs()));
            }
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_POLL_INTERVAL.max(self.poll_interval));

            debug!(prediction_id = %prediction.id, status = %prediction.status, "Polling prediction");
            let response = self
                .client
                .get(self.prediction_url(&prediction))
                .bearer_auth(token)
                .send()
                .await?;
            prediction = Self::read_prediction(response).await?;
        }

        Ok(prediction)
    }

    /// Best-effort cancel of a timed-out prediction
    async fn cancel(&self, token: &str, prediction: &Prediction) {
        let url = prediction
            .urls
            .cancel
            .clone()
            .unwrap_or_else(|| format!("{}/v1/predictions/{}/cancel", self.base_url, prediction.id));

        match self.client.post(url).bearer_auth(token).send().await {
            Ok(response) if response.status().is_success() => {
                warn!(prediction_id = %prediction.id, "Canceled prediction after timeout");
            }
            Ok(response) => {
                warn!(prediction_id = %prediction.id, status = %response.status(), "Failed to cancel prediction");
            }
            Err(e) => {
                warn!(prediction_id = %prediction.id, error = %e, "Failed to cancel prediction");
            }
        }
    }
}

#[async_trait]
impl ImageGenerator for ReplicateGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_token.is_some()
    }

    #[instrument(skip_all, fields(model = %self.model, seed = request.seed))]
    async fn generate(&self, request: GenerationRequest) -> Result<Option<String>, GeneratorError> {
        let token = self.api_token.as_deref().ok_or(GeneratorError::MissingToken)?;
        let deadline = Instant::now() + self.timeout;

        let response = self
            .client
            .post(self.predictions_url())
            .bearer_auth(token)
            .header("Prefer", "wait")
            .json(&serde_json::json!({ "input": request }))
            .send()
            .await?;

        let prediction = Self::read_prediction(response).await?;
        let prediction = self.wait_for(token, prediction, deadline).await?;
        debug!(prediction_id = %prediction.id, status = %prediction.status, "Prediction finished");

        if matches!(prediction.status.as_str(), "failed" | "canceled") {
            let message = prediction
                .error
                .map(|e| match e {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .unwrap_or_default();
            return Err(GeneratorError::Prediction(prediction.status, message));
        }

        Ok(extract_image_url(&prediction.output))
    }
}

/// Output is either a URL or a list whose first element is one
pub fn extract_image_url(output: &Value) -> Option<String> {
    match output {
        Value::String(url) if !url.is_empty() => Some(url.clone()),
        Value::Array(items) => items.first().and_then(extract_image_url),
        _ => None,
    }
}
