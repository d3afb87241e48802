use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use super::error::ProviderError;
use super::provider::{IntentMetadata, PaymentProvider, ProviderIntent};

const API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe PaymentIntents client.
///
/// Only the single call the reconciliation flow needs is implemented; the
/// rest of the lifecycle (confirmation, capture) happens on the client side
/// or arrives via webhook.
pub struct StripeProvider {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeProvider {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: API_BASE.to_string(),
        }
    }

    /// Point the client at a different API base (stripe-mock, local stubs).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }
}

#[derive(Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    #[instrument(skip(self), fields(amount, currency))]
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<ProviderIntent, ProviderError> {
        // Stripe's API is form-encoded; metadata uses bracketed keys.
        let params = [
            ("amount", amount.to_string()),
            ("currency", currency.to_string()),
            ("metadata[payment_id]", metadata.payment_id.to_string()),
            ("metadata[event_id]", metadata.event_id.to_string()),
            ("metadata[user_id]", metadata.user_id.to_string()),
        ];

        let res = self
            .client
            .post(format!("{}/payment_intents", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            let intent: IntentResponse = res
                .json()
                .await
                .map_err(|e| ProviderError::Malformed(e.to_string()))?;
            return Ok(ProviderIntent {
                id: intent.id,
                client_secret: intent.client_secret,
            });
        }

        let body = res.text().await.unwrap_or_default();
        if status.is_client_error() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(ProviderError::Rejected(message))
        } else {
            Err(ProviderError::Transport(format!("HTTP {status}: {body}")))
        }
    }
}
