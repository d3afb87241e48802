use async_trait::async_trait;

use super::error::ProviderError;

/// Correlation metadata attached to every intent so webhook deliveries can be
/// tied back to local records without trusting anything else in the payload.
#[derive(Debug, Clone)]
pub struct IntentMetadata {
    pub payment_id: i32,
    pub event_id: i32,
    pub user_id: i32,
}

/// A payment intent created at the provider.
#[derive(Debug, Clone)]
pub struct ProviderIntent {
    /// Provider-side intent id (`pi_...`).
    pub id: String,
    /// Client secret the frontend uses to confirm the charge.
    pub client_secret: String,
}

/// Abstraction over the external payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a trackable payment intent for `amount` in the smallest
    /// currency unit, carrying `metadata` for webhook correlation.
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<ProviderIntent, ProviderError>;
}
