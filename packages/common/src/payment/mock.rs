//! In-memory provider for development and tests.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::Rng;

use super::error::ProviderError;
use super::provider::{IntentMetadata, PaymentProvider, ProviderIntent};

/// A recorded `create_intent` call.
#[derive(Debug, Clone)]
pub struct RecordedIntent {
    pub intent_id: String,
    pub amount: i64,
    pub currency: String,
    pub payment_id: i32,
    pub event_id: i32,
    pub user_id: i32,
}

/// Provider stand-in that fabricates intent ids locally.
///
/// Records every call so tests can assert on the amounts and metadata the
/// server sent, and can be flipped into a failing mode to exercise the
/// upstream-error path.
#[derive(Default)]
pub struct MockProvider {
    calls: Mutex<Vec<RecordedIntent>>,
    fail: Mutex<bool>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `create_intent` calls fail as rejected.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn recorded(&self) -> Vec<RecordedIntent> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<ProviderIntent, ProviderError> {
        if *self.fail.lock().unwrap() {
            return Err(ProviderError::Rejected("mock provider failure".into()));
        }

        let suffix: u64 = rand::rng().random();
        let id = format!("pi_mock_{suffix:016x}");
        self.calls.lock().unwrap().push(RecordedIntent {
            intent_id: id.clone(),
            amount,
            currency: currency.to_string(),
            payment_id: metadata.payment_id,
            event_id: metadata.event_id,
            user_id: metadata.user_id,
        });

        Ok(ProviderIntent {
            client_secret: format!("{id}_secret"),
            id,
        })
    }
}
