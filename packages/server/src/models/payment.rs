use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePaymentIntentRequest {
    pub event_id: i32,
    /// Number of tickets; defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    /// Registration form data echoed onto the ledger entry at settlement.
    pub registration_data: Option<serde_json::Value>,
}

fn default_quantity() -> i32 {
    1
}

pub fn validate_create_payment_intent(payload: &CreatePaymentIntentRequest) -> Result<(), AppError> {
    if payload.quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".into()));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreatePaymentIntentResponse {
    /// Secret the client uses to confirm the charge with the provider.
    pub client_secret: String,
    pub payment_id: i32,
}

/// Client-side settlement fallback for when webhook delivery is delayed or
/// unavailable.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ConfirmPaymentRequest {
    /// Provider-side intent id (`pi_...`).
    pub payment_intent_id: String,
    pub receipt_url: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub event_id: i32,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    pub quantity: i32,
    pub status: String,
    pub receipt_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::payment::Model> for PaymentResponse {
    fn from(m: crate::entity::payment::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            amount: m.amount,
            currency: m.currency,
            quantity: m.quantity,
            status: m.status,
            receipt_url: m.receipt_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Convert a whole-currency-unit price to a smallest-unit charge amount.
pub fn charge_amount(price: i64, quantity: i32) -> i64 {
    price * 100 * quantity as i64
}
