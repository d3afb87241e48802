//! Payment-provider integration.
//!
//! The server talks to the provider exclusively through the [`PaymentProvider`]
//! trait so that tests can swap in [`mock::MockProvider`]. The real backend is
//! [`stripe::StripeProvider`], a thin client over the PaymentIntents REST API.
//! Webhook signature verification lives in [`webhook`] and operates on the raw
//! request bytes only.

pub mod config;
pub mod error;
pub mod mock;
pub mod provider;
pub mod stripe;
pub mod webhook;

pub use config::PaymentConfig;
pub use error::ProviderError;
pub use provider::{IntentMetadata, PaymentProvider, ProviderIntent};
