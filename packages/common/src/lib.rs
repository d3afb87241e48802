pub mod payment;

pub use payment::{PaymentProvider, ProviderError, ProviderIntent};
