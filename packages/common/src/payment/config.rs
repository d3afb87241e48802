use serde::Deserialize;

/// Payment-provider configuration, loaded with the rest of the app config.
#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    /// Provider API secret key (`sk_...`).
    pub secret_key: String,
    /// Shared secret for webhook signature verification (`whsec_...`).
    pub webhook_secret: String,
    /// ISO currency code used for all charges. Default: "inr".
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Maximum accepted age of a signed webhook timestamp, in seconds.
    /// Default: 300.
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,
}

fn default_currency() -> String {
    "inr".into()
}

fn default_webhook_tolerance() -> i64 {
    300
}
