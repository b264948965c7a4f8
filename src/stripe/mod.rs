//! Stripe integration via REST API (no SDK dependency)

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const API_BASE: &str = "https://api.stripe.com/v1";

/// Outbound Stripe calls must never hang a request indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Webhook events older than this are rejected to prevent replay attacks.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Payment intent as returned by the Stripe API (subset of fields we use)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn client() -> Result<reqwest::Client, BoxError> {
    Ok(reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

/// Create a payment intent
///
/// `metadata` entries become `metadata[key]` form fields; the server-authored
/// metadata is read back verbatim at confirmation time.
pub async fn create_payment_intent(
    secret_key: &str,
    amount: i64,
    currency: &str,
    metadata: &[(&str, &str)],
) -> Result<PaymentIntent, BoxError> {
    let amount = amount.to_string();
    let mut form: Vec<(String, String)> = vec![
        ("amount".into(), amount),
        ("currency".into(), currency.to_string()),
        ("payment_method_types[0]".into(), "card".into()),
    ];
    for (key, value) in metadata {
        form.push((format!("metadata[{key}]"), value.to_string()));
    }

    let resp = client()?
        .post(format!("{API_BASE}/payment_intents"))
        .basic_auth(secret_key, None::<&str>)
        .form(&form)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(format!("Stripe create_payment_intent failed ({status}): {body}").into());
    }

    Ok(resp.json().await?)
}

/// Retrieve the current state of a payment intent
///
/// The provider is the only trusted source for intent status; no local cache
/// of it exists.
pub async fn retrieve_payment_intent(
    secret_key: &str,
    payment_intent_id: &str,
) -> Result<PaymentIntent, BoxError> {
    let resp = client()?
        .get(format!("{API_BASE}/payment_intents/{payment_intent_id}"))
        .basic_auth(secret_key, None::<&str>)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(format!("Stripe retrieve_payment_intent failed ({status}): {body}").into());
    }

    Ok(resp.json().await?)
}

/// Verify a Stripe webhook signature (HMAC-SHA256)
///
/// The `Stripe-Signature` header carries `t=<unix seconds>` and one or more
/// `v1=<hex hmac>` entries; the signed payload is `"{t}.{raw body}"`.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err("Webhook timestamp outside tolerance");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &[u8], timestamp: i64, secret: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;
        let header = sign(payload, chrono::Utc::now().timestamp(), SECRET);
        assert!(verify_webhook_signature(payload, &header, SECRET).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, chrono::Utc::now().timestamp(), SECRET);
        let tampered = br#"{"id":"evt_2"}"#;
        assert!(verify_webhook_signature(tampered, &header, SECRET).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign(payload, chrono::Utc::now().timestamp(), "whsec_other");
        assert!(verify_webhook_signature(payload, &header, SECRET).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        let old = chrono::Utc::now().timestamp() - SIGNATURE_TOLERANCE_SECS - 60;
        let header = sign(payload, old, SECRET);
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET),
            Err("Webhook timestamp outside tolerance")
        );
    }

    #[test]
    fn test_malformed_header_rejected() {
        let payload = br#"{"id":"evt_1"}"#;
        assert!(verify_webhook_signature(payload, "", SECRET).is_err());
        assert!(verify_webhook_signature(payload, "t=123", SECRET).is_err());
        assert!(verify_webhook_signature(payload, "v1=abcd", SECRET).is_err());
        assert!(verify_webhook_signature(payload, "t=123,v1=not-hex!", SECRET).is_err());
    }

    #[test]
    fn test_payment_intent_deserialize() {
        let json = r#"{
            "id": "pi_123",
            "status": "succeeded",
            "amount": 3500,
            "currency": "usd",
            "client_secret": "pi_123_secret_abc",
            "metadata": {"user_id": "7", "customer_email": "a@b.com"}
        }"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.status, "succeeded");
        assert_eq!(intent.amount, 3500);
        assert_eq!(intent.metadata.get("user_id").unwrap(), "7");
    }

    #[test]
    fn test_payment_intent_missing_metadata_defaults_empty() {
        let json = r#"{"id":"pi_1","status":"succeeded","amount":50,"currency":"usd","client_secret":null}"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert!(intent.metadata.is_empty());
        assert!(intent.client_secret.is_none());
    }
}
