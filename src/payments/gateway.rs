use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    /// Gateway-side reference for the payment attempt.
    #[serde(rename = "paymentReference")]
    payment_reference: String,
}

/// Client for the third-party payment gateway.
///
/// The outbound call is bounded by a timeout so a hung gateway never leaves
/// a transaction PENDING indefinitely: the caller marks it FAILED on any
/// error from here.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Register a payment attempt with the gateway. The gateway later calls
    /// our webhook with the terminal status for this order id.
    pub async fn create_payment(
        &self,
        order_id: &str,
        amount_cents: i64,
        payer_name: &str,
        phone_number: Option<&str>,
        callback_url: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/payments", self.base_url))
            .json(&serde_json::json!({
                "orderId": order_id,
                "amountCents": amount_cents,
                "payerName": payer_name,
                "phoneNumber": phone_number,
                "callbackUrl": callback_url,
            }))
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Gateway request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "Gateway returned {}: {}",
                status, body
            )));
        }

        let payment: CreatePaymentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse gateway response: {}", e)))?;

        Ok(payment.payment_reference)
    }
}

/// Verify the hex HMAC-SHA256 signature the gateway puts on webhook bodies.
/// Comparison is constant-time.
pub fn verify_webhook_signature(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    let provided = match decode_hex(signature_hex) {
        Some(bytes) => bytes,
        None => return false,
    };

    expected.ct_eq(provided.as_slice()).into()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
