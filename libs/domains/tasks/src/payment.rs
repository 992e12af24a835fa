//! Payment provider seam. Card capture happens client-side with the
//! provider's widget; the server only creates intents and records what the
//! provider reports back through the webhook.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};

/// Header carrying the hex HMAC-SHA256 of the raw webhook body
pub const SIGNATURE_HEADER: &str = "x-payment-signature";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    pub task_id: Uuid,
    pub milestone_id: Uuid,
    pub payer_id: Uuid,
    /// Minor currency units
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Provider-side id, echoed by the webhook
    pub reference: String,
    pub client_secret: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: IntentRequest) -> TaskResult<PaymentIntent>;
}

/// Gateway that mints references locally. Settlement arrives through the
/// regular webhook endpoint.
#[derive(Debug, Clone, Default)]
pub struct InProcessGateway {
    return_url: Option<String>,
}

impl InProcessGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_return_url(mut self, url: impl Into<String>) -> Self {
        self.return_url = Some(url.into());
        self
    }
}

#[async_trait]
impl PaymentGateway for InProcessGateway {
    async fn create_intent(&self, request: IntentRequest) -> TaskResult<PaymentIntent> {
        let reference = format!("pi_{}", Uuid::new_v4().simple());
        let client_secret = format!("{}_secret_{}", reference, Uuid::new_v4().simple());

        tracing::info!(
            reference = %reference,
            milestone_id = %request.milestone_id,
            amount = request.amount,
            return_url = self.return_url.as_deref().unwrap_or("-"),
            "Created payment intent"
        );

        Ok(PaymentIntent {
            reference,
            client_secret,
        })
    }
}

/// Authenticates payment provider callbacks with a shared secret.
///
/// Without a secret every callback is refused.
#[derive(Clone, Default)]
pub struct WebhookVerifier {
    secret: Option<Vec<u8>>,
}

impl WebhookVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Some(secret.as_ref().to_vec()),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    fn mac(&self) -> TaskResult<Hmac<Sha256>> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| TaskError::Unauthorized("Payment webhook is not configured".into()))?;
        Hmac::<Sha256>::new_from_slice(secret)
            .map_err(|e| TaskError::Internal(format!("Invalid webhook secret: {}", e)))
    }

    /// Hex signature for `body`, as the provider computes it.
    pub fn sign(&self, body: &[u8]) -> TaskResult<String> {
        let mut mac = self.mac()?;
        mac.update(body);
        Ok(const_hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of `signature` against the body.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> TaskResult<()> {
        let mut mac = self.mac()?;
        let expected = signature
            .and_then(|s| const_hex::decode(s.trim()).ok())
            .ok_or_else(|| TaskError::Unauthorized("Missing or malformed webhook signature".into()))?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| TaskError::Unauthorized("Webhook signature mismatch".into()))
    }
}

// Secret stays out of logs
impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
