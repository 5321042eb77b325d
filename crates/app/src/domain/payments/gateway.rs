//! Payment gateway seam.
//!
//! Real gateways sit behind [`PaymentGateway`]; [`MockGateway`] is the
//! deterministic stand-in used in development and testing.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::orders::models::OrderUuid;

/// Outcome of a gateway call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Authorised,
    Captured,
    Failed,
}

/// Result of an authorisation attempt.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// Gateway-issued reference for the held funds.
    pub reference: String,
    pub status: GatewayStatus,
}

/// Result of a capture attempt.
#[derive(Debug, Clone)]
pub struct Capture {
    pub status: GatewayStatus,
}

/// Raised when the gateway itself is unreachable or misbehaving, as
/// opposed to an orderly decline.
#[derive(Debug, Error)]
#[error("gateway {gateway} error: {message}")]
pub struct GatewayError {
    pub gateway: String,
    pub message: String,
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Name recorded on each transaction row.
    fn name(&self) -> &str;

    /// Place a hold for `amount_pence` against the order and return
    /// the reference.
    async fn initiate(
        &self,
        amount_pence: u64,
        order: OrderUuid,
    ) -> Result<Authorization, GatewayError>;

    /// Capture previously held funds.
    async fn capture(&self, reference: &str) -> Result<Capture, GatewayError>;
}

/// Always-succeeding gateway issuing `MOCK-` prefixed references.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockGateway;

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn initiate(
        &self,
        _amount_pence: u64,
        _order: OrderUuid,
    ) -> Result<Authorization, GatewayError> {
        Ok(Authorization {
            reference: format!("MOCK-{}", Uuid::now_v7()),
            status: GatewayStatus::Authorised,
        })
    }

    async fn capture(&self, _reference: &str) -> Result<Capture, GatewayError> {
        Ok(Capture {
            status: GatewayStatus::Captured,
        })
    }
}
