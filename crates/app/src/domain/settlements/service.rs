//! Settlements service.

use async_trait::async_trait;
use mockall::automock;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        identity::models::ProducerUuid,
        settlements::{
            errors::SettlementsServiceError,
            models::{ProducerSettlement, SettlementPeriod, SettlementStatus, SettlementUuid},
            repository::PgSettlementsRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgSettlementsService {
    db: Db,
    repository: PgSettlementsRepository,
}

impl PgSettlementsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgSettlementsRepository::new(),
        }
    }

    fn check_period(period: SettlementPeriod) -> Result<(), SettlementsServiceError> {
        if period.is_valid() {
            Ok(())
        } else {
            Err(SettlementsServiceError::InvalidPeriod {
                start: period.start,
                end: period.end,
            })
        }
    }
}

#[async_trait]
impl SettlementsService for PgSettlementsService {
    async fn settle_producer(
        &self,
        producer: ProducerUuid,
        period: SettlementPeriod,
    ) -> Result<ProducerSettlement, SettlementsServiceError> {
        Self::check_period(period)?;

        let mut tx = self.db.begin().await?;

        let totals = self
            .repository
            .aggregate_producer_period(&mut tx, producer, period)
            .await?;

        let settlement = self
            .repository
            .upsert_settlement(&mut tx, SettlementUuid::generate(), producer, period, totals)
            .await?;

        tx.commit().await?;

        info!(
            settlement = %settlement.uuid,
            producer = %producer,
            period_start = %period.start,
            order_count = settlement.order_count,
            payout_pence = settlement.payout_pence,
            "producer settled"
        );

        Ok(settlement)
    }

    async fn settle_all(
        &self,
        period: SettlementPeriod,
    ) -> Result<Vec<ProducerSettlement>, SettlementsServiceError> {
        Self::check_period(period)?;

        let mut tx = self.db.begin().await?;
        let producers = self.repository.producers_with_orders(&mut tx, period).await?;
        tx.commit().await?;

        // One transaction per producer: a failure for one producer
        // leaves the others' settlements in place and retryable.
        let mut settlements = Vec::with_capacity(producers.len());

        for producer in producers {
            settlements.push(self.settle_producer(producer, period).await?);
        }

        Ok(settlements)
    }

    async fn mark_paid(
        &self,
        settlement: SettlementUuid,
        payment_reference: &str,
    ) -> Result<ProducerSettlement, SettlementsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(paid) = self
            .repository
            .mark_paid(&mut tx, settlement, payment_reference)
            .await?
        else {
            // Distinguish a missing settlement from a double payout.
            let existing = self.repository.get_settlement(&mut tx, settlement).await?;

            return Err(match existing {
                Some(s) if s.status == SettlementStatus::Paid => {
                    SettlementsServiceError::AlreadyPaid
                }
                _ => SettlementsServiceError::NotFound,
            });
        };

        tx.commit().await?;

        info!(
            settlement = %settlement,
            payment_reference,
            "settlement paid"
        );

        Ok(paid)
    }

    async fn get_settlement(
        &self,
        settlement: SettlementUuid,
    ) -> Result<ProducerSettlement, SettlementsServiceError> {
        let mut tx = self.db.begin().await?;

        let settlement = self
            .repository
            .get_settlement(&mut tx, settlement)
            .await?
            .ok_or(SettlementsServiceError::NotFound)?;

        tx.commit().await?;

        Ok(settlement)
    }
}

#[automock]
#[async_trait]
pub trait SettlementsService: Send + Sync {
    /// Compute one producer's totals over the period, from non-cancelled
    /// sub-orders delivered within it, and upsert the settlement row.
    /// Re-running recomputes in place; it never appends a second row.
    async fn settle_producer(
        &self,
        producer: ProducerUuid,
        period: SettlementPeriod,
    ) -> Result<ProducerSettlement, SettlementsServiceError>;

    /// Settle every producer with qualifying sub-orders in the period.
    async fn settle_all(
        &self,
        period: SettlementPeriod,
    ) -> Result<Vec<ProducerSettlement>, SettlementsServiceError>;

    /// Record the payout: pending becomes paid, with reference and
    /// timestamp. Paying twice is rejected.
    async fn mark_paid(
        &self,
        settlement: SettlementUuid,
        payment_reference: &str,
    ) -> Result<ProducerSettlement, SettlementsServiceError>;

    async fn get_settlement(
        &self,
        settlement: SettlementUuid,
    ) -> Result<ProducerSettlement, SettlementsServiceError>;
}
