//! Identity service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::identity::{
        errors::IdentityServiceError,
        models::{CustomerProfile, CustomerUuid, NewCustomer, NewProducer, Producer, ProducerUuid},
        repository::PgIdentityRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgIdentityService {
    db: Db,
    repository: PgIdentityRepository,
}

impl PgIdentityService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgIdentityRepository::new(),
        }
    }
}

#[async_trait]
impl IdentityService for PgIdentityService {
    async fn create_customer(
        &self,
        customer: NewCustomer,
    ) -> Result<CustomerProfile, IdentityServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_customer(&mut tx, customer).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_customer(
        &self,
        customer: CustomerUuid,
    ) -> Result<CustomerProfile, IdentityServiceError> {
        let mut tx = self.db.begin().await?;

        let profile = self.repository.get_customer(&mut tx, customer).await?;

        tx.commit().await?;

        Ok(profile)
    }

    async fn create_producer(
        &self,
        producer: NewProducer,
    ) -> Result<Producer, IdentityServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self.repository.create_producer(&mut tx, producer).await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_producer(&self, producer: ProducerUuid) -> Result<Producer, IdentityServiceError> {
        let mut tx = self.db.begin().await?;

        let found = self.repository.get_producer(&mut tx, producer).await?;

        tx.commit().await?;

        Ok(found)
    }
}

#[automock]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Creates a customer profile.
    async fn create_customer(
        &self,
        customer: NewCustomer,
    ) -> Result<CustomerProfile, IdentityServiceError>;

    /// Retrieve a customer profile.
    async fn get_customer(
        &self,
        customer: CustomerUuid,
    ) -> Result<CustomerProfile, IdentityServiceError>;

    /// Creates a producer profile.
    async fn create_producer(
        &self,
        producer: NewProducer,
    ) -> Result<Producer, IdentityServiceError>;

    /// Retrieve a producer profile.
    async fn get_producer(&self, producer: ProducerUuid)
    -> Result<Producer, IdentityServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn create_and_get_customer() -> TestResult {
        let ctx = TestContext::new().await;
        let uuid = CustomerUuid::generate();

        ctx.identity
            .create_customer(NewCustomer {
                uuid,
                street: "12 Harbourside".to_string(),
                city: "Bristol".to_string(),
                state: String::new(),
                country: "UK".to_string(),
                postcode: "BS1 4DJ".to_string(),
            })
            .await?;

        let profile = ctx.identity.get_customer(uuid).await?;

        assert_eq!(profile.uuid, uuid);
        assert_eq!(profile.delivery_address(), "12 Harbourside, Bristol, UK");
        assert_eq!(profile.postcode, "BS1 4DJ");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_customer_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.identity.get_customer(CustomerUuid::generate()).await;

        assert!(
            matches!(result, Err(IdentityServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn duplicate_producer_uuid_already_exists() -> TestResult {
        let ctx = TestContext::new().await;
        let uuid = ProducerUuid::generate();

        ctx.identity
            .create_producer(NewProducer {
                uuid,
                business_name: "Severn Orchard".to_string(),
            })
            .await?;

        let result = ctx
            .identity
            .create_producer(NewProducer {
                uuid,
                business_name: "Severn Orchard".to_string(),
            })
            .await;

        assert!(
            matches!(result, Err(IdentityServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }
}
