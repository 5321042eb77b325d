//! Identity Models

use jiff::Timestamp;

use crate::uuids::TypedUuid;

/// Closed set of roles an authenticated user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Producer,
    Admin,
}

/// Actor UUID
pub type ActorUuid = TypedUuid<Actor>;

/// An authenticated user, resolved once at the boundary before any
/// domain operation runs.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub uuid: ActorUuid,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub const fn new(uuid: ActorUuid, role: Role) -> Self {
        Self { uuid, role }
    }

    /// Checks that the actor holds one of the given roles.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Forbidden`](super::errors::AccessError)
    /// when it does not.
    pub fn require(&self, roles: &[Role]) -> Result<&Self, super::errors::AccessError> {
        if roles.contains(&self.role) {
            Ok(self)
        } else {
            Err(super::errors::AccessError::Forbidden { held: self.role })
        }
    }
}

/// Customer UUID
pub type CustomerUuid = TypedUuid<CustomerProfile>;

/// Customer profile; the source of the delivery-address snapshot taken
/// at checkout.
#[derive(Debug, Clone)]
pub struct CustomerProfile {
    pub uuid: CustomerUuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postcode: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CustomerProfile {
    /// The address line snapshotted onto orders: non-blank parts of
    /// street, city, state and country, comma-joined. The postcode is
    /// carried separately.
    #[must_use]
    pub fn delivery_address(&self) -> String {
        [&self.street, &self.city, &self.state, &self.country]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// New Customer Model
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub uuid: CustomerUuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postcode: String,
}

/// Producer UUID
pub type ProducerUuid = TypedUuid<Producer>;

/// Producer Model
#[derive(Debug, Clone)]
pub struct Producer {
    pub uuid: ProducerUuid,
    pub business_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Producer Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewProducer {
    pub uuid: ProducerUuid,
    pub business_name: String,
}
