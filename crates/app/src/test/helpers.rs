//! Test Helpers

use jiff::{Span, Timestamp, civil::Date};

use harvest::lead_time::LeadTime;

use crate::{
    domain::{
        identity::{
            models::{CustomerUuid, NewCustomer, NewProducer, ProducerUuid},
            service::IdentityService,
        },
        products::{
            models::{NewProduct, Product, ProductUuid},
            service::ProductsService,
        },
    },
    test::TestContext,
};

/// Today's civil date in the zone checkout validates against.
pub(crate) fn today() -> Date {
    LeadTime::uk().local_date(Timestamp::now())
}

/// A delivery date comfortably past the 48 hour minimum.
pub(crate) fn delivery_date() -> Date {
    today().saturating_add(Span::new().days(4))
}

pub(crate) async fn create_customer(
    ctx: &TestContext,
) -> Result<CustomerUuid, Box<dyn std::error::Error>> {
    let uuid = CustomerUuid::generate();

    ctx.identity
        .create_customer(NewCustomer {
            uuid,
            street: "12 Harbourside".to_string(),
            city: "Bristol".to_string(),
            state: "".to_string(),
            country: "UK".to_string(),
            postcode: "BS1 4DJ".to_string(),
        })
        .await?;

    Ok(uuid)
}

pub(crate) async fn create_producer(
    ctx: &TestContext,
) -> Result<ProducerUuid, Box<dyn std::error::Error>> {
    let uuid = ProducerUuid::generate();

    ctx.identity
        .create_producer(NewProducer {
            uuid,
            business_name: "Windmill Hill Farm".to_string(),
        })
        .await?;

    Ok(uuid)
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    producer: Option<ProducerUuid>,
    price_pence: u64,
    stock_qty: u64,
) -> Result<Product, Box<dyn std::error::Error>> {
    let product = ctx
        .products
        .create_product(NewProduct {
            uuid: ProductUuid::generate(),
            producer,
            name: "Produce".to_string(),
            unit: "kg".to_string(),
            price_pence,
            stock_qty,
        })
        .await?;

    Ok(product)
}
