//! Checkout through the payment gateway.
//!
//! The charged total is always computed from stored product prices; whatever
//! the client sent alongside the cart ids is ignored. The buyer must still
//! exist before anything is charged, and no order is written unless the
//! gateway settles the sale.

use std::collections::HashMap;

use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{OrderId, Price, ProductId, UserId, parse_id};

use super::OrderError;
use crate::db::UserRepository;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::payments::{ClientToken, PaymentGateway, Sale};
use crate::services::non_blank;

/// One cart line. Only the product id is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

/// Payment request body.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentForm {
    pub nonce: Option<String>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
}

/// The outcome of a successful checkout.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub order_id: OrderId,
    pub sale: Sale,
}

/// Checkout service, generic over the payment gateway.
pub struct CheckoutService<'a, G> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
    gateway: &'a G,
}

impl<'a, G: PaymentGateway> CheckoutService<'a, G> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, gateway: &'a G) -> Self {
        Self {
            users: UserRepository::new(pool),
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
            gateway,
        }
    }

    /// Request a client token for the browser drop-in.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Gateway` if the gateway call fails.
    #[instrument(skip(self))]
    pub async fn client_token(&self) -> Result<ClientToken, OrderError> {
        Ok(self.gateway.client_token().await?)
    }

    /// Charge the cart and record the order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` if the nonce is missing, the cart is
    /// empty, or a cart line names an unknown product.
    /// Returns `OrderError::UnknownBuyer` if the buyer's account is gone.
    /// Returns `OrderError::Gateway` if the charge fails; no order is written.
    #[instrument(skip(self, form), fields(cart_len = form.cart.len()))]
    pub async fn checkout(&self, buyer: UserId, form: &PaymentForm) -> Result<Receipt, OrderError> {
        let nonce = non_blank(form.nonce.as_deref())
            .ok_or_else(|| OrderError::Validation("Payment nonce is required".into()))?;
        let product_ids = cart_product_ids(&form.cart)?;

        if self.users.get_by_id(buyer).await?.is_none() {
            return Err(OrderError::UnknownBuyer);
        }

        let prices = self.products.prices(&product_ids).await?;
        let total = cart_total(&product_ids, &prices)?;

        let sale = self.gateway.charge(nonce, total).await.map_err(|e| {
            tracing::warn!(error = %e, total = %total, "Payment failed");
            OrderError::from(e)
        })?;

        let order_id = self
            .orders
            .create(buyer, &product_ids, &sale.to_record())
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    transaction_id = %sale.id,
                    total = %total,
                    "Payment settled but order was not recorded"
                );
                OrderError::from(e)
            })?;

        tracing::info!(order_id = %order_id, transaction_id = %sale.id, total = %total, "Order placed");
        Ok(Receipt { order_id, sale })
    }
}

/// Parse cart ids in order. Repeated ids are kept.
fn cart_product_ids(cart: &[CartItem]) -> Result<Vec<ProductId>, OrderError> {
    if cart.is_empty() {
        return Err(OrderError::Validation("Cart is empty".into()));
    }

    cart.iter()
        .map(|item| {
            item.id
                .as_deref()
                .and_then(parse_id::<ProductId>)
                .ok_or_else(unknown_product)
        })
        .collect()
}

/// Sum stored prices; a product listed twice is charged twice.
fn cart_total(
    product_ids: &[ProductId],
    prices: &HashMap<ProductId, Price>,
) -> Result<Price, OrderError> {
    let line_prices = product_ids
        .iter()
        .map(|id| prices.get(id).copied().ok_or_else(unknown_product))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Price::sum(line_prices))
}

fn unknown_product() -> OrderError {
    OrderError::Validation("Cart contains an unknown product".into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &ProductId) -> CartItem {
        CartItem {
            id: Some(id.to_string()),
        }
    }

    #[test]
    fn test_total_uses_stored_prices() {
        let mug = ProductId::generate();
        let bowl = ProductId::generate();
        let prices = HashMap::from([
            (mug, Price::parse("10").unwrap()),
            (bowl, Price::parse("15").unwrap()),
        ]);

        let total = cart_total(&[mug, bowl], &prices).unwrap();
        assert_eq!(total.to_gateway_amount(), "25.00");
    }

    #[test]
    fn test_repeated_product_is_charged_twice() {
        let mug = ProductId::generate();
        let prices = HashMap::from([(mug, Price::parse("10").unwrap())]);

        let ids = cart_product_ids(&[item(&mug), item(&mug)]).unwrap();
        assert_eq!(ids, vec![mug, mug]);
        assert_eq!(cart_total(&ids, &prices).unwrap().to_gateway_amount(), "20.00");
    }

    #[test]
    fn test_unknown_product_is_rejected() {
        let prices = HashMap::new();
        assert!(matches!(
            cart_total(&[ProductId::generate()], &prices),
            Err(OrderError::Validation(_))
        ));
        assert!(matches!(
            cart_product_ids(&[CartItem { id: Some("abc".into()) }]),
            Err(OrderError::Validation(_))
        ));
        assert!(matches!(
            cart_product_ids(&[CartItem::default()]),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        assert!(matches!(
            cart_product_ids(&[]),
            Err(OrderError::Validation(ref m)) if m == "Cart is empty"
        ));
    }

    #[test]
    fn test_cart_item_ignores_client_fields() {
        let form: PaymentForm = serde_json::from_str(
            r#"{"nonce":"fake-valid-nonce","cart":[{"_id":"6f1c","name":"Mug","price":0.01}]}"#,
        )
        .unwrap();
        assert_eq!(form.cart.len(), 1);
        assert_eq!(form.cart[0].id.as_deref(), Some("6f1c"));
    }
}
