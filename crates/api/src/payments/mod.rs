//! Payment gateway integration.
//!
//! Checkout talks to the gateway through the [`PaymentGateway`] trait so the
//! order service can be exercised without network access. The production
//! implementation is [`BraintreeClient`].

pub mod braintree;

use std::future::Future;

use serde::Serialize;
use thiserror::Error;

use bazaar_core::Price;

pub use braintree::BraintreeClient;

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success HTTP status.
    #[error("gateway responded with HTTP {0}")]
    Status(u16),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQL(Vec<String>),

    /// The transaction was created but not approved.
    #[error("transaction {id} was not approved (status {status})")]
    Declined {
        /// Gateway transaction ID.
        id: String,
        /// Gateway transaction status.
        status: String,
    },

    /// The response was missing data the request should produce.
    #[error("malformed gateway response: {0}")]
    Malformed(String),
}

/// A one-time token the browser drop-in uses to tokenize a payment method.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientToken {
    pub client_token: String,
}

/// A settled sale transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Gateway transaction ID.
    pub id: String,
    /// Gateway transaction status, e.g. `SUBMITTED_FOR_SETTLEMENT`.
    pub status: String,
    /// Charged amount with two decimal places.
    pub amount: String,
    /// ISO currency code of the charged amount.
    pub currency_iso_code: Option<String>,
}

impl Sale {
    /// The payment record stored on the order.
    #[must_use]
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "transaction": self,
        })
    }
}

/// A payment processor able to issue client tokens and charge payment methods.
pub trait PaymentGateway: Send + Sync {
    /// Request a one-time client token.
    fn client_token(&self) -> impl Future<Output = Result<ClientToken, GatewayError>> + Send;

    /// Charge a tokenized payment method and submit it for settlement.
    fn charge(
        &self,
        nonce: &str,
        amount: Price,
    ) -> impl Future<Output = Result<Sale, GatewayError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_record_shape() {
        let sale = Sale {
            id: "txn_1".to_owned(),
            status: "SUBMITTED_FOR_SETTLEMENT".to_owned(),
            amount: "25.00".to_owned(),
            currency_iso_code: Some("USD".to_owned()),
        };

        let record = sale.to_record();
        assert_eq!(record["success"], true);
        assert_eq!(record["transaction"]["id"], "txn_1");
        assert_eq!(record["transaction"]["amount"], "25.00");
        assert_eq!(record["transaction"]["currencyIsoCode"], "USD");
    }

    #[test]
    fn test_graphql_error_display_joins_messages() {
        let err = GatewayError::GraphQL(vec!["first".to_owned(), "second".to_owned()]);
        assert_eq!(err.to_string(), "GraphQL errors: first; second");
    }
}
