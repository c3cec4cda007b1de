//! Braintree GraphQL API client.
//!
//! Issues client tokens for the browser drop-in and charges payment-method
//! nonces with immediate settlement.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::instrument;

use bazaar_core::Price;

use super::{ClientToken, GatewayError, PaymentGateway, Sale};
use crate::config::BraintreeConfig;

/// API version sent with every request.
const BRAINTREE_VERSION: &str = "2019-01-01";

const CLIENT_TOKEN_MUTATION: &str = r"
mutation ClientToken {
  createClientToken {
    clientToken
  }
}";

const CHARGE_MUTATION: &str = r"
mutation Charge($input: ChargePaymentMethodInput!) {
  chargePaymentMethod(input: $input) {
    transaction {
      id
      status
      amount {
        value
        currencyCode
      }
    }
  }
}";

/// Transaction statuses that mean the money will move.
const APPROVED_STATUSES: &[&str] = &[
    "AUTHORIZED",
    "SUBMITTED_FOR_SETTLEMENT",
    "SETTLING",
    "SETTLEMENT_PENDING",
    "SETTLED",
];

/// Braintree GraphQL API client.
///
/// Cheap to clone; the HTTP client and credentials are shared.
#[derive(Clone)]
pub struct BraintreeClient {
    inner: Arc<BraintreeClientInner>,
}

struct BraintreeClientInner {
    client: reqwest::Client,
    endpoint: &'static str,
    merchant_id: String,
    /// Precomputed `Basic` authorization header value.
    authorization: SecretString,
}

impl std::fmt::Debug for BraintreeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraintreeClient")
            .field("endpoint", &self.inner.endpoint)
            .field("merchant_id", &self.inner.merchant_id)
            .finish_non_exhaustive()
    }
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientTokenData {
    create_client_token: Option<ClientTokenPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientTokenPayload {
    client_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChargeData {
    charge_payment_method: Option<ChargePayload>,
}

#[derive(Debug, Deserialize)]
struct ChargePayload {
    transaction: Option<TransactionPayload>,
}

#[derive(Debug, Deserialize)]
struct TransactionPayload {
    id: String,
    status: String,
    amount: MoneyPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoneyPayload {
    value: String,
    currency_code: Option<String>,
}

impl BraintreeClient {
    /// Create a client for the configured environment.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BraintreeConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let credentials = format!(
            "{}:{}",
            config.public_key,
            config.private_key.expose_secret()
        );
        let authorization = SecretString::from(format!("Basic {}", STANDARD.encode(credentials)));

        Ok(Self {
            inner: Arc::new(BraintreeClientInner {
                client,
                endpoint: config.environment.graphql_url(),
                merchant_id: config.merchant_id.clone(),
                authorization,
            }),
        })
    }

    /// Execute a GraphQL operation.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, GatewayError> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .inner
            .client
            .post(self.inner.endpoint)
            .header("Authorization", self.inner.authorization.expose_secret())
            .header("Braintree-Version", BRAINTREE_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let graphql_response: GraphQLResponse<T> = response.json().await?;
        into_data(graphql_response)
    }
}

impl PaymentGateway for BraintreeClient {
    #[instrument(skip(self), fields(merchant_id = %self.inner.merchant_id))]
    async fn client_token(&self) -> Result<ClientToken, GatewayError> {
        let data: ClientTokenData = self
            .execute(CLIENT_TOKEN_MUTATION, serde_json::Value::Null)
            .await?;

        data.create_client_token
            .map(|payload| ClientToken {
                client_token: payload.client_token,
            })
            .ok_or_else(|| GatewayError::Malformed("no client token returned".to_owned()))
    }

    #[instrument(skip(self, nonce), fields(merchant_id = %self.inner.merchant_id, amount = %amount))]
    async fn charge(&self, nonce: &str, amount: Price) -> Result<Sale, GatewayError> {
        let variables = serde_json::json!({
            "input": {
                "paymentMethodId": nonce,
                "transaction": {
                    "amount": amount.to_gateway_amount(),
                },
            },
        });

        let data: ChargeData = self.execute(CHARGE_MUTATION, variables).await?;
        let sale = sale_from_charge(data)?;

        tracing::info!(transaction_id = %sale.id, status = %sale.status, "Sale settled");
        Ok(sale)
    }
}

/// Unwrap the `data` member, turning GraphQL errors into `GatewayError`.
fn into_data<T>(response: GraphQLResponse<T>) -> Result<T, GatewayError> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        return Err(GatewayError::GraphQL(
            errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    response
        .data
        .ok_or_else(|| GatewayError::Malformed("no data in response".to_owned()))
}

fn sale_from_charge(data: ChargeData) -> Result<Sale, GatewayError> {
    let transaction = data
        .charge_payment_method
        .and_then(|payload| payload.transaction)
        .ok_or_else(|| GatewayError::Malformed("no transaction returned".to_owned()))?;

    if !APPROVED_STATUSES.contains(&transaction.status.as_str()) {
        return Err(GatewayError::Declined {
            id: transaction.id,
            status: transaction.status,
        });
    }

    Ok(Sale {
        id: transaction.id,
        status: transaction.status,
        amount: transaction.amount.value,
        currency_iso_code: transaction.amount.currency_code,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BraintreeEnvironment;

    fn charge_response(status: &str) -> GraphQLResponse<ChargeData> {
        serde_json::from_value(serde_json::json!({
            "data": {
                "chargePaymentMethod": {
                    "transaction": {
                        "id": "dHJhbnNhY3Rpb25fYWJj",
                        "status": status,
                        "amount": { "value": "25.00", "currencyCode": "USD" }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_settled_charge_becomes_sale() {
        let data = into_data(charge_response("SUBMITTED_FOR_SETTLEMENT")).unwrap();
        let sale = sale_from_charge(data).unwrap();
        assert_eq!(sale.id, "dHJhbnNhY3Rpb25fYWJj");
        assert_eq!(sale.amount, "25.00");
        assert_eq!(sale.currency_iso_code.as_deref(), Some("USD"));
    }

    #[test]
    fn test_declined_status_is_an_error() {
        let data = into_data(charge_response("PROCESSOR_DECLINED")).unwrap();
        let err = sale_from_charge(data).unwrap_err();
        assert!(matches!(err, GatewayError::Declined { ref status, .. } if status == "PROCESSOR_DECLINED"));
    }

    #[test]
    fn test_graphql_errors_take_precedence() {
        let response: GraphQLResponse<ChargeData> = serde_json::from_value(serde_json::json!({
            "data": { "chargePaymentMethod": null },
            "errors": [{ "message": "Unknown or expired payment method ID." }]
        }))
        .unwrap();

        let err = into_data(response).unwrap_err();
        assert!(matches!(err, GatewayError::GraphQL(ref m) if m.len() == 1));
    }

    #[test]
    fn test_missing_transaction_is_malformed() {
        let response: GraphQLResponse<ChargeData> = serde_json::from_value(serde_json::json!({
            "data": { "chargePaymentMethod": { "transaction": null } }
        }))
        .unwrap();

        let err = sale_from_charge(into_data(response).unwrap()).unwrap_err();
        assert!(matches!(err, GatewayError::Malformed(_)));
    }

    #[test]
    fn test_client_token_payload() {
        let response: GraphQLResponse<ClientTokenData> = serde_json::from_value(serde_json::json!({
            "data": { "createClientToken": { "clientToken": "eyJ2ZXJzaW9uIjoy" } }
        }))
        .unwrap();

        let data = into_data(response).unwrap();
        assert_eq!(data.create_client_token.unwrap().client_token, "eyJ2ZXJzaW9uIjoy");
    }

    #[test]
    fn test_debug_hides_credentials() {
        let client = BraintreeClient::new(&BraintreeConfig {
            environment: BraintreeEnvironment::Sandbox,
            merchant_id: "merchant_123".to_owned(),
            public_key: "public_abc".to_owned(),
            private_key: SecretString::from("private_xyz"),
        })
        .unwrap();

        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("merchant_123"));
        assert!(debug_output.contains("sandbox"));
        assert!(!debug_output.contains("private_xyz"));
        assert!(!debug_output.contains("Basic"));
    }
}
