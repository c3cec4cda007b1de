//! Checkout and order administration with an in-memory gateway.
//!
//! Requires `TEST_DATABASE_URL`; run with `cargo test -- --ignored`.

#![allow(clippy::unwrap_used)]

use bazaar_api::services::catalog::CatalogService;
use bazaar_api::services::orders::{
    CartItem, CheckoutService, OrderError, OrderService, PaymentForm, StatusForm,
};
use bazaar_core::{OrderStatus, ProductId, UserId};
use bazaar_integration_tests::{
    MockGateway, create_category, create_product, register_user, test_pool,
};

fn cart(ids: &[ProductId]) -> Vec<CartItem> {
    ids.iter()
        .map(|id| CartItem {
            id: Some(id.to_string()),
        })
        .collect()
}

fn payment(ids: &[ProductId]) -> PaymentForm {
    PaymentForm {
        nonce: Some("fake-valid-nonce".to_owned()),
        cart: cart(ids),
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_checkout_charges_stored_prices_and_records_order() {
    let pool = test_pool().await;
    let gateway = MockGateway::approving();
    let buyer = register_user(&pool).await;
    let category = create_category(&pool).await;
    let mug = create_product(&pool, &category, "10").await;
    let bowl = create_product(&pool, &category, "15.25").await;

    let receipt = CheckoutService::new(&pool, &gateway)
        .checkout(buyer.id, &payment(&[mug.id, bowl.id, mug.id]))
        .await
        .unwrap();

    assert_eq!(
        gateway.charges(),
        vec![("fake-valid-nonce".to_owned(), "35.25".to_owned())]
    );

    let orders = OrderService::new(&pool)
        .list_for_buyer(buyer.id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);

    let order = &orders[0];
    assert_eq!(order.id, receipt.order_id);
    assert_eq!(order.status, OrderStatus::NotProcess);
    assert_eq!(order.buyer.id, buyer.id);
    assert_eq!(order.buyer.name, buyer.name);
    assert_eq!(order.products.len(), 3);
    assert_eq!(order.payment["success"], true);
    assert_eq!(order.payment["transaction"]["id"], receipt.sale.id);
    assert_eq!(order.payment["transaction"]["amount"], "35.25");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_declined_charge_writes_no_order() {
    let pool = test_pool().await;
    let gateway = MockGateway::declining();
    let buyer = register_user(&pool).await;
    let category = create_category(&pool).await;
    let mug = create_product(&pool, &category, "10").await;

    let result = CheckoutService::new(&pool, &gateway)
        .checkout(buyer.id, &payment(&[mug.id]))
        .await;

    assert!(matches!(result, Err(OrderError::Gateway(_))));
    assert_eq!(gateway.charges().len(), 1);
    assert!(
        OrderService::new(&pool)
            .list_for_buyer(buyer.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_unknown_product_is_rejected_before_charging() {
    let pool = test_pool().await;
    let gateway = MockGateway::approving();
    let buyer = register_user(&pool).await;

    let result = CheckoutService::new(&pool, &gateway)
        .checkout(buyer.id, &payment(&[ProductId::generate()]))
        .await;

    assert!(matches!(result, Err(OrderError::Validation(_))));
    assert!(gateway.charges().is_empty());
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_missing_buyer_is_rejected_before_charging() {
    let pool = test_pool().await;
    let gateway = MockGateway::approving();
    let category = create_category(&pool).await;
    let mug = create_product(&pool, &category, "10").await;
    let ghost = UserId::generate();

    let result = CheckoutService::new(&pool, &gateway)
        .checkout(ghost, &payment(&[mug.id]))
        .await;

    assert!(matches!(result, Err(OrderError::UnknownBuyer)));
    assert!(gateway.charges().is_empty());
    assert!(
        OrderService::new(&pool)
            .list_for_buyer(ghost)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_deleted_product_drops_out_of_order_view() {
    let pool = test_pool().await;
    let gateway = MockGateway::approving();
    let buyer = register_user(&pool).await;
    let category = create_category(&pool).await;
    let kept = create_product(&pool, &category, "7").await;
    let removed = create_product(&pool, &category, "8").await;

    CheckoutService::new(&pool, &gateway)
        .checkout(buyer.id, &payment(&[kept.id, removed.id]))
        .await
        .unwrap();
    CatalogService::new(&pool)
        .delete_product(&removed.id.to_string())
        .await
        .unwrap();

    let orders = OrderService::new(&pool)
        .list_for_buyer(buyer.id)
        .await
        .unwrap();
    let ids: Vec<_> = orders[0].products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![kept.id]);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_orders_are_listed_newest_first() {
    let pool = test_pool().await;
    let gateway = MockGateway::approving();
    let buyer = register_user(&pool).await;
    let category = create_category(&pool).await;
    let mug = create_product(&pool, &category, "10").await;
    let checkout = CheckoutService::new(&pool, &gateway);

    let first = checkout
        .checkout(buyer.id, &payment(&[mug.id]))
        .await
        .unwrap();
    let second = checkout
        .checkout(buyer.id, &payment(&[mug.id]))
        .await
        .unwrap();

    let mine = OrderService::new(&pool)
        .list_for_buyer(buyer.id)
        .await
        .unwrap();
    let ids: Vec<_> = mine.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![second.order_id, first.order_id]);

    let all = OrderService::new(&pool).list_all().await.unwrap();
    let position = |id| all.iter().position(|o| o.id == id).unwrap();
    assert!(position(second.order_id) < position(first.order_id));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_status_can_move_in_any_direction() {
    let pool = test_pool().await;
    let gateway = MockGateway::approving();
    let buyer = register_user(&pool).await;
    let category = create_category(&pool).await;
    let mug = create_product(&pool, &category, "10").await;
    let receipt = CheckoutService::new(&pool, &gateway)
        .checkout(buyer.id, &payment(&[mug.id]))
        .await
        .unwrap();
    let service = OrderService::new(&pool);
    let id = receipt.order_id.to_string();

    let shipped = service
        .set_status(
            &id,
            &StatusForm {
                status: Some("Shipped".to_owned()),
            },
        )
        .await
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert_eq!(shipped.products.len(), 1);

    let reopened = service
        .set_status(
            &id,
            &StatusForm {
                status: Some("Not Process".to_owned()),
            },
        )
        .await
        .unwrap();
    assert_eq!(reopened.status, OrderStatus::NotProcess);

    let bogus = service
        .set_status(
            &id,
            &StatusForm {
                status: Some("Teleported".to_owned()),
            },
        )
        .await;
    assert!(matches!(bogus, Err(OrderError::Validation(_))));

    let missing = service
        .set_status(
            &bazaar_core::OrderId::generate().to_string(),
            &StatusForm {
                status: Some("Shipped".to_owned()),
            },
        )
        .await;
    assert!(matches!(missing, Err(OrderError::NotFound)));
}
