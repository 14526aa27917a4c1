//! End-to-end checkout and payment reconciliation flows against the
//! in-memory engine.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use surrealdb::engine::local::{Db, Mem};
use surrealdb::{RecordId, Surreal};

use aura_server::checkout::{CheckoutError, CheckoutService};
use aura_server::db::define_schema;
use aura_server::db::models::{
    Order, OrderStatus, PaymentMethod, PaymentStatus, Product, ShippingAddress, SizeLabel,
    SizeStock,
};
use aura_server::db::repository::{CartRepository, OrderRepository, RepoError};
use aura_server::payment::{
    GatewayError, GatewayOrder, PaymentConfirmation, PaymentError, PaymentGateway,
    ReconciliationService, SignatureVerifier,
};

const GATEWAY_SECRET: &str = "test-gateway-secret";

/// In-process gateway fake: hands out sequential order ids and records the
/// amounts it was asked to register.
#[derive(Default)]
struct FakeGateway {
    created: Mutex<Vec<i64>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        _receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let mut created = self.created.lock().unwrap();
        created.push(amount_minor);
        Ok(GatewayOrder {
            id: format!("order_test_{}", created.len()),
            amount: amount_minor,
            currency: currency.to_string(),
        })
    }
}

struct TestEnv {
    db: Surreal<Db>,
    checkout: CheckoutService,
    reconciliation: ReconciliationService,
    verifier: SignatureVerifier,
    gateway: Arc<FakeGateway>,
}

async fn setup() -> TestEnv {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    define_schema(&db).await.unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let checkout = CheckoutService::new(db.clone(), gateway.clone(), "INR".to_string());
    let verifier = SignatureVerifier::new(GATEWAY_SECRET);
    let reconciliation =
        ReconciliationService::new(db.clone(), Arc::new(SignatureVerifier::new(GATEWAY_SECRET)));

    TestEnv {
        db,
        checkout,
        reconciliation,
        verifier,
        gateway,
    }
}

async fn seed_product(db: &Surreal<Db>, key: &str, price: i64, stock_m: i64) -> RecordId {
    let product = Product {
        id: None,
        name: format!("Product {key}"),
        brand: "Aura".into(),
        description: "test".into(),
        categories: vec![],
        tags: vec![],
        colors: vec!["black".into()],
        images: vec![format!("{key}.webp")],
        price: Decimal::from(price),
        discount_price: Decimal::ZERO,
        sizes: vec![SizeStock { size: SizeLabel::M, stock: stock_m }],
        rating: 0.0,
        num_reviews: 0,
        is_active: true,
    };
    let created: Option<Product> = db.create(("product", key)).content(product).await.unwrap();
    created.unwrap().id.unwrap()
}

async fn stock_of(db: &Surreal<Db>, id: &RecordId) -> i64 {
    let product: Option<Product> = db.select(id.clone()).await.unwrap();
    product.unwrap().stock_for(SizeLabel::M).unwrap()
}

fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Asha Rao".into(),
        mobile: "9999999999".into(),
        address_line: "12 MG Road".into(),
        city: "Bengaluru".into(),
        state: "KA".into(),
        pincode: "560001".into(),
    }
}

fn confirmation(verifier: &SignatureVerifier, order_id: &str, payment_id: &str) -> PaymentConfirmation {
    PaymentConfirmation {
        gateway_order_id: order_id.to_string(),
        gateway_payment_id: payment_id.to_string(),
        gateway_signature: verifier.sign(order_id, payment_id),
    }
}

// ========== COD ==========

#[tokio::test]
async fn cod_happy_path() {
    let env = setup().await;
    let product = seed_product(&env.db, "tee", 500, 5).await;
    let cart = CartRepository::new(env.db.clone());
    cart.add("user:1", "tee", SizeLabel::M, 2).await.unwrap();

    let placed = env
        .checkout
        .checkout("user:1", address(), PaymentMethod::Cod)
        .await
        .unwrap();

    let order = &placed.order;
    assert_eq!(order.total_amount, Decimal::from(1000));
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.order_status, OrderStatus::Placed);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].unit_price, Decimal::from(500));
    assert!(placed.gateway_order.is_none());

    // Stock reserved, cart cleared, exactly one order
    assert_eq!(stock_of(&env.db, &product).await, 3);
    assert!(cart.snapshot("user:1").await.unwrap().is_empty());
    let orders = OrderRepository::new(env.db.clone())
        .find_by_user("user:1")
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn insufficient_stock_fails_fast_and_changes_nothing() {
    let env = setup().await;
    let product = seed_product(&env.db, "tee", 500, 1).await;
    let cart = CartRepository::new(env.db.clone());
    cart.add("user:1", "tee", SizeLabel::M, 2).await.unwrap();

    let err = env
        .checkout
        .checkout("user:1", address(), PaymentMethod::Cod)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

    assert_eq!(stock_of(&env.db, &product).await, 1);
    assert_eq!(cart.snapshot("user:1").await.unwrap().len(), 1);
    assert!(
        OrderRepository::new(env.db.clone())
            .find_by_user("user:1")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let env = setup().await;
    let err = env
        .checkout
        .checkout("user:1", address(), PaymentMethod::Cod)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
}

#[tokio::test]
async fn totals_stay_frozen_after_product_price_change() {
    let env = setup().await;
    seed_product(&env.db, "tee", 500, 5).await;
    let cart = CartRepository::new(env.db.clone());
    cart.add("user:1", "tee", SizeLabel::M, 2).await.unwrap();

    let placed = env
        .checkout
        .checkout("user:1", address(), PaymentMethod::Cod)
        .await
        .unwrap();

    env.db
        .query("UPDATE product:tee SET price = 900, discount_price = 800")
        .await
        .unwrap();

    let repo = OrderRepository::new(env.db.clone());
    let order_id = placed.order.id.clone().unwrap().to_string();
    let reloaded = repo.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(reloaded.total_amount, Decimal::from(1000));
    assert_eq!(reloaded.items[0].unit_price, Decimal::from(500));
    assert_eq!(
        Order::total_of(&reloaded.items),
        reloaded.total_amount,
        "total must equal the sum over frozen items"
    );
}

// ========== ONLINE ==========

#[tokio::test]
async fn online_checkout_defers_reservation_until_verify() {
    let env = setup().await;
    let product = seed_product(&env.db, "tee", 500, 5).await;
    let cart = CartRepository::new(env.db.clone());
    cart.add("user:1", "tee", SizeLabel::M, 2).await.unwrap();

    let placed = env
        .checkout
        .checkout("user:1", address(), PaymentMethod::Online)
        .await
        .unwrap();

    // Gateway order registered for the snapshot total, in minor units
    let gateway_order = placed.gateway_order.clone().unwrap();
    assert_eq!(gateway_order.amount, 100_000);
    assert_eq!(env.gateway.created.lock().unwrap().as_slice(), &[100_000]);

    // Pending order, cart cleared, stock untouched until confirmation
    assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
    assert_eq!(
        placed.order.gateway_order_id.as_deref(),
        Some(gateway_order.id.as_str())
    );
    assert!(cart.snapshot("user:1").await.unwrap().is_empty());
    assert_eq!(stock_of(&env.db, &product).await, 5);

    // Verified confirmation finalizes the order and reserves exactly once
    let verified = env
        .reconciliation
        .verify("user:1", confirmation(&env.verifier, &gateway_order.id, "pay_1"))
        .await
        .unwrap();
    assert_eq!(verified.payment_status, PaymentStatus::Paid);
    assert_eq!(verified.gateway_payment_id.as_deref(), Some("pay_1"));
    assert!(verified.gateway_signature.is_some());
    assert_eq!(stock_of(&env.db, &product).await, 3);

    // A duplicate callback must not decrement again
    let err = env
        .reconciliation
        .verify("user:1", confirmation(&env.verifier, &gateway_order.id, "pay_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::AlreadyProcessed));
    assert_eq!(stock_of(&env.db, &product).await, 3);
}

#[tokio::test]
async fn tampered_signature_finalizes_nothing() {
    let env = setup().await;
    let product = seed_product(&env.db, "tee", 500, 5).await;
    let cart = CartRepository::new(env.db.clone());
    cart.add("user:1", "tee", SizeLabel::M, 2).await.unwrap();

    let placed = env
        .checkout
        .checkout("user:1", address(), PaymentMethod::Online)
        .await
        .unwrap();
    let gateway_order_id = placed.order.gateway_order_id.clone().unwrap();

    // Flip one bit of an otherwise valid signature
    let mut conf = confirmation(&env.verifier, &gateway_order_id, "pay_1");
    let mut bytes = hex::decode(&conf.gateway_signature).unwrap();
    bytes[0] ^= 0x01;
    conf.gateway_signature = hex::encode(bytes);

    let err = env.reconciliation.verify("user:1", conf).await.unwrap_err();
    assert!(matches!(err, PaymentError::InvalidSignature));

    // No state change: order still pending, stock untouched
    let repo = OrderRepository::new(env.db.clone());
    let order_id = placed.order.id.clone().unwrap().to_string();
    let reloaded = repo.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(reloaded.payment_status, PaymentStatus::Pending);
    assert!(reloaded.gateway_payment_id.is_none());
    assert_eq!(stock_of(&env.db, &product).await, 5);
}

#[tokio::test]
async fn missing_gateway_fields_are_rejected() {
    let err = PaymentConfirmation::from_fields(
        Some("order_test_1".into()),
        None,
        Some("deadbeef".into()),
    )
    .unwrap_err();
    assert!(matches!(err, PaymentError::MissingFields));

    let err =
        PaymentConfirmation::from_fields(Some("order_test_1".into()), Some("  ".into()), Some("x".into()))
            .unwrap_err();
    assert!(matches!(err, PaymentError::MissingFields));
}

#[tokio::test]
async fn verify_fails_when_stock_ran_out_since_checkout() {
    let env = setup().await;
    let product = seed_product(&env.db, "tee", 500, 2).await;
    let cart = CartRepository::new(env.db.clone());
    cart.add("user:1", "tee", SizeLabel::M, 2).await.unwrap();

    let placed = env
        .checkout
        .checkout("user:1", address(), PaymentMethod::Online)
        .await
        .unwrap();
    let gateway_order_id = placed.order.gateway_order_id.clone().unwrap();

    // Someone else takes the stock between checkout and the callback
    env.db
        .query("UPDATE product:tee SET sizes = [{ size: 'M', stock: 1 }]")
        .await
        .unwrap();

    let err = env
        .reconciliation
        .verify("user:1", confirmation(&env.verifier, &gateway_order_id, "pay_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::InsufficientStock { .. }));

    // Order cancelled, stock untouched by the failed reservation
    assert_eq!(stock_of(&env.db, &product).await, 1);
    let repo = OrderRepository::new(env.db.clone());
    let order_id = placed.order.id.clone().unwrap().to_string();
    let reloaded = repo.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(reloaded.order_status, OrderStatus::Cancelled);
}

// ========== Order status machine over the store ==========

#[tokio::test]
async fn delivered_forces_paid_and_stamps_delivery_time() {
    let env = setup().await;
    seed_product(&env.db, "tee", 500, 5).await;
    let cart = CartRepository::new(env.db.clone());
    cart.add("user:1", "tee", SizeLabel::M, 1).await.unwrap();

    // An online order still pending payment
    let placed = env
        .checkout
        .checkout("user:1", address(), PaymentMethod::Online)
        .await
        .unwrap();
    let repo = OrderRepository::new(env.db.clone());
    let order_id = placed.order.id.clone().unwrap().to_string();

    let packed = repo.update_status(&order_id, OrderStatus::Packed).await.unwrap();
    assert_eq!(packed.order_status, OrderStatus::Packed);
    assert_eq!(packed.payment_status, PaymentStatus::Pending);

    let delivered = repo
        .update_status(&order_id, OrderStatus::Delivered)
        .await
        .unwrap();
    assert_eq!(delivered.order_status, OrderStatus::Delivered);
    assert_eq!(delivered.payment_status, PaymentStatus::Paid);
    assert!(delivered.delivered_at.is_some());

    // Terminal: no further transitions
    let err = repo
        .update_status(&order_id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[tokio::test]
async fn backward_transition_is_rejected_without_mutation() {
    let env = setup().await;
    seed_product(&env.db, "tee", 500, 5).await;
    let cart = CartRepository::new(env.db.clone());
    cart.add("user:1", "tee", SizeLabel::M, 1).await.unwrap();

    let placed = env
        .checkout
        .checkout("user:1", address(), PaymentMethod::Cod)
        .await
        .unwrap();
    let repo = OrderRepository::new(env.db.clone());
    let order_id = placed.order.id.clone().unwrap().to_string();

    repo.update_status(&order_id, OrderStatus::Shipped).await.unwrap();
    let err = repo
        .update_status(&order_id, OrderStatus::Packed)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let reloaded = repo.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(reloaded.order_status, OrderStatus::Shipped);
    assert_eq!(reloaded.payment_status, PaymentStatus::Paid);
}
