//! End-to-end order flows through a running engine
//!
//! Drives real orders through the public API with the event pipeline live:
//! create, restaurant acceptance, the PIN handoff, delivery, then waits for
//! the settlement worker to move money through the mock processor.

use anyhow::Result;
use chrono::Utc;
use okamochi_core::models::{
    Coupon, CreateOrderRequest, Customer, CustomerAddress, DiscountType, Driver, MenuItem, Order,
    OrderItemRequest, PaymentMethod, Restaurant, VehicleType,
};
use okamochi_core::payments::IntentStatus;
use okamochi_core::{
    Config, Engine, ErrorCode, MemoryStorage, MockProcessor, OrderStatus, Storage,
};
use rust_decimal::Decimal;
use shared::view::GeoPoint;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Generous bound for the async settlement leg; local runs finish in
/// milliseconds
const SETTLE_DEADLINE: Duration = Duration::from_secs(5);

struct Market {
    engine: Engine,
    storage: Arc<MemoryStorage>,
    processor: Arc<MockProcessor>,
    customer_id: Uuid,
    address_id: Uuid,
    restaurant_id: Uuid,
    driver_id: Uuid,
    item_id: Uuid,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("okamochi_core=debug")
        .with_test_writer()
        .try_init();
}

/// One open restaurant selling a 1250 yen ramen, one customer with a saved
/// address, one payable driver, engine running on top
fn market() -> Market {
    init_tracing();

    let storage = Arc::new(MemoryStorage::new());
    let processor = Arc::new(MockProcessor::new());
    let config = Config::with_rates(
        Decimal::new(15, 2),
        Decimal::new(10, 2),
        Decimal::new(35, 2),
    );
    let engine = Engine::start(storage.clone(), processor.clone(), config);

    let m = Market {
        engine,
        storage,
        processor,
        customer_id: Uuid::new_v4(),
        address_id: Uuid::new_v4(),
        restaurant_id: Uuid::new_v4(),
        driver_id: Uuid::new_v4(),
        item_id: Uuid::new_v4(),
    };

    m.storage.seed_customer(Customer {
        id: m.customer_id,
        full_name: "Haruka Sato".to_string(),
        phone: "080-1234-9876".to_string(),
        email: "haruka@example.com".to_string(),
        created_at: Utc::now(),
    });
    m.storage.seed_address(CustomerAddress {
        id: m.address_id,
        customer_id: m.customer_id,
        label: "Home".to_string(),
        address: "4-9-12 Kichijoji Honcho, Musashino".to_string(),
        location: GeoPoint {
            latitude: 35.7041,
            longitude: 139.5797,
        },
        delivery_notes: None,
    });
    m.storage.seed_restaurant(Restaurant {
        id: m.restaurant_id,
        name: "Tonkotsu Yume".to_string(),
        phone: "0422-11-2233".to_string(),
        address: "1-1-5 Gotenyama, Musashino".to_string(),
        location: GeoPoint {
            latitude: 35.7003,
            longitude: 139.5742,
        },
        delivery_fee: Decimal::from(300),
        commission_rate: Some(Decimal::new(35, 2)),
        payout_account_id: Some("acct_tonkotsu".to_string()),
        payouts_enabled: true,
        is_open: true,
        created_at: Utc::now(),
    });
    m.storage.seed_menu_item(MenuItem {
        id: m.item_id,
        restaurant_id: m.restaurant_id,
        name: "Tonkotsu Ramen".to_string(),
        description: None,
        price: Decimal::from(1250),
        is_available: true,
        options: vec![],
    });
    m.storage.seed_driver(Driver {
        id: m.driver_id,
        full_name: "Yui Hasegawa".to_string(),
        phone: "090-5555-6666".to_string(),
        vehicle_type: VehicleType::Bicycle,
        payout_account_id: Some("acct_rider".to_string()),
        payouts_enabled: true,
        base_payout_per_delivery: None,
        is_online: true,
        last_location: None,
        location_updated_at: None,
        created_at: Utc::now(),
    });

    m
}

/// Two ramen: subtotal 2500, service fee 375, delivery 300, tax 318
fn two_ramen(m: &Market, intent: Option<String>, coupon: Option<&str>) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: m.customer_id,
        restaurant_id: m.restaurant_id,
        items: vec![OrderItemRequest {
            menu_item_id: m.item_id,
            quantity: 2,
            option_ids: vec![],
        }],
        address_id: m.address_id,
        coupon_code: coupon.map(str::to_string),
        special_instructions: None,
        payment_method: if intent.is_some() {
            PaymentMethod::Card
        } else {
            PaymentMethod::Cash
        },
        payment_intent_id: intent,
    }
}

/// Walk an order from pending all the way to delivered
async fn deliver(m: &Market, order_id: Uuid) -> Result<Order> {
    let svc = m.engine.service();
    svc.accept_order(m.restaurant_id, order_id).await?;
    svc.start_preparing(m.restaurant_id, order_id).await?;
    svc.mark_ready(m.restaurant_id, order_id).await?;
    let picked = svc.accept_delivery(m.driver_id, order_id).await?;
    let pin = picked.pickup_pin.clone().unwrap();
    svc.verify_pickup_pin(m.driver_id, order_id, &pin).await?;
    svc.start_delivering(m.driver_id, order_id).await?;
    Ok(svc.complete_delivery(m.driver_id, order_id).await?)
}

/// Poll the stored order until `pred` holds
async fn wait_for_order<F>(m: &Market, order_id: Uuid, what: &str, pred: F) -> Order
where
    F: Fn(&Order) -> bool,
{
    let deadline = tokio::time::Instant::now() + SETTLE_DEADLINE;
    loop {
        let order = m.storage.get_order(order_id).await.unwrap().unwrap();
        if pred(&order) {
            return order;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "{what} did not happen within {SETTLE_DEADLINE:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Poll a processor-side condition until it holds
async fn wait_for<F>(what: &str, probe: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + SETTLE_DEADLINE;
    while !probe() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "{what} did not happen within {SETTLE_DEADLINE:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_card_delivery_pays_restaurant_and_driver() -> Result<()> {
    let m = market();
    let intent = m
        .processor
        .seed_intent(IntentStatus::Succeeded, Decimal::from(3493));

    let order = m
        .engine
        .service()
        .create_order(two_ramen(&m, Some(intent), None))
        .await?;
    assert_eq!(order.total, Decimal::from(3493));

    let delivered = deliver(&m, order.id).await?;
    assert_eq!(delivered.status, OrderStatus::Delivered);

    let settled = wait_for_order(&m, order.id, "payout", |o| {
        o.restaurant_transfer_id.is_some() && o.driver_transfer_id.is_some()
    })
    .await;
    assert!(settled.payout_completed);

    let transfers = m.processor.transfers();
    assert_eq!(transfers.len(), 2);
    let restaurant_leg = transfers
        .iter()
        .find(|t| t.destination == "acct_tonkotsu")
        .unwrap();
    // 2500 subtotal less the 35% commission
    assert_eq!(restaurant_leg.amount, Decimal::from(1625));
    let driver_leg = transfers
        .iter()
        .find(|t| t.destination == "acct_rider")
        .unwrap();
    assert_eq!(driver_leg.amount, Decimal::from(300));
    for transfer in &transfers {
        assert_eq!(transfer.transfer_group, settled.order_number);
    }

    tokio::time::timeout(Duration::from_secs(5), m.engine.shutdown()).await?;
    Ok(())
}

#[tokio::test]
async fn test_cash_delivery_settles_without_processor() -> Result<()> {
    let m = market();
    let order = m
        .engine
        .service()
        .create_order(two_ramen(&m, None, None))
        .await?;

    deliver(&m, order.id).await?;

    let settled = wait_for_order(&m, order.id, "cash settlement", |o| o.payout_completed).await;
    assert!(settled.restaurant_transfer_id.is_none());
    assert!(settled.driver_transfer_id.is_none());
    assert!(m.processor.transfers().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_authorization_is_voided() -> Result<()> {
    let m = market();
    let intent = m
        .processor
        .seed_intent(IntentStatus::RequiresCapture, Decimal::from(3493));

    let order = m
        .engine
        .service()
        .create_order(two_ramen(&m, Some(intent.clone()), None))
        .await?;
    m.engine
        .service()
        .cancel_order(m.customer_id, order.id)
        .await?;

    wait_for("void", || {
        m.processor
            .intent(&intent)
            .is_some_and(|i| i.status == IntentStatus::Canceled)
    })
    .await;
    assert!(m.processor.refunds().is_empty());
    assert!(m.processor.transfers().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_captured_payment_is_refunded() -> Result<()> {
    let m = market();
    let intent = m
        .processor
        .seed_intent(IntentStatus::Succeeded, Decimal::from(3493));

    let order = m
        .engine
        .service()
        .create_order(two_ramen(&m, Some(intent.clone()), None))
        .await?;
    m.engine
        .service()
        .cancel_order(m.customer_id, order.id)
        .await?;

    wait_for("refund", || !m.processor.refunds().is_empty()).await;
    let refunds = m.processor.refunds();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].payment_intent_id, intent);
    assert_eq!(refunds[0].amount, Decimal::from(3493));
    assert!(m.processor.transfers().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_driver_wins_a_contested_order() -> Result<()> {
    let m = market();
    let rival_id = Uuid::new_v4();
    m.storage.seed_driver(Driver {
        id: rival_id,
        full_name: "Riku Abe".to_string(),
        phone: "090-7777-8888".to_string(),
        vehicle_type: VehicleType::Motorbike,
        payout_account_id: Some("acct_rival".to_string()),
        payouts_enabled: true,
        base_payout_per_delivery: None,
        is_online: true,
        last_location: None,
        location_updated_at: None,
        created_at: Utc::now(),
    });

    let svc = m.engine.service();
    let order = svc.create_order(two_ramen(&m, None, None)).await?;
    svc.accept_order(m.restaurant_id, order.id).await?;
    svc.start_preparing(m.restaurant_id, order.id).await?;
    svc.mark_ready(m.restaurant_id, order.id).await?;

    let first = {
        let svc = svc.clone();
        let driver = m.driver_id;
        let id = order.id;
        tokio::spawn(async move { svc.accept_delivery(driver, id).await })
    };
    let second = {
        let svc = svc.clone();
        let id = order.id;
        tokio::spawn(async move { svc.accept_delivery(rival_id, id).await })
    };

    let outcomes = [first.await?, second.await?];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);

    let loss = outcomes
        .iter()
        .find(|r| r.is_err())
        .unwrap()
        .as_ref()
        .unwrap_err();
    // loser raced the claim itself or saw the already-moved status
    assert!(
        matches!(
            loss.code,
            ErrorCode::OrderAlreadyAssigned | ErrorCode::InvalidTransition
        ),
        "unexpected loser error: {:?}",
        loss.code
    );

    let stored = m.storage.get_order(order.id).await?.unwrap();
    assert_eq!(stored.status, OrderStatus::PickedUp);
    assert!(stored.driver_id == Some(m.driver_id) || stored.driver_id == Some(rival_id));
    Ok(())
}

#[tokio::test]
async fn test_driver_position_visible_only_while_delivering() -> Result<()> {
    let m = market();
    let svc = m.engine.service();
    let order = svc.create_order(two_ramen(&m, None, None)).await?;
    svc.accept_order(m.restaurant_id, order.id).await?;
    svc.start_preparing(m.restaurant_id, order.id).await?;
    svc.mark_ready(m.restaurant_id, order.id).await?;
    let picked = svc.accept_delivery(m.driver_id, order.id).await?;
    svc.update_driver_location(m.driver_id, 35.7020, 139.5770)
        .await?;

    // picked up but not yet en route: identity visible, position not
    let view = svc.tracking_view(m.customer_id, order.id).await?;
    assert!(view.is_driver_assigned);
    assert_eq!(view.driver_info.unwrap().full_name, "Yui Hasegawa");
    assert!(view.driver_location.is_none());

    let pin = picked.pickup_pin.clone().unwrap();
    svc.verify_pickup_pin(m.driver_id, order.id, &pin).await?;
    svc.start_delivering(m.driver_id, order.id).await?;

    let view = svc.tracking_view(m.customer_id, order.id).await?;
    let position = view.driver_location.unwrap();
    assert!((position.latitude - 35.7020).abs() < 1e-9);

    svc.complete_delivery(m.driver_id, order.id).await?;

    let view = svc.tracking_view(m.customer_id, order.id).await?;
    assert!(view.driver_location.is_none());
    assert!(view.timestamps.delivered_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_coupon_is_single_use_per_customer() -> Result<()> {
    let m = market();
    m.storage.seed_coupon(Coupon {
        id: Uuid::new_v4(),
        code: "SAVE500".to_string(),
        discount_type: DiscountType::Fixed,
        value: Decimal::from(500),
        min_order_amount: Decimal::from(2000),
        max_discount: None,
        start_date: None,
        end_date: None,
        usage_limit: None,
        per_user_limit: 1,
        is_active: true,
    });

    let svc = m.engine.service();
    let order = svc
        .create_order(two_ramen(&m, None, Some("save500")))
        .await?;
    assert_eq!(order.coupon_code.as_deref(), Some("SAVE500"));
    assert_eq!(order.discount, Decimal::from(500));
    assert_eq!(order.total, Decimal::from(2993));

    let err = svc
        .create_order(two_ramen(&m, None, Some("SAVE500")))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CouponUserLimitReached);
    Ok(())
}
