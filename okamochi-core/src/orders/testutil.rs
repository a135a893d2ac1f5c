//! Shared fixtures for order service tests
//!
//! `world()` seeds one customer with an address, one open restaurant with a
//! single menu item (and one paid option), and one driver with payouts
//! enabled. `order_at` walks a fresh order to the requested status.

use super::OrderService;
use crate::config::Config;
use crate::models::{
    CreateOrderRequest, Customer, CustomerAddress, Driver, MenuItem, MenuOption, Order,
    OrderItemRequest, PaymentMethod, Restaurant, VehicleType,
};
use crate::storage::MemoryStorage;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::order::OrderStatus;
use shared::view::GeoPoint;
use std::sync::Arc;
use uuid::Uuid;

pub(crate) struct World {
    pub service: OrderService,
    pub storage: Arc<MemoryStorage>,
    pub customer_id: Uuid,
    pub address_id: Uuid,
    pub restaurant_id: Uuid,
    pub driver_id: Uuid,
    pub item_id: Uuid,
    pub option_id: Uuid,
}

impl World {
    /// Fresh copy of the seeded restaurant, for mutate-and-reseed tests
    pub fn restaurant(&self) -> Restaurant {
        Restaurant {
            id: self.restaurant_id,
            name: "Menya Kamome".to_string(),
            phone: "03-1234-5678".to_string(),
            address: "2-3-1 Ebisu, Shibuya".to_string(),
            location: GeoPoint {
                latitude: 35.6467,
                longitude: 139.7101,
            },
            delivery_fee: Decimal::from(300),
            commission_rate: Some(Decimal::new(35, 2)),
            payout_account_id: Some("acct_restaurant".to_string()),
            payouts_enabled: true,
            is_open: true,
            created_at: Utc::now(),
        }
    }

    /// Fresh copy of the seeded menu item
    pub fn menu_item(&self) -> MenuItem {
        MenuItem {
            id: self.item_id,
            restaurant_id: self.restaurant_id,
            name: "Shoyu Ramen".to_string(),
            description: Some("Classic soy broth".to_string()),
            price: Decimal::from(1250),
            is_available: true,
            options: vec![MenuOption {
                id: self.option_id,
                name: "Extra Chashu".to_string(),
                price_delta: Decimal::from(150),
            }],
        }
    }

    pub fn driver(&self) -> Driver {
        Driver {
            id: self.driver_id,
            full_name: "Kenta Mori".to_string(),
            phone: "090-1111-2222".to_string(),
            vehicle_type: VehicleType::Motorbike,
            payout_account_id: Some("acct_driver".to_string()),
            payouts_enabled: true,
            base_payout_per_delivery: None,
            is_online: true,
            last_location: None,
            location_updated_at: None,
            created_at: Utc::now(),
        }
    }
}

pub(crate) async fn world() -> World {
    let storage = Arc::new(MemoryStorage::new());
    let customer_id = Uuid::new_v4();
    let address_id = Uuid::new_v4();
    let restaurant_id = Uuid::new_v4();
    let driver_id = Uuid::new_v4();
    let item_id = Uuid::new_v4();
    let option_id = Uuid::new_v4();

    let w = World {
        service: OrderService::new(
            storage.clone(),
            Config::with_rates(
                Decimal::new(15, 2),
                Decimal::new(10, 2),
                Decimal::new(35, 2),
            ),
        ),
        storage,
        customer_id,
        address_id,
        restaurant_id,
        driver_id,
        item_id,
        option_id,
    };

    w.storage.seed_customer(Customer {
        id: customer_id,
        full_name: "Aoi Tanaka".to_string(),
        phone: "080-9999-0000".to_string(),
        email: "aoi@example.com".to_string(),
        created_at: Utc::now(),
    });
    w.storage.seed_address(CustomerAddress {
        id: address_id,
        customer_id,
        label: "Home".to_string(),
        address: "1-2-3 Nakameguro, Meguro".to_string(),
        location: GeoPoint {
            latitude: 35.6433,
            longitude: 139.6983,
        },
        delivery_notes: Some("Leave at door".to_string()),
    });
    w.storage.seed_restaurant(w.restaurant());
    w.storage.seed_menu_item(w.menu_item());
    w.storage.seed_driver(w.driver());

    w
}

/// Card order for `quantity` of the seeded item, no options
pub(crate) fn cart(w: &World, quantity: u32) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: w.customer_id,
        restaurant_id: w.restaurant_id,
        items: vec![OrderItemRequest {
            menu_item_id: w.item_id,
            quantity,
            option_ids: vec![],
        }],
        address_id: w.address_id,
        coupon_code: None,
        special_instructions: None,
        payment_method: PaymentMethod::Card,
        payment_intent_id: Some(format!("pi_{}", Uuid::new_v4().simple())),
    }
}

/// Create a fresh order and walk it to `target`
pub(crate) async fn order_at(w: &World, target: OrderStatus) -> Order {
    let order = w.service.create_order(cart(w, 2)).await.unwrap();
    if target == OrderStatus::Pending {
        return order;
    }
    if target == OrderStatus::Cancelled {
        return w
            .service
            .cancel_order(w.customer_id, order.id)
            .await
            .unwrap();
    }

    let order = w
        .service
        .accept_order(w.restaurant_id, order.id)
        .await
        .unwrap();
    if target == OrderStatus::Accepted {
        return order;
    }

    let order = w
        .service
        .start_preparing(w.restaurant_id, order.id)
        .await
        .unwrap();
    if target == OrderStatus::Preparing {
        return order;
    }

    let order = w.service.mark_ready(w.restaurant_id, order.id).await.unwrap();
    if target == OrderStatus::Ready {
        return order;
    }

    let order = w
        .service
        .accept_delivery(w.driver_id, order.id)
        .await
        .unwrap();
    if target == OrderStatus::PickedUp {
        return order;
    }

    let pin = order.pickup_pin.clone().unwrap();
    let order = w
        .service
        .verify_pickup_pin(w.driver_id, order.id, &pin)
        .await
        .unwrap();
    let order = w
        .service
        .start_delivering(w.driver_id, order.id)
        .await
        .unwrap();
    if target == OrderStatus::Delivering {
        return order;
    }

    w.service
        .complete_delivery(w.driver_id, order.id)
        .await
        .unwrap()
}
