//! In-memory storage implementation
//!
//! # Tables
//!
//! | Table | Key | Purpose |
//! |-------|-----|---------|
//! | `restaurants` | restaurant id | Restaurant records |
//! | `drivers` | driver id | Driver records incl. live location |
//! | `customers` | customer id | Customer records |
//! | `addresses` | address id | Saved delivery addresses |
//! | `menu_items` | menu item id | Catalog entries |
//! | `coupons` | coupon id | Coupon definitions |
//! | `coupon_usages` | append-only | Redemption records |
//! | `orders` | order id | Order aggregates |
//! | `order_numbers` | order number | Uniqueness index |
//!
//! One `RwLock` guards all tables so multi-row writes (order + usage record,
//! claim-and-check) happen under a single critical section, matching the
//! atomicity a transactional backend provides.

use super::{Precondition, Storage, StorageError, StorageResult};
use crate::models::{
    Coupon, CouponUsage, Customer, CustomerAddress, Driver, MenuItem, Order, Restaurant,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shared::order::OrderStatus;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    restaurants: HashMap<Uuid, Restaurant>,
    drivers: HashMap<Uuid, Driver>,
    customers: HashMap<Uuid, Customer>,
    addresses: HashMap<Uuid, CustomerAddress>,
    menu_items: HashMap<Uuid, MenuItem>,
    coupons: HashMap<Uuid, Coupon>,
    coupon_usages: Vec<CouponUsage>,
    orders: HashMap<Uuid, Order>,
    order_numbers: HashSet<String>,
}

/// Storage backed by in-process hash maps
pub struct MemoryStorage {
    inner: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Tables::default()),
        }
    }

    // ── Seeding (fixtures for tests and local runs) ─────────────────

    pub fn seed_restaurant(&self, restaurant: Restaurant) {
        self.inner
            .write()
            .restaurants
            .insert(restaurant.id, restaurant);
    }

    pub fn seed_driver(&self, driver: Driver) {
        self.inner.write().drivers.insert(driver.id, driver);
    }

    pub fn seed_customer(&self, customer: Customer) {
        self.inner.write().customers.insert(customer.id, customer);
    }

    pub fn seed_address(&self, address: CustomerAddress) {
        self.inner.write().addresses.insert(address.id, address);
    }

    pub fn seed_menu_item(&self, item: MenuItem) {
        self.inner.write().menu_items.insert(item.id, item);
    }

    pub fn seed_coupon(&self, coupon: Coupon) {
        self.inner.write().coupons.insert(coupon.id, coupon);
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_restaurant(&self, id: Uuid) -> StorageResult<Option<Restaurant>> {
        Ok(self.inner.read().restaurants.get(&id).cloned())
    }

    async fn get_driver(&self, id: Uuid) -> StorageResult<Option<Driver>> {
        Ok(self.inner.read().drivers.get(&id).cloned())
    }

    async fn get_customer(&self, id: Uuid) -> StorageResult<Option<Customer>> {
        Ok(self.inner.read().customers.get(&id).cloned())
    }

    async fn get_customer_address(&self, id: Uuid) -> StorageResult<Option<CustomerAddress>> {
        Ok(self.inner.read().addresses.get(&id).cloned())
    }

    async fn update_driver(&self, driver: &Driver) -> StorageResult<()> {
        let mut tables = self.inner.write();
        if !tables.drivers.contains_key(&driver.id) {
            return Err(StorageError::DriverNotFound(driver.id));
        }
        tables.drivers.insert(driver.id, driver.clone());
        Ok(())
    }

    async fn get_menu_item(&self, id: Uuid) -> StorageResult<Option<MenuItem>> {
        Ok(self.inner.read().menu_items.get(&id).cloned())
    }

    async fn find_coupon_by_code(&self, code: &str) -> StorageResult<Option<Coupon>> {
        let needle = code.to_uppercase();
        Ok(self
            .inner
            .read()
            .coupons
            .values()
            .find(|c| c.code == needle)
            .cloned())
    }

    async fn list_active_coupons(&self) -> StorageResult<Vec<Coupon>> {
        Ok(self
            .inner
            .read()
            .coupons
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn count_coupon_usage(&self, coupon_id: Uuid) -> StorageResult<u64> {
        Ok(self
            .inner
            .read()
            .coupon_usages
            .iter()
            .filter(|u| u.coupon_id == coupon_id)
            .count() as u64)
    }

    async fn count_coupon_usage_for_customer(
        &self,
        coupon_id: Uuid,
        customer_id: Uuid,
    ) -> StorageResult<u64> {
        Ok(self
            .inner
            .read()
            .coupon_usages
            .iter()
            .filter(|u| u.coupon_id == coupon_id && u.customer_id == customer_id)
            .count() as u64)
    }

    async fn insert_order(&self, order: &Order, usage: Option<&CouponUsage>) -> StorageResult<()> {
        let mut tables = self.inner.write();

        if tables.order_numbers.contains(&order.order_number) {
            return Err(StorageError::DuplicateOrderNumber(order.order_number.clone()));
        }

        // Usage caps are re-checked here so two racing creations cannot both
        // redeem the last slot; the validation outside the lock is advisory.
        if let Some(usage) = usage {
            let coupon = tables
                .coupons
                .get(&usage.coupon_id)
                .ok_or_else(|| StorageError::Backend(format!("coupon {} missing", usage.coupon_id)))?;
            if let Some(limit) = coupon.usage_limit {
                let used = tables
                    .coupon_usages
                    .iter()
                    .filter(|u| u.coupon_id == usage.coupon_id)
                    .count() as u32;
                if used >= limit {
                    return Err(StorageError::CouponGlobalLimit(usage.coupon_id));
                }
            }
            let per_user_limit = coupon.per_user_limit;
            let used_by_customer = tables
                .coupon_usages
                .iter()
                .filter(|u| u.coupon_id == usage.coupon_id && u.customer_id == usage.customer_id)
                .count() as u32;
            if used_by_customer >= per_user_limit {
                return Err(StorageError::CouponUserLimit(usage.coupon_id));
            }
            tables.coupon_usages.push(usage.clone());
        }

        tables.order_numbers.insert(order.order_number.clone());
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> StorageResult<Option<Order>> {
        Ok(self.inner.read().orders.get(&id).cloned())
    }

    async fn update_order(
        &self,
        order: &Order,
        precondition: Precondition,
    ) -> StorageResult<bool> {
        let mut tables = self.inner.write();

        let current = tables
            .orders
            .get(&order.id)
            .ok_or(StorageError::OrderNotFound(order.id))?;

        let holds = match precondition {
            Precondition::None => true,
            Precondition::StatusIs(expected) => current.status == expected,
            Precondition::StatusIsAndUnassigned(expected) => {
                current.status == expected && current.driver_id.is_none()
            }
            Precondition::StatusIsAndNoOtherDelivering(expected) => {
                current.status == expected
                    && match order.driver_id {
                        Some(driver_id) => !tables.orders.values().any(|o| {
                            o.id != order.id
                                && o.driver_id == Some(driver_id)
                                && o.status == OrderStatus::Delivering
                        }),
                        None => true,
                    }
            }
        };

        if !holds {
            return Ok(false);
        }

        tables.orders.insert(order.id, order.clone());
        Ok(true)
    }

    async fn claim_payout(&self, order_id: Uuid) -> StorageResult<bool> {
        let mut tables = self.inner.write();
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(StorageError::OrderNotFound(order_id))?;
        if order.payout_completed {
            return Ok(false);
        }
        order.payout_completed = true;
        Ok(true)
    }

    async fn record_transfers(
        &self,
        order_id: Uuid,
        restaurant_transfer_id: Option<&str>,
        driver_transfer_id: Option<&str>,
    ) -> StorageResult<()> {
        let mut tables = self.inner.write();
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(StorageError::OrderNotFound(order_id))?;
        if let Some(id) = restaurant_transfer_id {
            order.restaurant_transfer_id = Some(id.to_string());
        }
        if let Some(id) = driver_transfer_id {
            order.driver_transfer_id = Some(id.to_string());
        }
        Ok(())
    }

    async fn count_orders_for_day(&self, date_prefix: &str) -> StorageResult<u64> {
        Ok(self
            .inner
            .read()
            .order_numbers
            .iter()
            .filter(|n| n.starts_with(date_prefix))
            .count() as u64)
    }

    async fn list_available_orders(&self) -> StorageResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .inner
            .read()
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Ready && o.driver_id.is_none())
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn list_driver_active_orders(&self, driver_id: Uuid) -> StorageResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .inner
            .read()
            .orders
            .values()
            .filter(|o| o.driver_id == Some(driver_id) && o.status.is_active_delivery())
            .cloned()
            .collect();
        orders.sort_by_key(|o| (o.delivery_sequence.unwrap_or(u32::MAX), o.created_at));
        Ok(orders)
    }

    async fn list_driver_delivered_orders(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StorageResult<Vec<Order>> {
        Ok(self
            .inner
            .read()
            .orders
            .values()
            .filter(|o| {
                o.driver_id == Some(driver_id)
                    && o.status == OrderStatus::Delivered
                    && o.delivered_at.is_some_and(|at| at >= since && at <= until)
            })
            .cloned()
            .collect())
    }

    async fn list_restaurant_orders(
        &self,
        restaurant_id: Uuid,
        status: Option<OrderStatus>,
    ) -> StorageResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .inner
            .read()
            .orders
            .values()
            .filter(|o| {
                o.restaurant_id == restaurant_id
                    && status.map_or(true, |s| o.status == s)
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
