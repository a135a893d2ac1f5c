//! Read-side views: customer tracking, driver queue, listings and stats
//!
//! The tracking view deliberately under-shares. The driver's live position
//! appears only on the one order they are currently delivering, so a
//! customer waiting at stop three cannot watch the driver serve stops one
//! and two.

use super::{queue, OrderService};
use crate::coupons;
use crate::models::Order;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::money::round_yen;
use shared::order::OrderStatus;
use shared::view::{
    CouponQuote, DriverContact, DriverPosition, DriverStats, QueueEntry, RestaurantStats,
    TrackingTimestamps, TrackingView,
};
use std::collections::HashMap;
use uuid::Uuid;

impl OrderService {
    // ── Customer ────────────────────────────────────────────────────

    /// Customer-facing tracking view of one order
    pub async fn tracking_view(
        &self,
        customer_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<TrackingView> {
        let order = self.customer_order(customer_id, order_id).await?;
        let restaurant = self.load_restaurant(order.restaurant_id).await?;

        let mut view = TrackingView {
            order_number: order.order_number.clone(),
            status: order.status,
            is_driver_assigned: order.driver_id.is_some(),
            restaurant_name: restaurant.name,
            restaurant_location: restaurant.location,
            delivery_location: order.delivery_address.location,
            delivery_sequence: None,
            remaining_deliveries: None,
            total_orders_in_batch: None,
            driver_location: None,
            driver_info: None,
            timestamps: TrackingTimestamps {
                created_at: order.created_at,
                accepted_at: order.accepted_at,
                picked_up_at: order.picked_up_at,
                delivered_at: order.delivered_at,
            },
        };

        if let Some(driver_id) = order.driver_id {
            let driver = self.load_driver(driver_id).await?;
            view.driver_info = Some(DriverContact {
                full_name: driver.full_name,
                phone: driver.phone,
            });

            // Position is shared only for the order being delivered right
            // now; at most one of a driver's orders is in that state
            if order.status == OrderStatus::Delivering {
                view.driver_location = match (driver.last_location, driver.location_updated_at) {
                    (Some(location), Some(updated_at)) => Some(DriverPosition {
                        latitude: location.latitude,
                        longitude: location.longitude,
                        updated_at,
                    }),
                    _ => None,
                };
            }

            if order.status.is_active_delivery() {
                let active = self.storage.list_driver_active_orders(driver_id).await?;
                if let Some(idx) = active.iter().position(|o| o.id == order.id) {
                    view.delivery_sequence = Some((idx + 1) as u32);
                    view.remaining_deliveries = Some(idx as u32);
                    view.total_orders_in_batch = Some(active.len() as u32);
                }
            }
        }

        Ok(view)
    }

    /// Coupons this customer could apply right now, best discount first
    pub async fn applicable_coupons(
        &self,
        customer_id: Uuid,
        subtotal: Decimal,
    ) -> AppResult<Vec<CouponQuote>> {
        self.storage
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound))?;
        coupons::list_applicable(self.storage.as_ref(), customer_id, subtotal).await
    }

    /// Validate one coupon code against a cart subtotal
    pub async fn preview_coupon(
        &self,
        customer_id: Uuid,
        code: &str,
        subtotal: Decimal,
    ) -> AppResult<CouponQuote> {
        self.storage
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound))?;
        coupons::preview_code(self.storage.as_ref(), code, subtotal, customer_id).await
    }

    // ── Driver ──────────────────────────────────────────────────────

    /// Ready orders no driver has claimed yet, oldest first
    pub async fn available_orders(&self) -> AppResult<Vec<Order>> {
        Ok(self.storage.list_available_orders().await?)
    }

    /// The driver's delivery queue in drop-off order
    pub async fn driver_queue(&self, driver_id: Uuid) -> AppResult<Vec<QueueEntry>> {
        self.load_driver(driver_id).await?;
        let active = self.storage.list_driver_active_orders(driver_id).await?;
        Ok(queue::resolve_queue(&active))
    }

    /// Deliveries completed in the window and what they earned
    pub async fn driver_stats(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<DriverStats> {
        self.load_driver(driver_id).await?;
        let delivered = self
            .storage
            .list_driver_delivered_orders(driver_id, since, until)
            .await?;
        let total_earnings = delivered.iter().map(|o| o.driver_payout).sum();
        Ok(DriverStats {
            total_deliveries: delivered.len() as u64,
            total_earnings,
        })
    }

    // ── Restaurant ──────────────────────────────────────────────────

    /// A restaurant's orders, newest first, optionally filtered by status
    pub async fn restaurant_orders(
        &self,
        restaurant_id: Uuid,
        status: Option<OrderStatus>,
    ) -> AppResult<Vec<Order>> {
        self.load_restaurant(restaurant_id).await?;
        Ok(self
            .storage
            .list_restaurant_orders(restaurant_id, status)
            .await?)
    }

    /// Order volume and revenue; cancelled orders count in the status
    /// breakdown but never in revenue
    pub async fn restaurant_stats(&self, restaurant_id: Uuid) -> AppResult<RestaurantStats> {
        self.load_restaurant(restaurant_id).await?;
        let orders = self
            .storage
            .list_restaurant_orders(restaurant_id, None)
            .await?;

        let mut status_counts: HashMap<OrderStatus, u64> = HashMap::new();
        let mut total_orders = 0u64;
        let mut total_revenue = Decimal::ZERO;
        for order in &orders {
            *status_counts.entry(order.status).or_insert(0) += 1;
            if order.status != OrderStatus::Cancelled {
                total_orders += 1;
                total_revenue += order.total;
            }
        }
        let average_order_value = if total_orders > 0 {
            round_yen(total_revenue / Decimal::from(total_orders))
        } else {
            Decimal::ZERO
        };

        Ok(RestaurantStats {
            total_orders,
            total_revenue,
            average_order_value,
            status_counts,
        })
    }
}
