//! Order intake
//!
//! Creation resolves the cart against the live catalog, snapshots names and
//! prices onto the order, prices it, validates the coupon, and persists the
//! order atomically with its coupon redemption. The created event goes out
//! only after the write has committed.

use super::{number, OrderService};
use crate::coupons;
use crate::models::{
    CouponUsage, CreateOrderRequest, DeliveryAddress, Order, OrderItem, OrderItemOption,
    PaymentMethod,
};
use crate::pricing::{self, ItemPricing, PricingConfig};
use crate::storage::StorageError;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::{EventPayload, OrderStatus};
use uuid::Uuid;
use validator::Validate;

/// Retries when a concurrent creation takes the same order number
const MAX_NUMBER_ATTEMPTS: u32 = 3;

impl OrderService {
    /// Create an order in `pending`
    ///
    /// The order snapshots everything it needs at this moment: item names
    /// and prices, option deltas, the delivery address, the restaurant's
    /// delivery fee and commission rate. Later edits to any of those never
    /// change a placed order.
    pub async fn create_order(&self, request: CreateOrderRequest) -> AppResult<Order> {
        request
            .validate()
            .map_err(|err| AppError::validation(err.to_string()))?;

        if request.payment_method == PaymentMethod::Card && request.payment_intent_id.is_none() {
            return Err(AppError::validation(
                "card orders require a payment_intent_id",
            ));
        }

        self.storage
            .get_customer(request.customer_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::CustomerNotFound))?;

        let address = self
            .storage
            .get_customer_address(request.address_id)
            .await?
            .filter(|addr| addr.customer_id == request.customer_id)
            .ok_or_else(|| AppError::new(ErrorCode::AddressNotFound))?;

        let restaurant = self.load_restaurant(request.restaurant_id).await?;
        if !restaurant.is_open {
            return Err(AppError::new(ErrorCode::RestaurantClosed)
                .with_detail("restaurant", restaurant.name.clone()));
        }

        // Resolve cart lines against the catalog, snapshotting as we go
        let mut order_items = Vec::with_capacity(request.items.len());
        let mut pricing_items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let item = self
                .storage
                .get_menu_item(line.menu_item_id)
                .await?
                .ok_or_else(|| {
                    AppError::new(ErrorCode::MenuItemNotFound)
                        .with_detail("menu_item_id", line.menu_item_id.to_string())
                })?;
            if item.restaurant_id != restaurant.id {
                return Err(AppError::new(ErrorCode::MenuItemWrongRestaurant)
                    .with_detail("menu_item_id", item.id.to_string()));
            }
            if !item.is_available {
                return Err(AppError::new(ErrorCode::MenuItemUnavailable)
                    .with_detail("name", item.name.clone()));
            }

            let mut options = Vec::with_capacity(line.option_ids.len());
            for option_id in &line.option_ids {
                let option = item.find_option(*option_id).ok_or_else(|| {
                    AppError::validation(format!("unknown option for item '{}'", item.name))
                        .with_detail("option_id", option_id.to_string())
                })?;
                options.push(OrderItemOption {
                    option_id: option.id,
                    name: option.name.clone(),
                    price_delta: option.price_delta,
                });
            }

            let pricing_item = ItemPricing {
                unit_price: item.price,
                quantity: line.quantity,
                option_deltas: options.iter().map(|o| o.price_delta).collect(),
            };
            order_items.push(OrderItem {
                menu_item_id: item.id,
                name: item.name,
                unit_price: pricing_item.unit_price,
                quantity: line.quantity,
                options,
                line_total: pricing_item.line_total(),
            });
            pricing_items.push(pricing_item);
        }

        let commission_rate = restaurant.effective_commission(self.config.default_commission_rate);
        let quote = pricing::price_order(
            &pricing_items,
            restaurant.delivery_fee,
            commission_rate,
            &PricingConfig::from_config(&self.config),
        );

        let order_id = Uuid::new_v4();
        let now = Utc::now();

        // Coupon discount reduces what the customer pays; the payout split
        // stays on the undiscounted quote, the platform absorbs the discount
        let mut discount = Decimal::ZERO;
        let mut coupon_code = None;
        let mut usage = None;
        if let Some(code) = &request.coupon_code {
            let (coupon, amount) = coupons::resolve_coupon(
                self.storage.as_ref(),
                code,
                quote.subtotal,
                request.customer_id,
                now,
            )
            .await?;
            discount = amount;
            coupon_code = Some(coupon.code.clone());
            usage = Some(CouponUsage {
                id: Uuid::new_v4(),
                coupon_id: coupon.id,
                customer_id: request.customer_id,
                order_id,
                used_at: now,
            });
        }

        let mut order = Order {
            id: order_id,
            order_number: String::new(),
            customer_id: request.customer_id,
            restaurant_id: restaurant.id,
            driver_id: None,
            status: OrderStatus::Pending,
            items: order_items,
            delivery_address: DeliveryAddress {
                address: address.address,
                location: address.location,
                notes: address.delivery_notes,
            },
            coupon_code,
            special_instructions: request.special_instructions,
            subtotal: quote.subtotal,
            delivery_fee: quote.delivery_fee,
            service_fee: quote.service_fee,
            discount,
            tax: quote.tax,
            total: quote.total - discount,
            commission_rate: quote.commission_rate,
            restaurant_payout: quote.restaurant_payout,
            driver_payout: quote.driver_payout,
            platform_revenue: quote.platform_revenue,
            payment_method: request.payment_method,
            payment_intent_id: request.payment_intent_id,
            payout_completed: false,
            restaurant_transfer_id: None,
            driver_transfer_id: None,
            pickup_pin: None,
            pin_verified_at: None,
            delivery_sequence: None,
            cancelled_by: None,
            created_at: now,
            accepted_at: None,
            ready_at: None,
            picked_up_at: None,
            delivered_at: None,
            cancelled_at: None,
        };

        // Number and insert; a duplicate number means another creation won
        // the same sequence slot, so renumber and try again
        let mut attempts = 0;
        loop {
            order.order_number =
                number::next_order_number(self.storage.as_ref(), self.config.utc_offset_hours)
                    .await?;
            match self.storage.insert_order(&order, usage.as_ref()).await {
                Ok(()) => break,
                Err(StorageError::DuplicateOrderNumber(_)) if attempts < MAX_NUMBER_ATTEMPTS => {
                    attempts += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "order created"
        );
        self.emit(EventPayload::OrderCreated {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_id: order.customer_id,
            restaurant_id: order.restaurant_id,
            total: order.total,
        });

        Ok(order)
    }
}
