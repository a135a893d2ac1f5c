//! Coupon validation and discount math
//!
//! Validation is pure given the coupon, the subtotal, the usage counts and
//! the clock, so carts can preview codes as often as they like. Recording a
//! redemption is never done here; it happens atomically with order creation
//! in the storage layer.

use crate::models::{Coupon, DiscountType};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::money::floor_yen;
use shared::view::CouponQuote;
use uuid::Uuid;

/// Redemption counts, read before validation
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageCounts {
    pub global: u64,
    pub by_customer: u64,
}

/// Validate a coupon against a cart. Checks run in a fixed order and the
/// first failure wins; on success returns the bounded discount.
pub fn validate_coupon(
    coupon: &Coupon,
    subtotal: Decimal,
    counts: UsageCounts,
    now: DateTime<Utc>,
) -> AppResult<Decimal> {
    if !coupon.is_active {
        return Err(AppError::new(ErrorCode::CouponInvalid));
    }
    if let Some(start) = coupon.start_date
        && now < start
    {
        return Err(AppError::new(ErrorCode::CouponNotStarted));
    }
    if let Some(end) = coupon.end_date
        && now > end
    {
        return Err(AppError::new(ErrorCode::CouponExpired));
    }
    if subtotal < coupon.min_order_amount {
        return Err(AppError::new(ErrorCode::CouponMinOrderNotMet)
            .with_detail("min_order_amount", coupon.min_order_amount.to_string()));
    }
    if let Some(limit) = coupon.usage_limit
        && counts.global >= u64::from(limit)
    {
        return Err(AppError::new(ErrorCode::CouponUsageLimitReached));
    }
    if counts.by_customer >= u64::from(coupon.per_user_limit) {
        return Err(AppError::new(ErrorCode::CouponUserLimitReached));
    }

    Ok(compute_discount(coupon, subtotal))
}

/// Bounded discount for a valid coupon, floored to whole yen
///
/// Percent discounts cap at `max_discount`; fixed discounts cap at the
/// subtotal so the total never goes negative.
pub fn compute_discount(coupon: &Coupon, subtotal: Decimal) -> Decimal {
    let raw = match coupon.discount_type {
        DiscountType::Percent => {
            let discount = subtotal * coupon.value / Decimal::from(100);
            match coupon.max_discount {
                Some(cap) => discount.min(cap),
                None => discount,
            }
        }
        DiscountType::Fixed => coupon.value.min(subtotal),
    };
    floor_yen(raw)
}

/// Look up a code and validate it for this customer and subtotal
///
/// Unknown codes answer `CouponInvalid`, indistinguishable from inactive
/// ones.
pub async fn resolve_coupon(
    storage: &dyn Storage,
    code: &str,
    subtotal: Decimal,
    customer_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<(Coupon, Decimal)> {
    let coupon = storage
        .find_coupon_by_code(code)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CouponInvalid))?;

    let counts = UsageCounts {
        global: storage.count_coupon_usage(coupon.id).await?,
        by_customer: storage
            .count_coupon_usage_for_customer(coupon.id, customer_id)
            .await?,
    };

    let discount = validate_coupon(&coupon, subtotal, counts, now)?;
    Ok((coupon, discount))
}

/// Preview a single code against a cart
pub async fn preview_code(
    storage: &dyn Storage,
    code: &str,
    subtotal: Decimal,
    customer_id: Uuid,
) -> AppResult<CouponQuote> {
    let (coupon, discount) =
        resolve_coupon(storage, code, subtotal, customer_id, Utc::now()).await?;
    Ok(CouponQuote {
        code: coupon.code,
        discount,
        final_amount: subtotal - discount,
    })
}

/// Coupons this customer could apply to the given subtotal right now
pub async fn list_applicable(
    storage: &dyn Storage,
    customer_id: Uuid,
    subtotal: Decimal,
) -> AppResult<Vec<CouponQuote>> {
    let now = Utc::now();
    let mut quotes = Vec::new();
    for coupon in storage.list_active_coupons().await? {
        let counts = UsageCounts {
            global: storage.count_coupon_usage(coupon.id).await?,
            by_customer: storage
                .count_coupon_usage_for_customer(coupon.id, customer_id)
                .await?,
        };
        if let Ok(discount) = validate_coupon(&coupon, subtotal, counts, now) {
            quotes.push(CouponQuote {
                code: coupon.code.clone(),
                discount,
                final_amount: subtotal - discount,
            });
        }
    }
    quotes.sort_by(|a, b| b.discount.cmp(&a.discount));
    Ok(quotes)
}
