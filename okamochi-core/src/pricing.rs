//! Pricing calculator
//!
//! Pure money math: resolved line items plus restaurant settings in, the
//! full fee/tax/payout breakdown out. No clock, no randomness, no I/O, so
//! identical inputs always produce identical quotes.
//!
//! Every monetary step rounds to whole yen half-up (see `shared::money`):
//!
//! 1. `subtotal = Σ (unit_price + Σ option_deltas) × quantity`
//! 2. `service_fee = round(subtotal × service_fee_rate)`
//! 3. `pre_tax = subtotal + delivery_fee + service_fee`
//! 4. `tax = round(pre_tax × tax_rate)`
//! 5. `total = pre_tax + tax`
//! 6. `restaurant_payout = round(subtotal × (1 − commission_rate))`
//! 7. `driver_payout = delivery_fee`
//! 8. `platform_revenue = total − restaurant_payout − driver_payout`

use crate::config::Config;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::money::{round_yen, yen_eq};

/// Rates the calculator needs, lifted out of [`Config`]
#[derive(Debug, Clone, Copy)]
pub struct PricingConfig {
    pub service_fee_rate: Decimal,
    pub tax_rate: Decimal,
}

impl PricingConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            service_fee_rate: config.service_fee_rate,
            tax_rate: config.tax_rate,
        }
    }
}

/// One resolved line item: catalog prices already looked up
#[derive(Debug, Clone)]
pub struct ItemPricing {
    pub unit_price: Decimal,
    pub quantity: u32,
    pub option_deltas: Vec<Decimal>,
}

impl ItemPricing {
    /// (unit_price + option deltas) × quantity
    pub fn line_total(&self) -> Decimal {
        let unit = self.unit_price + self.option_deltas.iter().sum::<Decimal>();
        unit * Decimal::from(self.quantity)
    }
}

/// Complete price breakdown for an order before any coupon discount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub commission_rate: Decimal,
    pub restaurant_payout: Decimal,
    pub driver_payout: Decimal,
    pub platform_revenue: Decimal,
}

impl Quote {
    /// Money in equals money out, within the documented ¥1 tolerance
    pub fn conservation_holds(&self) -> bool {
        let inflow = self.subtotal + self.delivery_fee + self.service_fee + self.tax;
        let outflow = self.restaurant_payout + self.driver_payout + self.platform_revenue;
        yen_eq(inflow, outflow)
    }
}

/// Price an order
pub fn price_order(
    items: &[ItemPricing],
    delivery_fee: Decimal,
    commission_rate: Decimal,
    config: &PricingConfig,
) -> Quote {
    let subtotal: Decimal = items.iter().map(ItemPricing::line_total).sum();

    let service_fee = round_yen(subtotal * config.service_fee_rate);
    let pre_tax = subtotal + delivery_fee + service_fee;
    let tax = round_yen(pre_tax * config.tax_rate);
    let total = pre_tax + tax;

    let restaurant_payout = round_yen(subtotal * (Decimal::ONE - commission_rate));
    let driver_payout = delivery_fee;
    let platform_revenue = total - restaurant_payout - driver_payout;

    Quote {
        subtotal,
        delivery_fee,
        service_fee,
        tax,
        total,
        commission_rate,
        restaurant_payout,
        driver_payout,
        platform_revenue,
    }
}
