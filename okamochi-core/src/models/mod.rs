//! Domain Models

// Parties
pub mod customer;
pub mod driver;
pub mod restaurant;

// Catalog
pub mod menu;

// Promotions
pub mod coupon;

// Orders
pub mod order;

// Re-exports
pub use customer::{Customer, CustomerAddress};
pub use driver::{Driver, VehicleType};
pub use restaurant::Restaurant;
pub use menu::{MenuItem, MenuOption};
pub use coupon::{Coupon, CouponUsage, DiscountType};
pub use order::{
    CreateOrderRequest, DeliveryAddress, Order, OrderItem, OrderItemOption, OrderItemRequest,
    PaymentMethod,
};
