//! Pickup PIN generation
//!
//! The PIN is read aloud at the restaurant counter, so it is always four
//! digits with no leading zero; "0427" read back as "427" would never match.

use rand::Rng;

const PIN_MIN: u32 = 1000;
const PIN_MAX: u32 = 9999;

/// Generate a four digit pickup PIN
pub fn generate_pickup_pin() -> String {
    rand::thread_rng().gen_range(PIN_MIN..=PIN_MAX).to_string()
}
