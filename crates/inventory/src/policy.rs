//! Admission control, TTL arithmetic and stock-level classification.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::inventory::Inventory;
use crate::reservation::Reservation;
use crate::stock::Stock;

pub const MIN_QUANTITY: i64 = 1;
pub const DEFAULT_MAX_QUANTITY_PER_RESERVATION: i64 = 100;
pub const DEFAULT_TTL_MINUTES: i64 = 15;
pub const DEFAULT_EXPIRING_SOON_MINUTES: i64 = 5;
pub const DEFAULT_MAX_STOCK_PER_ITEM: i64 = 10_000;
pub const LOW_STOCK_THRESHOLD: i64 = 10;
pub const CRITICAL_STOCK_THRESHOLD: i64 = 5;

/// Outcome of a policy check. Collects every violated rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failure(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// Append a violation found outside the policy itself.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    fn push(&mut self, message: String) {
        self.errors.push(message);
    }
}

/// Decides whether a reservation request is admissible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationPolicy {
    ttl: Duration,
    max_quantity: i64,
}

impl Default for ReservationPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
            max_quantity: DEFAULT_MAX_QUANTITY_PER_RESERVATION,
        }
    }
}

impl ReservationPolicy {
    pub fn new(ttl: Duration, max_quantity: i64) -> Self {
        Self { ttl, max_quantity }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl.num_minutes()
    }

    pub fn max_quantity(&self) -> i64 {
        self.max_quantity
    }

    /// Check every rule and collect all violations, in a fixed order.
    pub fn validate(&self, inventory: &Inventory, quantity: i64) -> ValidationResult {
        let mut result = ValidationResult::success();

        if quantity < MIN_QUANTITY {
            result.push(format!("Quantity must be at least {MIN_QUANTITY}"));
        }
        if quantity > self.max_quantity {
            result.push(format!(
                "Quantity cannot exceed {} per reservation",
                self.max_quantity
            ));
        }
        if !inventory.has_available(quantity) {
            result.push(format!(
                "Insufficient stock. Requested: {quantity}, Available: {}",
                inventory.stock().available()
            ));
        }

        result
    }

    pub fn can_reserve(&self, inventory: &Inventory, quantity: i64) -> bool {
        self.validate(inventory, quantity).is_valid()
    }
}

/// TTL arithmetic over reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirationPolicy {
    expiring_soon: Duration,
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_EXPIRING_SOON_MINUTES))
    }
}

impl ExpirationPolicy {
    pub fn new(expiring_soon: Duration) -> Self {
        Self { expiring_soon }
    }

    pub fn is_expired(&self, reservation: &Reservation, now: DateTime<Utc>) -> bool {
        reservation.is_expired(now)
    }

    /// `max(0, expires_at - now)`.
    pub fn time_until_expiration(&self, reservation: &Reservation, now: DateTime<Utc>) -> Duration {
        (reservation.expires_at() - now).max(Duration::zero())
    }

    pub fn is_expiring_soon(&self, reservation: &Reservation, now: DateTime<Utc>) -> bool {
        let remaining = self.time_until_expiration(reservation, now);
        remaining > Duration::zero() && remaining < self.expiring_soon
    }
}

/// Coarse classification of available stock for dashboards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockLevel {
    OutOfStock,
    Critical,
    Low,
    Normal,
}

/// Restocking bounds and stock-level thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockValidationPolicy {
    max_stock_per_item: i64,
}

impl Default for StockValidationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STOCK_PER_ITEM)
    }
}

impl StockValidationPolicy {
    pub fn new(max_stock_per_item: i64) -> Self {
        Self { max_stock_per_item }
    }

    pub fn max_stock_per_item(&self) -> i64 {
        self.max_stock_per_item
    }

    /// The sellable total after the add must stay within the per-item ceiling.
    pub fn validate_add(&self, stock: &Stock, quantity: i64) -> ValidationResult {
        let mut result = ValidationResult::success();

        if quantity <= 0 {
            result.push("Quantity to add must be positive".to_owned());
        }
        let exceeds = stock
            .total()
            .checked_add(quantity)
            .is_none_or(|total| total > self.max_stock_per_item);
        if exceeds {
            result.push(format!(
                "Cannot add {quantity} units. Would exceed maximum stock of {}",
                self.max_stock_per_item
            ));
        }

        result
    }

    pub fn stock_level(&self, stock: &Stock) -> StockLevel {
        match stock.available() {
            0 => StockLevel::OutOfStock,
            a if a < CRITICAL_STOCK_THRESHOLD => StockLevel::Critical,
            a if a < LOW_STOCK_THRESHOLD => StockLevel::Low,
            _ => StockLevel::Normal,
        }
    }
}
