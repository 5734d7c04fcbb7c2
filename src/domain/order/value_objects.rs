use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Order Value Objects
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl OrderItem {
    pub fn new(product_id: Uuid, quantity: i32) -> Self {
        Self { product_id, quantity }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Delivered and cancelled orders accept no further commands.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
