use uuid::Uuid;
use super::value_objects::OrderItem;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================
//
// Placing a new order is not a command on an existing aggregate; see
// `OrderAggregate::place`.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    UpdateItems {
        items: Vec<OrderItem>,
        reason: Option<String>,
    },
    ConfirmOrder,
    ShipOrder {
        tracking_number: String,
        carrier: String,
    },
    DeliverOrder {
        signature: Option<String>,
    },
    CancelOrder {
        reason: Option<String>,
        cancelled_by: Option<Uuid>,
    },
}
