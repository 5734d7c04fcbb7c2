use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::event_sourcing::core::DomainEvent;
use super::value_objects::OrderItem;

// ============================================================================
// Order Events - Domain Events for Order Aggregate
// ============================================================================

/// Order Event - Union type for all order events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Created(OrderCreated),
    ItemsUpdated(OrderItemsUpdated),
    Confirmed(OrderConfirmed),
    Shipped(OrderShipped),
    Delivered(OrderDelivered),
    Cancelled(OrderCancelled),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => "OrderCreated",
            OrderEvent::ItemsUpdated(_) => "OrderItemsUpdated",
            OrderEvent::Confirmed(_) => "OrderConfirmed",
            OrderEvent::Shipped(_) => "OrderShipped",
            OrderEvent::Delivered(_) => "OrderDelivered",
            OrderEvent::Cancelled(_) => "OrderCancelled",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Created - Initial event in order lifecycle
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCreated {
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub placed_at: DateTime<Utc>,
}

/// Order Items Updated - Order contents modified
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItemsUpdated {
    pub items: Vec<OrderItem>,
    pub reason: Option<String>,
}

/// Order Confirmed - Order accepted for fulfillment
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderConfirmed {
    pub confirmed_at: DateTime<Utc>,
}

/// Order Shipped - Order dispatched to customer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderShipped {
    pub tracking_number: String,
    pub carrier: String,
    pub shipped_at: DateTime<Utc>,
}

/// Order Delivered - Order successfully delivered
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderDelivered {
    pub delivered_at: DateTime<Utc>,
    pub signature: Option<String>,
}

/// Order Cancelled - Order lifecycle ended
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderCancelled {
    pub reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let confirmed = OrderEvent::Confirmed(OrderConfirmed { confirmed_at: Utc::now() });
        let cancelled = OrderEvent::Cancelled(OrderCancelled { reason: None, cancelled_by: None });

        assert_eq!(confirmed.event_type(), "OrderConfirmed");
        assert_eq!(cancelled.event_type(), "OrderCancelled");
    }

    #[test]
    fn test_events_serialize_as_tagged_variants() {
        let event = OrderEvent::Shipped(OrderShipped {
            tracking_number: "1Z999".to_string(),
            carrier: "UPS".to_string(),
            shipped_at: Utc::now(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Shipped");
        assert_eq!(json["data"]["carrier"], "UPS");

        let back: OrderEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
