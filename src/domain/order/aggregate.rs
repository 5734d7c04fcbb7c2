use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::event_sourcing::core::{Aggregate, Changeset};
use super::value_objects::{OrderItem, OrderStatus};
use super::events::*;
use super::commands::OrderCommand;
use super::errors::OrderError;

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Every field is derived from event payloads only, so replaying the same
// history always yields the same order.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct OrderAggregate {
    // Identity
    pub id: Uuid,
    pub version: i64,

    // Current State (derived from events)
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,

    // Audit Trail
    pub placed_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,

    // Optional fields
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub cancelled_reason: Option<String>,

    changeset: Changeset<OrderEvent>,
}

impl OrderAggregate {
    /// Start a new order. The `Created` event waits in the changeset until
    /// the order is saved.
    pub fn place(id: Uuid, customer_id: Uuid, items: Vec<OrderItem>) -> Result<Self, OrderError> {
        Self::validate_items(&items)?;

        Self::create(
            id,
            OrderEvent::Created(OrderCreated {
                customer_id,
                items,
                placed_at: Utc::now(),
            }),
        )
    }

    /// Validate business rules before emitting events
    fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyItems);
        }

        for item in items {
            if item.quantity <= 0 {
                return Err(OrderError::InvalidQuantity(item.quantity));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for OrderAggregate {
    const AGGREGATE_TYPE: &'static str = "Order";

    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            OrderEvent::Created(e) => Ok(Self {
                id: aggregate_id,
                version: 1,
                customer_id: e.customer_id,
                items: e.items.clone(),
                status: OrderStatus::Created,
                placed_at: e.placed_at,
                confirmed_at: None,
                delivered_at: None,
                tracking_number: None,
                carrier: None,
                cancelled_reason: None,
                changeset: Changeset::new(),
            }),
            _ => Err(OrderError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            OrderEvent::Created(_) => return Err(OrderError::AlreadyCreated),
            OrderEvent::ItemsUpdated(e) => {
                self.items = e.items.clone();
            }
            OrderEvent::Confirmed(e) => {
                self.status = OrderStatus::Confirmed;
                self.confirmed_at = Some(e.confirmed_at);
            }
            OrderEvent::Shipped(e) => {
                self.status = OrderStatus::Shipped;
                self.tracking_number = Some(e.tracking_number.clone());
                self.carrier = Some(e.carrier.clone());
            }
            OrderEvent::Delivered(e) => {
                self.status = OrderStatus::Delivered;
                self.delivered_at = Some(e.delivered_at);
            }
            OrderEvent::Cancelled(e) => {
                self.status = OrderStatus::Cancelled;
                self.cancelled_reason = e.reason.clone();
            }
        }

        self.version += 1;
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::UpdateItems { items, reason } => {
                // Validate status
                match self.status {
                    OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
                    OrderStatus::Confirmed | OrderStatus::Shipped | OrderStatus::Delivered => {
                        return Err(OrderError::InvalidStatusTransition(self.status.clone()))
                    }
                    OrderStatus::Created => {} // OK
                }

                Self::validate_items(items)?;

                if *items == self.items {
                    return Ok(vec![]);
                }

                Ok(vec![OrderEvent::ItemsUpdated(OrderItemsUpdated {
                    items: items.clone(),
                    reason: reason.clone(),
                })])
            }

            OrderCommand::ConfirmOrder => {
                match self.status {
                    OrderStatus::Created => {}
                    OrderStatus::Confirmed => return Err(OrderError::AlreadyConfirmed),
                    OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
                    _ => return Err(OrderError::InvalidStatusTransition(self.status.clone())),
                }

                Ok(vec![OrderEvent::Confirmed(OrderConfirmed {
                    confirmed_at: Utc::now(),
                })])
            }

            OrderCommand::ShipOrder { tracking_number, carrier } => {
                match self.status {
                    OrderStatus::Confirmed => {}
                    OrderStatus::Created => return Err(OrderError::NotConfirmed),
                    _ => return Err(OrderError::InvalidStatusTransition(self.status.clone())),
                }

                Ok(vec![OrderEvent::Shipped(OrderShipped {
                    tracking_number: tracking_number.clone(),
                    carrier: carrier.clone(),
                    shipped_at: Utc::now(),
                })])
            }

            OrderCommand::DeliverOrder { signature } => {
                match self.status {
                    OrderStatus::Shipped => {}
                    _ => return Err(OrderError::NotShipped),
                }

                Ok(vec![OrderEvent::Delivered(OrderDelivered {
                    delivered_at: Utc::now(),
                    signature: signature.clone(),
                })])
            }

            OrderCommand::CancelOrder { reason, cancelled_by } => {
                // Can cancel from Created, Confirmed, or Shipped
                if self.status.is_terminal() {
                    return Err(match self.status {
                        OrderStatus::Cancelled => OrderError::AlreadyCancelled,
                        _ => OrderError::InvalidStatusTransition(self.status.clone()),
                    });
                }

                Ok(vec![OrderEvent::Cancelled(OrderCancelled {
                    reason: reason.clone(),
                    cancelled_by: *cancelled_by,
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn changeset(&self) -> &Changeset<Self::Event> {
        &self.changeset
    }

    fn changeset_mut(&mut self) -> &mut Changeset<Self::Event> {
        &mut self.changeset
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
