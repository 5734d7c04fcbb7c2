use std::sync::Arc;
use uuid::Uuid;
use anyhow::{Result, anyhow};

use crate::event_sourcing::core::Aggregate;
use crate::event_sourcing::repository::AggregateRepository;
use crate::event_sourcing::store::EventStore;

use super::aggregate::OrderAggregate;
use super::commands::OrderCommand;
use super::events::OrderEvent;
use super::value_objects::OrderItem;

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate (replayed) → Changeset → Repository
//
// ============================================================================

pub struct OrderCommandHandler<S: EventStore<OrderEvent>> {
    repository: Arc<AggregateRepository<OrderAggregate, S>>,
}

impl<S: EventStore<OrderEvent>> OrderCommandHandler<S> {
    pub fn new(repository: Arc<AggregateRepository<OrderAggregate, S>>) -> Self {
        Self { repository }
    }

    /// Place and persist a new order, returning its id
    pub async fn place_order(&self, customer_id: Uuid, items: Vec<OrderItem>) -> Result<Uuid> {
        let order_id = Uuid::now_v7();
        let mut order = OrderAggregate::place(order_id, customer_id, items)?;

        self.repository.save_aggregate(&mut order).await?;

        tracing::info!(order_id = %order_id, customer_id = %customer_id, "Order placed");
        Ok(order_id)
    }

    /// Handle a command and persist resulting events
    /// Returns the order's version afterwards
    pub async fn handle(&self, order_id: Uuid, command: OrderCommand) -> Result<i64> {
        // Load current aggregate state
        let mut order = self
            .repository
            .find_aggregate(order_id)
            .await?
            .ok_or_else(|| anyhow!("Aggregate does not exist: {}", order_id))?;

        let raised = order.execute(&command)?;
        if raised > 0 {
            self.repository.save_aggregate(&mut order).await?;
        }

        tracing::debug!(order_id = %order_id, raised, version = order.version(), "Command handled");
        Ok(order.version())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::domain::order::{OrderError, OrderStatus};
    use crate::event_sourcing::core::EventEnvelope;
    use crate::event_sourcing::store::TextFileEventStore;

    fn handler(dir: &tempfile::TempDir) -> (OrderCommandHandler<TextFileEventStore>, Arc<AggregateRepository<OrderAggregate, TextFileEventStore>>) {
        let store = Arc::new(TextFileEventStore::new(StoreConfig::new(dir.path(), "\n")).unwrap());
        let repository = Arc::new(AggregateRepository::new(store, OrderAggregate::load_from_events));
        (OrderCommandHandler::new(repository.clone()), repository)
    }

    fn items() -> Vec<OrderItem> {
        vec![OrderItem::new(Uuid::new_v4(), 2), OrderItem::new(Uuid::new_v4(), 1)]
    }

    #[tokio::test]
    async fn test_place_and_drive_order() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(&dir);

        let order_id = handler.place_order(Uuid::new_v4(), items()).await.unwrap();
        assert_eq!(handler.handle(order_id, OrderCommand::ConfirmOrder).await.unwrap(), 2);
        let version = handler
            .handle(
                order_id,
                OrderCommand::ShipOrder {
                    tracking_number: "1Z999".to_string(),
                    carrier: "UPS".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(version, 3);

        let order = repository.find_aggregate(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.carrier.as_deref(), Some("UPS"));
        assert_eq!(repository.get_aggregate_ids().await.unwrap(), vec![order_id]);
    }

    #[tokio::test]
    async fn test_update_items_is_saved_and_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(&dir);

        let order_id = handler.place_order(Uuid::new_v4(), items()).await.unwrap();
        let replacement = vec![OrderItem::new(Uuid::new_v4(), 4)];
        let version = handler
            .handle(order_id, OrderCommand::UpdateItems { items: replacement.clone(), reason: None })
            .await
            .unwrap();
        assert_eq!(version, 2);

        let stored: Vec<EventEnvelope<OrderEvent>> = repository
            .event_store()
            .get_events(OrderAggregate::AGGREGATE_TYPE, order_id)
            .await
            .unwrap();
        let types: Vec<&str> = stored.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["OrderCreated", "OrderItemsUpdated"]);

        let order = repository.find_aggregate(order_id).await.unwrap().unwrap();
        assert_eq!(order.items, replacement);
        assert_eq!(order.version, 2);
    }

    #[tokio::test]
    async fn test_unknown_order_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, _) = handler(&dir);

        let result = handler.handle(Uuid::new_v4(), OrderCommand::ConfirmOrder).await;
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_rejected_command_appends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(&dir);

        let order_id = handler.place_order(Uuid::new_v4(), items()).await.unwrap();
        let err = handler
            .handle(order_id, OrderCommand::DeliverOrder { signature: None })
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<OrderError>(), Some(OrderError::NotShipped)));

        let order = repository.find_aggregate(order_id).await.unwrap().unwrap();
        assert_eq!(order.version, 1);
    }

    #[tokio::test]
    async fn test_invalid_new_order_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, repository) = handler(&dir);

        assert!(handler.place_order(Uuid::new_v4(), vec![]).await.is_err());
        assert!(repository.get_aggregate_ids().await.unwrap().is_empty());
    }
}
