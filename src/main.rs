use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use text_event_store::domain::order::{OrderAggregate, OrderCommand, OrderCommandHandler, OrderEvent, OrderItem};
use text_event_store::metrics::{self, Metrics};
use text_event_store::{Aggregate, AggregateRepository, AggregateSaved, StoreConfig, TextFileEventStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,text_event_store=debug"))
        )
        .init();

    tracing::info!("🚀 Starting text file event store demo");

    // === 1. Load configuration ===
    let config = StoreConfig::from_env()?;
    tracing::info!(folder = %config.folder.display(), "Using event store folder");

    // === 2. Initialize Prometheus metrics ===
    let metrics = Arc::new(Metrics::new()?);

    if let Some(port) = metrics_port()? {
        // actix-web wants its own system; keep it off the tokio runtime
        let registry = Arc::new(metrics.registry().clone());
        std::thread::spawn(move || {
            let system = actix_web::rt::System::new();
            if let Err(e) = system.block_on(metrics::start_metrics_server(registry, port)) {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    }

    // === 3. Wire store, repository and handler ===
    let store = Arc::new(TextFileEventStore::new(config)?.with_metrics(metrics.clone()));

    let mut repository = AggregateRepository::<OrderAggregate, _>::new(store, OrderAggregate::load_from_events)
        .with_metrics(metrics.clone());
    repository.add_listener(|saved: &AggregateSaved<OrderEvent>| {
        let types: Vec<&str> = saved.events.iter().map(|e| e.event_type.as_str()).collect();
        tracing::info!(
            aggregate_id = %saved.aggregate_id,
            events = ?types,
            "📣 Aggregate saved"
        );
    });
    let repository = Arc::new(repository);
    let handler = OrderCommandHandler::new(repository.clone());

    // === 4. Demonstrate order lifecycle ===
    let customer_id = Uuid::new_v4();
    let (first, second) = tokio::try_join!(
        handler.place_order(
            customer_id,
            vec![
                OrderItem::new(Uuid::new_v4(), 2),
                OrderItem::new(Uuid::new_v4(), 1),
            ],
        ),
        handler.place_order(customer_id, vec![OrderItem::new(Uuid::new_v4(), 5)]),
    )?;

    handler.handle(first, OrderCommand::ConfirmOrder).await?;
    handler
        .handle(
            first,
            OrderCommand::ShipOrder {
                tracking_number: "1Z999AA10123456784".to_string(),
                carrier: "UPS".to_string(),
            },
        )
        .await?;
    handler
        .handle(first, OrderCommand::DeliverOrder { signature: Some("J. Doe".to_string()) })
        .await?;

    handler
        .handle(
            second,
            OrderCommand::CancelOrder {
                reason: Some("Customer requested cancellation".to_string()),
                cancelled_by: Some(customer_id),
            },
        )
        .await?;

    // === 5. Replay everything from disk ===
    for order_id in repository.get_aggregate_ids().await? {
        match repository.find_aggregate(order_id).await? {
            Some(order) => tracing::info!(
                order_id = %order_id,
                status = ?order.status,
                version = order.version(),
                items = order.items.len(),
                "🔁 Replayed order"
            ),
            None => tracing::warn!(order_id = %order_id, "Listed order has no events"),
        }
    }

    tracing::info!("🎉 Demo complete!");

    Ok(())
}

fn metrics_port() -> anyhow::Result<Option<u16>> {
    match std::env::var("METRICS_PORT") {
        Ok(raw) => Ok(Some(raw.parse()?)),
        Err(_) => Ok(None),
    }
}
