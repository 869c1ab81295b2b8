use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_orders::api::{self, AppState};
use storefront_orders::config::{AppConfig, StoreBackend};
use storefront_orders::cql;
use storefront_orders::domain::order::{Order, OrderLifecycleManager};
use storefront_orders::domain::refund::{RefundLifecycleManager, RefundRequest};
use storefront_orders::ledger::{CatalogLedger, CatalogSeed, MemoryLedger, ScyllaLedger};
use storefront_orders::metrics::Metrics;
use storefront_orders::notifications::{
    JsonFileSettings, NotificationDispatcher, NotificationSettings, SettingsProvider, SmtpMailer,
    StaticSettings,
};
use storefront_orders::reporting::SalesReporter;
use storefront_orders::store::{DocumentStore, MemoryStore, ScyllaStore};

struct Backends {
    orders: Arc<dyn DocumentStore<Order>>,
    refunds: Arc<dyn DocumentStore<RefundRequest>>,
    ledger: Arc<dyn CatalogLedger>,
}

async fn connect_backends(config: &AppConfig) -> anyhow::Result<Backends> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Backends {
                orders: Arc::new(MemoryStore::<Order>::new()),
                refunds: Arc::new(MemoryStore::<RefundRequest>::new()),
                ledger: Arc::new(MemoryLedger::new()),
            })
        }
        StoreBackend::Scylla => {
            tracing::info!(node = %config.scylla_node, keyspace = %config.scylla_keyspace, "Connecting to ScyllaDB...");
            let session = Arc::new(cql::connect(&config.scylla_node, &config.scylla_keyspace).await?);
            Ok(Backends {
                orders: Arc::new(ScyllaStore::<Order>::new(session.clone())),
                refunds: Arc::new(ScyllaStore::<RefundRequest>::new(session.clone())),
                ledger: Arc::new(ScyllaLedger::new(session)),
            })
        }
    }
}

fn settings_provider(config: &AppConfig) -> Arc<dyn SettingsProvider> {
    match &config.settings_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Notification settings read from file on every send");
            Arc::new(
                JsonFileSettings::new(path.clone())
                    .with_storefront_url(config.storefront_url.clone()),
            )
        }
        None => {
            tracing::warn!("SETTINGS_PATH not set; email sending stays disabled");
            Arc::new(StaticSettings::new(NotificationSettings {
                storefront_url: config.storefront_url.clone(),
                ..NotificationSettings::default()
            }))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,storefront_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting storefront order service");

    let config = AppConfig::from_env()?;

    // === 1. Storage and ledger ===
    let backends = connect_backends(&config).await?;
    if let Some(path) = &config.catalog_seed_path {
        tracing::info!(path = %path.display(), "Seeding catalog ledger");
        CatalogSeed::load(path).await?.apply(backends.ledger.as_ref()).await?;
    }

    // === 2. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Notifications ===
    let dispatcher = Arc::new(NotificationDispatcher::new(
        settings_provider(&config),
        Arc::new(SmtpMailer::new()),
        metrics.clone(),
    ));

    // === 4. Lifecycle managers ===
    let state = AppState {
        orders: Arc::new(OrderLifecycleManager::new(
            backends.orders.clone(),
            backends.ledger,
            dispatcher.clone(),
            metrics.clone(),
            config.order_code_prefix.clone(),
        )),
        refunds: Arc::new(RefundLifecycleManager::new(
            backends.refunds,
            backends.orders.clone(),
            dispatcher.clone(),
            metrics.clone(),
            config.refund_code_prefix.clone(),
        )),
        reporter: Arc::new(SalesReporter::new(backends.orders)),
        dispatcher,
        metrics,
    };

    // === 5. HTTP ===
    api::serve(state, config.http_port).await?;

    tracing::info!("👋 Shut down");
    Ok(())
}
