use std::{net::SocketAddr, sync::Arc, time::Duration};

use tracing_subscriber::EnvFilter;

use stocklens::{
    config::{self, StoreBackend},
    routes,
    services::{
        alert_monitor::{spawn_alert_monitor, AlertEvaluator},
        market::Sources,
        store::{AlertStore, MemoryStore, MongoStore, UserStore},
    },
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let settings = config::load();

    let (users, alerts): (Arc<dyn UserStore>, Arc<dyn AlertStore>) = match settings.store_backend {
        StoreBackend::Mongo => {
            let store = MongoStore::connect(&settings.mongodb_uri, &settings.mongodb_db)
                .await
                .expect("Failed to connect to MongoDB");

            if let Err(e) = store.ensure_indexes().await {
                tracing::error!(error = %e, "ensure_indexes failed");
            }

            let store = Arc::new(store);
            (store.clone() as Arc<dyn UserStore>, store as Arc<dyn AlertStore>)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn UserStore>, store as Arc<dyn AlertStore>)
        }
    };

    let sources = Sources::from_settings(&settings);
    let state = AppState::new(settings.clone(), users, alerts.clone(), &sources);

    if settings.alert_sweep_secs > 0 {
        let evaluator = AlertEvaluator::new(alerts, sources.sweep_market.clone(), sources.sweep_news.clone())
            .with_timeout(settings.provider_timeout())
            .with_concurrency(settings.sweep_concurrency)
            .with_events(state.events_tx.clone());

        spawn_alert_monitor(Arc::new(evaluator), Duration::from_secs(settings.alert_sweep_secs));
        tracing::info!(every_secs = settings.alert_sweep_secs, "alert monitor started");
    } else {
        tracing::info!("alert monitor disabled");
    }

    let app = routes::app(state);

    let ip: std::net::IpAddr = settings.host.parse().expect("HOST must be an IP address");
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.expect("bind failed");
    axum::serve(listener, app).await.expect("server error");
}
