//! Leibniz server
//!
//! ## Usage
//!
//! ```bash
//! leibniz-web                         # port 5000, state in ./data
//! PORT=8080 leibniz-web               # custom port (also read from .env)
//! leibniz-web --data-dir /var/lib/pi  # custom state directory
//! leibniz-web --in-memory             # nothing persisted
//! ```

use std::sync::Arc;

use leibniz_config::{Config, LogFormat};
use leibniz_web::{routes, serve, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "leibniz_web=info,leibniz_service=info,leibniz_store=info,tower_http=info".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    init_tracing(config.log_format);

    tracing::info!("Leibniz: memoized Gregory-Leibniz pi");
    let state = Arc::new(AppState::load(&config).await?);
    routes::log_routes();

    serve(state, &config.bind_addr()).await
}
