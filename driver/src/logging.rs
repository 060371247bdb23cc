use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

const DEFAULT_FILTER: &str = "application=debug,driver=debug,sqlx=warn";

/// Installs the global subscriber. Later calls keep the first subscriber.
pub fn init_tracing() {
    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().with_filter(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into()),
            )),
        )
        .try_init();
    if let Err(error) = installed {
        tracing::debug!("tracing subscriber already installed: {error}");
    }
}
