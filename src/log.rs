use color_eyre::eyre::Report;
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Installs color-eyre panic/error hooks and the global tracing subscriber.
///
/// Log verbosity is controlled with `RUST_LOG`, defaulting to `info`.
pub fn init() -> Result<(), Report> {
    color_eyre::install()?;

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(ErrorLayer::default())
        .with(fmt::layer());
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
