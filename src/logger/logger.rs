use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt,
    layer::{Layered, SubscriberExt},
    reload,
    util::SubscriberInitExt,
};

const BOOTSTRAP_FILTER: &str = "info";

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type FormatLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    Text,
    /// One JSON object per event, with the current span's fields.
    Json,
}

pub struct LogConfig {
    pub filter: String,
    pub format: LogFormat,
}

/// Global subscriber whose filter and output format can be swapped once settings are known.
///
/// `RUST_LOG`, when set, only shapes the bootstrap phase; the settings filter replaces it.
pub struct Logger {
    filter_handle: reload::Handle<EnvFilter, Registry>,
    format_handle: reload::Handle<FormatLayer, FilteredRegistry>,
}

fn format_layer(format: LogFormat) -> FormatLayer {
    match format {
        LogFormat::Text => fmt::layer().with_target(false).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    }
}

impl Logger {
    pub fn new_bootstrap() -> Self {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_FILTER));
        let (filter, filter_handle) = reload::Layer::new(filter);
        let (format, format_handle) = reload::Layer::new(format_layer(LogFormat::Text));

        tracing_subscriber::registry()
            .with(filter)
            .with(format)
            .init();

        Self {
            filter_handle,
            format_handle,
        }
    }

    /// Spans opened before a format switch carry no fields for the new format, so call this
    /// before any span is entered.
    pub fn reload_from_config(&self, config: &LogConfig) -> Result<()> {
        let filter = EnvFilter::try_new(&config.filter)
            .with_context(|| format!("invalid log filter {:?}", config.filter))?;
        self.filter_handle
            .reload(filter)
            .context("log subscriber is gone")?;
        self.format_handle
            .reload(format_layer(config.format))
            .context("log subscriber is gone")?;
        Ok(())
    }
}
