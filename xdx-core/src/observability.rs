//! Tracing setup for binaries built on xdx-core.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the embedding program installs a subscriber, e.g. with [`init`].

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` directives are honored on top of `default_level`. Fails if a
/// global subscriber is already set.
pub fn init(default_level: Level) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .try_init()?;
    Ok(())
}
