use tracing_subscriber::{fmt, EnvFilter};

use crate::Result;

/// Initialize tracing for the assistant.
///
/// Default: info for our crates, overridable with `RUST_LOG`.
pub fn init(service_name: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,jagwax=info,jagwax_core=info,{service_name}=info"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .init();

    Ok(())
}
