//! Process-wide `tracing` setup.

use tracing_subscriber::EnvFilter;

/// Variable holding the log filter, checked before `RUST_LOG`.
pub const LOG_VAR: &str = "AZFN_LOG";

/// Installs a `tracing_subscriber` fmt subscriber filtered by `AZFN_LOG`, then
/// `RUST_LOG`, then `info`.
///
/// Calling it again once a subscriber is installed does nothing.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init();
}

/// The filter [`init`] installs.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        tracing::info!("logging initialized twice");
    }
}
