use std::sync::Once;

use env_logger::{Builder, Env};

/// Filter used when `RUST_LOG` is unset: catalog and binary chatter at `info`, dependencies at `warn`.
pub const DEFAULT_FILTER: &str = "warn,town_index=info,towns=info";

static LOGGER: Once = Once::new();

/// Route `log` records to stderr through `env_logger`.
///
/// Safe to call repeatedly. When a logger is already registered, that one stays in place.
pub fn initialize_logger() {
    LOGGER.call_once(|| {
        let env = Env::default().default_filter_or(DEFAULT_FILTER);
        let installed = Builder::from_env(env)
            .format_timestamp_millis()
            .try_init()
            .is_ok();
        if installed {
            log::debug!("logging ready");
        }
    });
}

#[cfg(test)]
mod tests {
    use log::{debug, info, warn};

    use super::*;

    #[test]
    fn test_repeated_initialization() {
        initialize_logger();
        initialize_logger();
        debug!("hidden unless RUST_LOG asks for it");
        info!("catalog info line");
        warn!("catalog warning line");
    }
}
