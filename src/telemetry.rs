//! Log setup for the differentie service.
//!
//! Two targets carry our own events:
//!   - `differentie_backend`: sessions, commands, uploads, startup
//!   - `generation`: backend latency, reply sizes, section extraction
//!
//! `LOG_LEVEL` takes an `EnvFilter` directive string, e.g. `generation=trace`.
//! `LOG_FORMAT=json` emits one JSON object per event for log shippers.
//! Request spans come from the router's `TraceLayer` under `tower_http`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,generation=debug,differentie_backend=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
