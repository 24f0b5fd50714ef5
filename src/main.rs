use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

mod app;
mod auth;
mod config;
mod db;
mod email;
mod state;
#[cfg(test)]
mod test_support;

const DEFAULT_LOG_FILTER: &str = "authgate=debug,axum=info,tower_http=info";

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().with_target(false).init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());

    let state = state::AppState::init().await?;
    let addr = state.config.listen_addr;
    app::serve(app::build_app(state), addr).await
}
