use anyhow::Result;
use tracing_subscriber::EnvFilter;

use invoice_scanner::config::Settings;
use invoice_scanner::services::state::AppState;
use invoice_scanner::ui;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("invoice_scanner=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env()?;
    let (state, notices) = AppState::from_settings(&settings)?;
    ui::run(state, notices).await
}
