use anyhow::Context;
use tokio::net::TcpListener;

use dossier_backend::core::logging;
use dossier_backend::core::settings::Settings;
use dossier_backend::server::router;
use dossier_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env().context("Invalid configuration")?;
    logging::init(&settings.log_dir);

    let state = AppState::initialize(settings)
        .await
        .context("Failed to initialize application state")?;

    if state.providers.available().is_empty() {
        tracing::warn!(
            "No AI provider credentials configured; /chat/ask will return provider-unavailable"
        );
    }

    let bind_addr = format!("127.0.0.1:{}", state.settings.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app = router::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
