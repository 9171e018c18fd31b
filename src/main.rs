mod catalog;
mod config;
mod error;
mod llm;
mod routes;
mod services;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::HubConfig::from_env();
    let settings = services::settings::SettingsStore::open(&config.settings_path).expect("settings load failed");
    tracing::info!(path = %settings.path().display(), "settings loaded");
    let llm_config = llm::config::LlmConfig::from_env().expect("invalid LLM config");

    // Stored credential wins; the environment key is only a fallback.
    let stored_key = settings.api_key().await;
    let api_key = llm::ApiKey::new(stored_key.or_else(|| llm_config.api_key.clone()));
    if api_key.get().is_none() {
        tracing::warn!("no API key configured; native tools reply with an error until one is set");
    }

    let client = llm::gemini::GeminiClient::new(&llm_config).expect("http client init failed");
    tracing::info!(model = client.model(), "LLM client initialized");
    let native: Arc<dyn llm::ResponseProvider> = Arc::new(llm::GeminiProvider::new(client, api_key.clone()));

    let mut initial = state::HubState::seeded();
    if let Some(name) = settings.user_name().await {
        initial.user.name = name;
    }
    let store = services::store::Store::new(initial);
    let catalog = catalog::Catalog::builtin();
    let broadcaster = Arc::new(services::broadcast::Broadcaster::new(
        store.clone(),
        catalog,
        native,
        config.broadcast(),
    ));

    let state = state::AppState { store, catalog, broadcaster, settings: Arc::new(settings), api_key };

    let app = routes::app(state);
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "databot hub listening");
    axum::serve(listener, app).await.expect("server failed");
}
