use std::sync::Arc;

use engram::{ImportanceClassifier, MemoryHub, MemoryStore};

mod adapters;
mod auth;
mod config;
mod routes;

use adapters::{AnthropicClassifier, HttpMemoryStore};
use config::ServerSettings;

/// Hub over the port traits so adapters can be swapped
pub type AppHub = MemoryHub<dyn ImportanceClassifier, dyn MemoryStore>;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<AppHub>,
    pub api_key: Option<String>,
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    tracing::info!("Engram API initializing...");

    let settings = ServerSettings::from_lookup(|key| secrets.get(key));

    if settings.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!("No ENGRAM_API_KEY set - authentication disabled");
    }

    if settings.anthropic_api_key.is_none() {
        tracing::warn!("No ANTHROPIC_API_KEY set - every interaction will be rejected");
    }

    let store: Arc<dyn MemoryStore> = Arc::new(
        HttpMemoryStore::new(
            &settings.brain_api_url,
            settings.brain_api_key.clone(),
            settings.brain_timeout,
        )
        .map_err(anyhow::Error::from)?,
    );
    tracing::info!("Brain store: {}", settings.brain_api_url);

    let classifier: Arc<dyn ImportanceClassifier> = Arc::new(AnthropicClassifier::new(
        settings.anthropic_api_key.clone(),
        settings.anthropic_model.clone(),
    ));
    tracing::info!("Classifier model: {}", settings.anthropic_model);

    let hub = MemoryHub::with_classifier_timeout(
        classifier,
        store,
        settings.admission.clone(),
        settings.classifier_timeout,
    );
    hub.start();
    tracing::info!(config = ?settings.admission, "Admission gate ready");

    let state = AppState {
        hub: Arc::new(hub),
        api_key: settings.api_key,
    };

    let router = routes::app(state);

    tracing::info!("Swagger UI: /swagger-ui");
    tracing::info!("Engram API ready");

    Ok(router.into())
}
