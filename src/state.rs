use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::chat::ChatService;
use crate::core::settings::Settings;
use crate::providers::ProviderRegistry;
use crate::retrieval::ContextRetriever;
use crate::store::DataStore;
use crate::summary::SummaryGenerator;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: DataStore,
    pub providers: Arc<ProviderRegistry>,
    pub chat: ChatService,
    pub summaries: SummaryGenerator,
    pub retriever: ContextRetriever,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub async fn initialize(settings: Settings) -> anyhow::Result<Arc<Self>> {
        let store = DataStore::connect(&settings.database_url).await?;
        let providers = Arc::new(ProviderRegistry::from_settings(&settings));
        Ok(Self::assemble(settings, store, providers))
    }

    /// Wire the services from already constructed parts. Tests use this to
    /// inject a temp database and stub providers.
    pub fn assemble(
        settings: Settings,
        store: DataStore,
        providers: Arc<ProviderRegistry>,
    ) -> Arc<Self> {
        let chat = ChatService::new(store.clone(), providers.clone(), &settings);
        let summaries = SummaryGenerator::new(store.clone(), providers.clone());
        let retriever = ContextRetriever::new(store.clone(), settings.max_context_documents);

        Arc::new(AppState {
            settings: Arc::new(settings),
            store,
            providers,
            chat,
            summaries,
            retriever,
            started_at: Utc::now(),
        })
    }
}
