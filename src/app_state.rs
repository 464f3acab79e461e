use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    database::SocialDatabase,
    error::AppResult,
    forms::ContentPolicy,
    infrastructure::{
        media::MediaStorage,
        page_cache::PageCache,
        pagination::Paginator,
        privacy::{create_default_privacy_policy, PrivacyPolicy},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub database: Arc<SocialDatabase>,
    pub page_cache: PageCache,
    pub media: MediaStorage,
    pub paginator: Paginator,
    pub privacy: Arc<PrivacyPolicy>,
    pub content_policy: Arc<ContentPolicy>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let database = SocialDatabase::connect(&config.database.url, config.database.max_connections).await?;
        database.init().await?;

        Ok(Self::with_database(Arc::new(database), config))
    }

    pub fn with_database(database: Arc<SocialDatabase>, config: Config) -> Self {
        Self {
            database,
            page_cache: PageCache::new(
                config.cache.capacity,
                Duration::from_secs(config.cache.index_ttl_secs),
            ),
            media: MediaStorage::new(&config.media.root, config.media.url.clone()),
            paginator: Paginator::new(config.pagination.per_page),
            privacy: Arc::new(create_default_privacy_policy()),
            content_policy: Arc::new(ContentPolicy::from_config(&config.moderation)),
            config,
        }
    }
}
