use std::sync::Arc;
use trinity_core::ArticleStore;
use trinity_recommend::{Recommender, RecommenderConfig};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ArticleStore>,
    pub recommender: Recommender,
}

impl AppState {
    pub fn new(store: Arc<dyn ArticleStore>, config: RecommenderConfig) -> Self {
        Self {
            recommender: Recommender::new(store.clone(), config),
            store,
        }
    }

    pub fn from_recommender(recommender: Recommender) -> Self {
        Self {
            store: recommender.store().clone(),
            recommender,
        }
    }
}
