use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use trinity_core::{
    Article, ArticleFilter, ArticleId, ArticleStore, Reaction, ReactionKind, Result, UserId,
};
use crate::{BackendConfig, StorageBackend};

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    reactions: Vec<Reaction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_article(&mut self, article: &Article) {
        if let Some(existing) = self.articles.iter_mut().find(|a| a.id == article.id) {
            *existing = article.clone();
        } else {
            self.articles.push(article.clone());
        }
    }

    pub fn store_reaction(&mut self, reaction: &Reaction) {
        if !self.reactions.contains(reaction) {
            self.reactions.push(reaction.clone());
        }
    }

    pub fn get_article(&self, id: &ArticleId) -> Option<Article> {
        self.articles.iter().find(|a| &a.id == id).cloned()
    }

    pub fn get_articles(&self, ids: &[ArticleId]) -> Vec<Article> {
        self.articles
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect()
    }

    pub fn list_articles(&self, filter: &ArticleFilter) -> Vec<Article> {
        filter.apply(&self.articles)
    }

    pub fn list_reactions_by_user(&self, user_id: &UserId, kinds: &[ReactionKind]) -> Vec<Reaction> {
        self.reactions
            .iter()
            .filter(|r| &r.user_id == user_id)
            .filter(|r| kinds.is_empty() || kinds.contains(&r.kind))
            .cloned()
            .collect()
    }
}

/// Process-local store, the default backend for the CLI and for tests.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(articles: &[Article], reactions: &[Reaction]) -> Self {
        let storage = Self::new();
        {
            let mut store = storage.store.write().await;
            for article in articles {
                store.store_article(article);
            }
            for reaction in reactions {
                store.store_reaction(reaction);
            }
        }
        storage
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn name() -> &'static str {
        "memory"
    }

    async fn connect(_config: &BackendConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStore for InMemoryStorage {
    async fn get_article(&self, id: &ArticleId) -> Result<Option<Article>> {
        Ok(self.store.read().await.get_article(id))
    }

    async fn get_articles(&self, ids: &[ArticleId]) -> Result<Vec<Article>> {
        Ok(self.store.read().await.get_articles(ids))
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        Ok(self.store.read().await.list_articles(filter))
    }

    async fn list_reactions_by_user(
        &self,
        user_id: &UserId,
        kinds: &[ReactionKind],
    ) -> Result<Vec<Reaction>> {
        Ok(self.store.read().await.list_reactions_by_user(user_id, kinds))
    }

    async fn store_article(&self, article: &Article) -> Result<()> {
        self.store.write().await.store_article(article);
        Ok(())
    }

    async fn store_reaction(&self, reaction: &Reaction) -> Result<()> {
        self.store.write().await.store_reaction(reaction);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn article(id: &str, days_old: i64, processed: bool) -> Article {
        let mut a = Article::new(id, format!("Article {}", id), Utc::now() - Duration::days(days_old))
            .with_tags(["LLM"]);
        a.processed = processed;
        a
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = InMemoryStorage::new();
        storage.store_article(&article("1", 1, true)).await.unwrap();

        let found = storage.get_article(&ArticleId::from("1")).await.unwrap();
        assert_eq!(found.map(|a| a.title), Some("Article 1".to_string()));
        assert!(storage.get_article(&ArticleId::from("2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_article_upserts() {
        let storage = InMemoryStorage::new();
        storage.store_article(&article("1", 1, true)).await.unwrap();
        let mut updated = article("1", 1, true);
        updated.title = "Renamed".to_string();
        storage.store_article(&updated).await.unwrap();

        let all = storage.list_articles(&ArticleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Renamed");
    }

    #[tokio::test]
    async fn test_list_articles_filter() {
        let storage = InMemoryStorage::seed(
            &[
                article("old", 9, true),
                article("draft", 0, false),
                article("new", 1, true),
                article("mid", 4, true),
            ],
            &[],
        )
        .await;

        let filter = ArticleFilter::processed()
            .excluding([ArticleId::from("mid")])
            .with_limit(5);
        let ids: Vec<String> = storage
            .list_articles(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_ordered_by_id() {
        let published = Utc::now() - Duration::days(1);
        let same = |id: &str| Article::new(id, "same time", published);
        let storage = InMemoryStorage::seed(&[same("c"), same("a"), same("b")], &[]).await;

        let ids: Vec<String> = storage
            .list_articles(&ArticleFilter::processed())
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_reactions_by_user_and_kind() {
        let storage = InMemoryStorage::seed(
            &[],
            &[
                Reaction::new("u1", "1", ReactionKind::Smart),
                Reaction::new("u1", "2", ReactionKind::Trash),
                Reaction::new("u1", "1", ReactionKind::Smart),
                Reaction::new("u2", "3", ReactionKind::Funny),
            ],
        )
        .await;

        let user = UserId::from("u1");
        let positive = storage
            .list_reactions_by_user(&user, &ReactionKind::POSITIVE)
            .await
            .unwrap();
        assert_eq!(positive, vec![Reaction::new("u1", "1", ReactionKind::Smart)]);

        let all = storage.list_reactions_by_user(&user, &[]).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
