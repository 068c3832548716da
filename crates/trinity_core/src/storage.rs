use async_trait::async_trait;
use crate::types::{Article, ArticleId, Reaction, ReactionKind, UserId};
use crate::Result;

/// Query for candidate articles, always returned newest first.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub processed_only: bool,
    pub exclude_ids: Vec<ArticleId>,
    pub limit: Option<usize>,
}

impl ArticleFilter {
    pub fn processed() -> Self {
        Self {
            processed_only: true,
            ..Self::default()
        }
    }

    pub fn excluding<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = ArticleId>,
    {
        self.exclude_ids.extend(ids);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Applies the filter to an in-memory slice. Backends that cannot push
    /// the filter down to a query use this.
    pub fn apply<'a, I>(&self, articles: I) -> Vec<Article>
    where
        I: IntoIterator<Item = &'a Article>,
    {
        let mut matched: Vec<Article> = articles
            .into_iter()
            .filter(|a| !self.processed_only || a.processed)
            .filter(|a| !self.exclude_ids.contains(&a.id))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.published_at.cmp(&a.published_at).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Fetch a single article by id
    async fn get_article(&self, id: &ArticleId) -> Result<Option<Article>>;

    /// Fetch many articles in one call. Unknown ids are absent from the
    /// result and malformed rows are skipped.
    async fn get_articles(&self, ids: &[ArticleId]) -> Result<Vec<Article>>;

    /// List articles matching a filter, newest first
    async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>>;

    /// Reactions left by a user. An empty `kinds` slice matches every kind.
    async fn list_reactions_by_user(
        &self,
        user_id: &UserId,
        kinds: &[ReactionKind],
    ) -> Result<Vec<Reaction>>;

    /// Insert or replace an article
    async fn store_article(&self, article: &Article) -> Result<()>;

    /// Record a reaction; storing the same reaction twice is a no-op
    async fn store_reaction(&self, reaction: &Reaction) -> Result<()>;
}
