use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use trinity_core::{
    Article, ArticleFilter, ArticleId, ArticleStore, Reaction, ReactionKind, Result, UserId,
};
use crate::affinity::TagAffinity;
use crate::scoring::{rank, ScoredArticle};
use crate::RecommenderConfig;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Ranks articles for a reader using the tags of articles they reacted to
/// positively, resolving those articles through an [`ArticleStore`].
#[derive(Clone)]
pub struct Recommender {
    store: Arc<dyn ArticleStore>,
    config: RecommenderConfig,
    clock: Clock,
}

impl fmt::Debug for Recommender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recommender")
            .field("store", &"<dyn ArticleStore>")
            .field("config", &self.config)
            .finish()
    }
}

impl Recommender {
    pub fn new(store: Arc<dyn ArticleStore>, config: RecommenderConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the time source used for recency bonuses.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ArticleStore> {
        &self.store
    }

    /// Builds the affinity set for a reaction history. Trash reactions carry
    /// no weight. All referenced articles are fetched in a single store call;
    /// if that call fails the history contributes nothing and ranking falls
    /// back to recency alone.
    pub async fn affinity_for(&self, reactions: &[Reaction]) -> Result<TagAffinity> {
        let mut seen = HashSet::new();
        let ids: Vec<ArticleId> = reactions
            .iter()
            .filter(|r| r.kind.is_positive())
            .filter(|r| seen.insert(r.article_id.clone()))
            .map(|r| r.article_id.clone())
            .collect();

        if ids.is_empty() {
            return Ok(TagAffinity::new());
        }

        let liked = match self.store.get_articles(&ids).await {
            Ok(liked) => liked,
            Err(e) => {
                warn!("⚠️ Could not resolve {} reacted articles, ignoring history: {}", ids.len(), e);
                return Ok(TagAffinity::new());
            }
        };
        if liked.len() < ids.len() {
            debug!(
                "Resolved {} of {} reacted articles; the rest contribute no tags",
                liked.len(),
                ids.len()
            );
        }
        Ok(TagAffinity::from_articles(&liked))
    }

    /// Ranks `candidates` for the reader whose positive history is `reactions`.
    pub async fn recommend(
        &self,
        candidates: &[Article],
        reactions: &[Reaction],
        exclude: &HashSet<ArticleId>,
        limit: usize,
    ) -> Result<Vec<ScoredArticle>> {
        let affinity = self.affinity_for(reactions).await?;
        let ranked = rank(candidates, &affinity, exclude, limit, (self.clock)());
        debug!(
            "Ranked {} candidates against {} affinity tags, returning {}",
            candidates.len(),
            affinity.len(),
            ranked.len()
        );
        Ok(ranked)
    }

    pub async fn positive_reactions(&self, user_id: &UserId) -> Result<Vec<Reaction>> {
        self.store
            .list_reactions_by_user(user_id, &ReactionKind::POSITIVE)
            .await
    }

    /// The newest processed articles outside `exclude`, capped at the
    /// configured candidate pool.
    pub async fn candidate_pool(&self, exclude: &HashSet<ArticleId>) -> Result<Vec<Article>> {
        let filter = ArticleFilter::processed()
            .excluding(exclude.iter().cloned())
            .with_limit(self.config.candidate_pool);
        self.store.list_articles(&filter).await
    }

    /// End-to-end recommendation for a user: their positive reactions drive
    /// the affinity set and the articles they already reacted to are skipped.
    pub async fn recommend_for_user(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredArticle>> {
        let reactions = self.positive_reactions(user_id).await?;
        let exclude: HashSet<ArticleId> = reactions.iter().map(|r| r.article_id.clone()).collect();
        let candidates = self.candidate_pool(&exclude).await?;
        let limit = limit.unwrap_or(self.config.default_limit);

        debug!(
            "Recommending for {} from {} candidates ({} reactions)",
            user_id,
            candidates.len(),
            reactions.len()
        );
        self.recommend(&candidates, &reactions, &exclude, limit).await
    }

    /// Most frequent tags across the articles the user rated smart.
    pub async fn interests_for_user(&self, user_id: &UserId, n: Option<usize>) -> Result<Vec<String>> {
        let reactions = self
            .store
            .list_reactions_by_user(user_id, &[ReactionKind::Smart])
            .await?;
        let affinity = self.affinity_for(&reactions).await?;
        Ok(affinity.top_tags(n.unwrap_or(self.config.interest_tags)))
    }
}
