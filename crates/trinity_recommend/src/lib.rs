pub mod affinity;
pub mod scoring;
pub mod service;

pub use affinity::TagAffinity;
pub use scoring::{rank, ScoredArticle};
pub use service::Recommender;

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    /// Results returned when the caller does not ask for a specific count
    pub default_limit: usize,
    /// How many of the newest eligible articles are read from the store before scoring
    pub candidate_pool: usize,
    /// Tags reported by the interests query
    pub interest_tags: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            candidate_pool: 10,
            interest_tags: 3,
        }
    }
}

pub mod prelude {
    pub use super::affinity::TagAffinity;
    pub use super::scoring::{rank, recency_bonus, score_article, ScoredArticle};
    pub use super::service::Recommender;
    pub use super::RecommenderConfig;
    pub use trinity_core::{Article, ArticleId, Error, Reaction, ReactionKind, Result, UserId};
}
