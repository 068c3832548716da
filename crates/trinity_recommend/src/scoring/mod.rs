use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use trinity_core::{Article, ArticleId};
use crate::affinity::TagAffinity;

/// Articles younger than this get the recent bonus.
pub const RECENT_WINDOW_DAYS: i64 = 7;
/// Articles younger than this also get the fresh bonus, on top of the recent one.
pub const FRESH_WINDOW_DAYS: i64 = 3;
pub const RECENT_BONUS: u32 = 2;
pub const FRESH_BONUS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: Article,
    pub score: u32,
}

pub fn recency_bonus(age: Duration) -> u32 {
    let mut bonus = 0;
    if age < Duration::days(RECENT_WINDOW_DAYS) {
        bonus += RECENT_BONUS;
    }
    if age < Duration::days(FRESH_WINDOW_DAYS) {
        bonus += FRESH_BONUS;
    }
    bonus
}

pub fn tag_overlap(article: &Article, affinity: &TagAffinity) -> u32 {
    article.tags.iter().filter(|tag| affinity.contains(tag)).count() as u32
}

pub fn score_article(article: &Article, affinity: &TagAffinity, now: DateTime<Utc>) -> u32 {
    tag_overlap(article, affinity) + recency_bonus(now - article.published_at)
}

/// Scores every candidate not in `exclude` and returns the best `limit`,
/// highest score first. Equal scores keep their input order.
pub fn rank(
    candidates: &[Article],
    affinity: &TagAffinity,
    exclude: &HashSet<ArticleId>,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<ScoredArticle> {
    let mut scored: Vec<ScoredArticle> = candidates
        .iter()
        .filter(|article| !exclude.contains(&article.id))
        .map(|article| ScoredArticle {
            score: score_article(article, affinity, now),
            article: article.clone(),
        })
        .collect();

    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn article(id: &str, tags: &[&str], age: Duration) -> Article {
        Article::new(id, format!("Article {}", id), now() - age).with_tags(tags.iter().copied())
    }

    fn ids(ranked: &[ScoredArticle]) -> Vec<&str> {
        ranked.iter().map(|s| s.article.id.as_str()).collect()
    }

    fn affinity(tags: &[&str]) -> TagAffinity {
        TagAffinity::from_articles(&[article("liked", tags, Duration::days(30))])
    }

    #[test]
    fn test_recency_bonus_buckets() {
        assert_eq!(recency_bonus(Duration::hours(1)), 3);
        assert_eq!(recency_bonus(Duration::days(3) - Duration::seconds(1)), 3);
        assert_eq!(recency_bonus(Duration::days(3)), 2);
        assert_eq!(recency_bonus(Duration::days(6)), 2);
        assert_eq!(recency_bonus(Duration::days(7)), 0);
        assert_eq!(recency_bonus(Duration::days(40)), 0);
    }

    #[test]
    fn test_future_dated_article_counts_as_fresh() {
        assert_eq!(recency_bonus(Duration::hours(-5)), 3);
    }

    #[test]
    fn test_reference_scenario() {
        let affinity = affinity(&["LLM", "OpenAI", "Hype"]);
        let candidates = vec![
            article("1", &["LLM"], Duration::days(1)),
            article("2", &["LLM", "OpenAI"], Duration::days(10)),
            article("3", &[], Duration::days(2)),
        ];

        let ranked = rank(&candidates, &affinity, &HashSet::new(), 2, now());
        assert_eq!(ids(&ranked), vec!["1", "3"]);
        assert_eq!(ranked.iter().map(|s| s.score).collect::<Vec<_>>(), vec![4, 3]);

        let all = rank(&candidates, &affinity, &HashSet::new(), 10, now());
        assert_eq!(all[2].score, 2);
    }

    #[test]
    fn test_empty_affinity_is_pure_recency_order() {
        let candidates = vec![
            article("old-a", &["LLM"], Duration::days(20)),
            article("week-a", &[], Duration::days(5)),
            article("fresh-a", &[], Duration::days(2)),
            article("old-b", &[], Duration::days(9)),
            article("fresh-b", &["Hype"], Duration::hours(3)),
            article("week-b", &[], Duration::days(4)),
        ];

        let ranked = rank(&candidates, &TagAffinity::new(), &HashSet::new(), 10, now());
        assert_eq!(
            ids(&ranked),
            vec!["fresh-a", "fresh-b", "week-a", "week-b", "old-a", "old-b"]
        );
    }

    #[test]
    fn test_tag_overlap_outranks_same_age() {
        let affinity = affinity(&["LLM", "OpenAI"]);
        let candidates = vec![
            article("b", &["Robotics"], Duration::days(10)),
            article("a", &["LLM", "OpenAI"], Duration::days(10)),
        ];

        let ranked = rank(&candidates, &affinity, &HashSet::new(), 2, now());
        assert_eq!(ids(&ranked), vec!["a", "b"]);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_exclusions_and_limit() {
        let candidates: Vec<Article> = (0..6)
            .map(|i| article(&i.to_string(), &[], Duration::days(i)))
            .collect();
        let exclude: HashSet<ArticleId> = ["1", "4"].into_iter().map(ArticleId::from).collect();

        let ranked = rank(&candidates, &TagAffinity::new(), &exclude, 3, now());
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|s| !exclude.contains(&s.article.id)));

        let everything = rank(&candidates, &TagAffinity::new(), &exclude, 50, now());
        assert_eq!(everything.len(), 4);

        assert!(rank(&candidates, &TagAffinity::new(), &exclude, 0, now()).is_empty());
        assert!(rank(&[], &TagAffinity::new(), &exclude, 5, now()).is_empty());
    }

    #[test]
    fn test_rank_is_deterministic_and_leaves_input_untouched() {
        let affinity = affinity(&["LLM"]);
        let candidates = vec![
            article("x", &["LLM"], Duration::days(8)),
            article("y", &[], Duration::days(8)),
            article("z", &["LLM"], Duration::days(8)),
        ];
        let before = candidates.clone();

        let first = rank(&candidates, &affinity, &HashSet::new(), 3, now());
        let second = rank(&candidates, &affinity, &HashSet::new(), 3, now());
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec!["x", "z", "y"]);
        assert_eq!(candidates, before);
    }

    #[test]
    fn test_scored_article_serializes_flat() {
        let scored = ScoredArticle {
            article: article("1", &["LLM"], Duration::days(1)),
            score: 4,
        };
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["score"], 4);
        assert_eq!(json["tags"][0], "LLM");
    }
}
