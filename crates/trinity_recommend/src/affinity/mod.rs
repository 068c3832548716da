use std::collections::{HashMap, HashSet};
use trinity_core::Article;

/// Tags a reader has responded well to, with how often each one appeared
/// across their positively rated articles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagAffinity {
    counts: HashMap<String, usize>,
}

impl TagAffinity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_articles<'a, I>(articles: I) -> Self
    where
        I: IntoIterator<Item = &'a Article>,
    {
        let mut affinity = Self::new();
        for article in articles {
            affinity.add_article(article);
        }
        affinity
    }

    pub fn add_article(&mut self, article: &Article) {
        let mut seen = HashSet::new();
        for tag in &article.tags {
            if seen.insert(tag.as_str()) {
                *self.counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.counts.contains_key(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// The `n` most frequent tags. Equal counts are ordered by tag name.
    pub fn top_tags(&self, n: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, &usize)> = self.counts.iter().collect();
        ranked.sort_by(|(tag_a, count_a), (tag_b, count_b)| {
            count_b.cmp(count_a).then_with(|| tag_a.cmp(tag_b))
        });
        ranked.into_iter().take(n).map(|(tag, _)| tag.clone()).collect()
    }
}
