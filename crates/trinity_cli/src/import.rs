use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};
use trinity_core::{Article, ArticleRecord, ArticleStore, Reaction, ReactionRecord};

/// Layout of a seed file: boundary records, validated on the way in.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub articles: Vec<ArticleRecord>,
    #[serde(default)]
    pub reactions: Vec<ReactionRecord>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub articles: usize,
    pub reactions: usize,
    pub skipped: usize,
}

pub async fn import_seed(store: &dyn ArticleStore, seed: SeedFile) -> trinity_core::Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for record in seed.articles {
        match Article::try_from(record) {
            Ok(article) => {
                store.store_article(&article).await?;
                summary.articles += 1;
            }
            Err(e) => {
                warn!("⚠️ Skipping article: {}", e);
                summary.skipped += 1;
            }
        }
    }

    for record in seed.reactions {
        match Reaction::try_from(record) {
            Ok(reaction) if !reaction.user_id.as_str().is_empty() => {
                store.store_reaction(&reaction).await?;
                summary.reactions += 1;
            }
            Ok(reaction) => {
                warn!("⚠️ Skipping reaction on {}: missing user_id", reaction.article_id);
                summary.skipped += 1;
            }
            Err(e) => {
                warn!("⚠️ Skipping reaction: {}", e);
                summary.skipped += 1;
            }
        }
    }

    info!(
        "📥 Imported {} articles and {} reactions ({} skipped)",
        summary.articles, summary.reactions, summary.skipped
    );
    Ok(summary)
}

pub async fn import_file(store: &dyn ArticleStore, path: &Path) -> anyhow::Result<ImportSummary> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let seed: SeedFile = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid seed file", path.display()))?;
    Ok(import_seed(store, seed).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use trinity_core::{ArticleFilter, ReactionKind, UserId};
    use trinity_storage::InMemoryStorage;

    const SEED: &str = r#"{
        "articles": [
            {"id": "a", "title": "LLM news", "tags": ["LLM"], "published_at": "2024-05-01T00:00:00Z", "processed": true},
            {"id": "b", "title": "No date", "tags": ["LLM"]},
            {"id": "c", "title": "Draft", "tags": null, "published_at": "2024-05-02T00:00:00Z"}
        ],
        "reactions": [
            {"user_id": "u1", "article_id": "a", "reaction_type": "smart"},
            {"user_id": "u1", "article_id": "c", "reaction_type": "meh"},
            {"article_id": "c", "reaction_type": "funny"}
        ]
    }"#;

    #[tokio::test]
    async fn test_import_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let store = InMemoryStorage::new();
        let summary = import_file(&store, file.path()).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                articles: 2,
                reactions: 1,
                skipped: 3
            }
        );

        let processed = store.list_articles(&ArticleFilter::processed()).await.unwrap();
        assert_eq!(processed.len(), 1);
        let reactions = store
            .list_reactions_by_user(&UserId::from("u1"), &[ReactionKind::Smart])
            .await
            .unwrap();
        assert_eq!(reactions.len(), 1);
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[not json").unwrap();
        let store = InMemoryStorage::new();
        assert!(import_file(&store, file.path()).await.is_err());
    }
}
