use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use trinity_core::{
    Article, ArticleFilter, ArticleId, ArticleRecord, ArticleStore, Error, Reaction, ReactionKind,
    ReactionRecord, Result, UserId,
};
use crate::{BackendConfig, StorageBackend};

const DEFAULT_DB_PATH: &str = "trinity.db";

const ARTICLE_COLUMNS: &str = "id, title, content, summary, tags, published_at, processed";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        summary TEXT,
        tags TEXT,
        published_at TEXT NOT NULL,
        processed BOOLEAN NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reactions (
        user_id TEXT NOT NULL,
        article_id TEXT NOT NULL,
        reaction_type TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (user_id, article_id, reaction_type)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reactions_user ON reactions (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_articles_published ON articles (published_at)",
];

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> Error + '_ {
    move |e| Error::Database(format!("{}: {}", context, e))
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn name() -> &'static str {
        "sqlite"
    }

    async fn connect(config: &BackendConfig) -> Result<Self> {
        let url = config.url.as_deref().unwrap_or(DEFAULT_DB_PATH);
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        Self::new_with_path(Path::new(path)).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }
        debug!("SQLite store opened at {}", db_path.display());

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    /// Turns rows into articles, skipping any row that does not hold a
    /// usable article.
    fn articles_from_rows(rows: Vec<SqliteRow>) -> Vec<Article> {
        rows.into_iter()
            .filter_map(|row| match article_from_row(&row) {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!("⚠️ Skipping malformed article row: {}", e);
                    None
                }
            })
            .collect()
    }
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let get_err = |e: sqlx::Error| Error::MalformedRecord(e.to_string());
    let tags = match row.try_get::<Option<String>, _>("tags").map_err(get_err)? {
        Some(raw) => Some(serde_json::from_str::<Vec<String>>(&raw).map_err(|e| {
            Error::MalformedRecord(format!("tags column is not a JSON string array: {}", e))
        })?),
        None => None,
    };

    let record = ArticleRecord {
        id: row.try_get("id").map_err(get_err)?,
        title: row.try_get("title").map_err(get_err)?,
        content: row.try_get("content").map_err(get_err)?,
        summary: row.try_get("summary").map_err(get_err)?,
        tags,
        published_at: row.try_get("published_at").map_err(get_err)?,
        processed: row.try_get("processed").map_err(get_err)?,
    };
    Article::try_from(record)
}

fn reaction_from_row(row: &SqliteRow) -> Result<Reaction> {
    let get_err = |e: sqlx::Error| Error::MalformedRecord(e.to_string());
    let record = ReactionRecord {
        user_id: row.try_get("user_id").map_err(get_err)?,
        article_id: row.try_get("article_id").map_err(get_err)?,
        reaction_type: row.try_get("reaction_type").map_err(get_err)?,
    };
    Reaction::try_from(record)
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn get_article(&self, id: &ArticleId) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS))
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(db_error("Failed to get article"))?;

        row.map(|row| article_from_row(&row)).transpose()
    }

    async fn get_articles(&self, ids: &[ArticleId]) -> Result<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM articles WHERE id IN (",
            ARTICLE_COLUMNS
        ));
        {
            let mut separated = query.separated(", ");
            for id in ids {
                separated.push_bind(id.0.clone());
            }
            separated.push_unseparated(")");
        }

        let rows = query
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to get articles"))?;

        Ok(Self::articles_from_rows(rows))
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM articles WHERE 1 = 1",
            ARTICLE_COLUMNS
        ));
        if filter.processed_only {
            query.push(" AND processed = 1");
        }
        if !filter.exclude_ids.is_empty() {
            query.push(" AND id NOT IN (");
            let mut separated = query.separated(", ");
            for id in &filter.exclude_ids {
                separated.push_bind(id.0.clone());
            }
            separated.push_unseparated(")");
        }
        query.push(" ORDER BY published_at DESC, id");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = query
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to list articles"))?;

        Ok(Self::articles_from_rows(rows))
    }

    async fn list_reactions_by_user(
        &self,
        user_id: &UserId,
        kinds: &[ReactionKind],
    ) -> Result<Vec<Reaction>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT user_id, article_id, reaction_type FROM reactions WHERE user_id = ",
        );
        query.push_bind(user_id.0.clone());
        if !kinds.is_empty() {
            query.push(" AND reaction_type IN (");
            let mut separated = query.separated(", ");
            for kind in kinds {
                separated.push_bind(kind.as_str());
            }
            separated.push_unseparated(")");
        }
        query.push(" ORDER BY created_at");

        let rows = query
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(db_error("Failed to list reactions"))?;

        let reactions = rows
            .iter()
            .filter_map(|row| match reaction_from_row(row) {
                Ok(reaction) => Some(reaction),
                Err(e) => {
                    warn!("⚠️ Skipping malformed reaction row: {}", e);
                    None
                }
            })
            .collect();
        Ok(reactions)
    }

    async fn store_article(&self, article: &Article) -> Result<()> {
        let tags = serde_json::to_string(&article.tags)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO articles
            (id, title, content, summary, tags, published_at, processed)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.id.as_str())
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.summary.as_deref())
        .bind(tags)
        .bind(article.published_at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .bind(article.processed)
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to store article"))?;

        Ok(())
    }

    async fn store_reaction(&self, reaction: &Reaction) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO reactions (user_id, article_id, reaction_type) VALUES (?, ?, ?)",
        )
        .bind(reaction.user_id.as_str())
        .bind(reaction.article_id.as_str())
        .bind(reaction.kind.as_str())
        .execute(&*self.pool)
        .await
        .map_err(db_error("Failed to store reaction"))?;

        Ok(())
    }
}
