use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(ArticleId);
string_id!(UserId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Smart,
    Funny,
    Trash,
}

impl ReactionKind {
    pub const POSITIVE: [ReactionKind; 2] = [ReactionKind::Smart, ReactionKind::Funny];

    pub fn is_positive(self) -> bool {
        matches!(self, ReactionKind::Smart | ReactionKind::Funny)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Smart => "smart",
            ReactionKind::Funny => "funny",
            ReactionKind::Trash => "trash",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smart" => Ok(ReactionKind::Smart),
            "funny" => Ok(ReactionKind::Funny),
            "trash" => Ok(ReactionKind::Trash),
            other => Err(Error::InvalidInput(format!("unknown reaction kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub published_at: DateTime<Utc>,
    pub processed: bool,
}

impl Article {
    pub fn new(id: impl Into<ArticleId>, title: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            summary: None,
            tags: Vec::new(),
            published_at,
            processed: true,
        }
    }

    /// Replaces the tag list, dropping repeated tags but keeping first-seen order.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = dedup_tags(tags.into_iter().map(Into::into));
        self
    }
}

fn dedup_tags<I: IntoIterator<Item = String>>(tags: I) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: UserId,
    pub article_id: ArticleId,
    pub kind: ReactionKind,
}

impl Reaction {
    pub fn new(user_id: impl Into<UserId>, article_id: impl Into<ArticleId>, kind: ReactionKind) -> Self {
        Self {
            user_id: user_id.into(),
            article_id: article_id.into(),
            kind,
        }
    }
}

/// Article as it arrives from a store row or a request body, before any
/// field is known to be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub processed: Option<bool>,
}

impl TryFrom<ArticleRecord> for Article {
    type Error = Error;

    fn try_from(record: ArticleRecord) -> Result<Self> {
        let id = record
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::MalformedRecord("article is missing an id".to_string()))?;
        let raw_published = record.published_at.ok_or_else(|| {
            Error::MalformedRecord(format!("article {} is missing published_at", id))
        })?;
        let published_at = DateTime::parse_from_rfc3339(&raw_published)
            .map_err(|e| {
                Error::MalformedRecord(format!(
                    "article {} has invalid published_at {:?}: {}",
                    id, raw_published, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(Article {
            id: ArticleId(id),
            title: record.title.unwrap_or_default(),
            content: record.content.unwrap_or_default(),
            summary: record.summary,
            tags: dedup_tags(record.tags.unwrap_or_default()),
            published_at,
            processed: record.processed.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReactionRecord {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub article_id: Option<String>,
    #[serde(default, alias = "kind")]
    pub reaction_type: Option<String>,
}

impl ReactionRecord {
    /// Converts the record, filling in `user_id` when the record carries none.
    pub fn into_reaction(self, fallback_user: Option<&UserId>) -> Result<Reaction> {
        let article_id = self
            .article_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| Error::MalformedRecord("reaction is missing article_id".to_string()))?;
        let kind = self
            .reaction_type
            .ok_or_else(|| {
                Error::MalformedRecord(format!("reaction on {} is missing reaction_type", article_id))
            })?
            .parse::<ReactionKind>()
            .map_err(|e| Error::MalformedRecord(e.to_string()))?;
        let user_id = self
            .user_id
            .map(UserId)
            .or_else(|| fallback_user.cloned())
            .unwrap_or_else(|| UserId(String::new()));

        Ok(Reaction {
            user_id,
            article_id: ArticleId(article_id),
            kind,
        })
    }
}

impl TryFrom<ReactionRecord> for Reaction {
    type Error = Error;

    fn try_from(record: ReactionRecord) -> Result<Self> {
        record.into_reaction(None)
    }
}
