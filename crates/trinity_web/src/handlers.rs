use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use trinity_core::{
    Article, ArticleFilter, ArticleId, ArticleRecord, Error, Reaction, ReactionRecord, UserId,
};
use crate::error::ApiResult;
use crate::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

fn parse_limit(limit: Option<i64>) -> trinity_core::Result<Option<usize>> {
    match limit {
        Some(n) if n < 0 => Err(Error::InvalidInput(format!("limit must not be negative, got {}", n))),
        Some(n) => Ok(Some(n as usize)),
        None => Ok(None),
    }
}

/// Keeps the records that convert cleanly and logs the rest.
fn accept_records<R, T>(records: Vec<R>, what: &str, convert: impl Fn(R) -> trinity_core::Result<T>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match convert(record) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("⚠️ Skipping {}: {}", what, e);
                None
            }
        })
        .collect()
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Json<Vec<Article>>> {
    let limit = parse_limit(params.limit)?.unwrap_or(DEFAULT_PAGE_SIZE);
    let articles = state
        .store
        .list_articles(&ArticleFilter::processed().with_limit(limit))
        .await?;
    Ok(Json(articles))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Article>> {
    let id = ArticleId(id);
    let article = state
        .store
        .get_article(&id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
    Ok(Json(article))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(mut record): Json<ArticleRecord>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    if record.id.is_none() {
        record.id = Some(uuid::Uuid::new_v4().to_string());
    }
    if record.published_at.is_none() {
        record.published_at = Some(Utc::now().to_rfc3339());
    }
    let article = Article::try_from(record)?;
    state.store.store_article(&article).await?;
    info!("📰 Stored article {}: {}", article.id, article.title);
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn create_reaction(
    State(state): State<Arc<AppState>>,
    Json(record): Json<ReactionRecord>,
) -> ApiResult<(StatusCode, Json<Reaction>)> {
    let reaction = record.into_reaction(None)?;
    if reaction.user_id.as_str().is_empty() {
        return Err(Error::InvalidInput("reaction is missing user_id".to_string()).into());
    }
    state.store.store_reaction(&reaction).await?;
    Ok((StatusCode::CREATED, Json(reaction)))
}

pub async fn user_recommendations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Json<Value>> {
    let limit = parse_limit(params.limit)?;
    let recommendations = state
        .recommender
        .recommend_for_user(&UserId(user_id), limit)
        .await?;
    Ok(Json(json!({ "recommendations": recommendations })))
}

pub async fn user_interests(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Json<Value>> {
    let limit = parse_limit(params.limit)?;
    let tags = state
        .recommender
        .interests_for_user(&UserId(user_id), limit)
        .await?;
    Ok(Json(json!({ "tags": tags })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub user_id: Option<String>,
    pub articles: Option<Vec<ArticleRecord>>,
    pub user_reactions: Option<Vec<ReactionRecord>>,
    pub exclude_ids: Option<Vec<String>>,
    pub limit: Option<i64>,
}

/// Ranks either the posted candidate articles or, when none are posted, the
/// newest processed articles from the store.
pub async fn generate_recommendations(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendationRequest>,
) -> ApiResult<Json<Value>> {
    let recommender = &state.recommender;
    let limit = parse_limit(request.limit)?.unwrap_or(recommender.config().default_limit);
    let user_id = request.user_id.map(UserId);

    let reactions: Vec<Reaction> = match request.user_reactions {
        Some(records) => accept_records(records, "reaction", |r: ReactionRecord| r.into_reaction(user_id.as_ref()))
            .into_iter()
            .filter(|r| r.kind.is_positive())
            .collect(),
        None => match &user_id {
            Some(user_id) => recommender.positive_reactions(user_id).await?,
            None => Vec::new(),
        },
    };

    let mut exclude: HashSet<ArticleId> = reactions.iter().map(|r| r.article_id.clone()).collect();
    exclude.extend(request.exclude_ids.unwrap_or_default().into_iter().map(ArticleId));

    let candidates = match request.articles {
        Some(records) => accept_records(records, "candidate article", Article::try_from),
        None => recommender.candidate_pool(&exclude).await?,
    };

    let recommendations = recommender
        .recommend(&candidates, &reactions, &exclude, limit)
        .await?;
    Ok(Json(json!({ "recommendations": recommendations })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None).unwrap(), None);
        assert_eq!(parse_limit(Some(0)).unwrap(), Some(0));
        assert_eq!(parse_limit(Some(7)).unwrap(), Some(7));
        assert!(matches!(parse_limit(Some(-1)), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let body = r#"{
            "userId": "u1",
            "userReactions": [{"article_id": "a", "reaction_type": "smart"}],
            "excludeIds": ["b"]
        }"#;
        let request: RecommendationRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.user_id.as_deref(), Some("u1"));
        assert!(request.articles.is_none());
        assert_eq!(request.user_reactions.map(|r| r.len()), Some(1));
        assert_eq!(request.exclude_ids, Some(vec!["b".to_string()]));
    }
}
