pub mod error;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use storage::{ArticleFilter, ArticleStore};
pub use types::{
    Article, ArticleId, ArticleRecord, Reaction, ReactionKind, ReactionRecord, UserId,
};

pub mod prelude {
    pub use super::storage::{ArticleFilter, ArticleStore};
    pub use super::types::*;
    pub use super::{Error, Result};
}
