//! Repository implementations for database operations.

mod article_repo;

pub use article_repo::{ArticleFilter, ArticleRepository};
