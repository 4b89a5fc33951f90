//! Database schema definitions using SurrealQL.

use crate::{DbError, get_db};

/// Initialize the database schema.
///
/// This creates all necessary tables, fields, and indexes.
pub async fn init_schema() -> Result<(), DbError> {
    let db = get_db()?;

    tracing::info!("Initializing database schema...");

    db.query(ARTICLE_SCHEMA).await?.check()?;

    tracing::info!("Database schema initialized");

    Ok(())
}

/// Article table schema.
const ARTICLE_SCHEMA: &str = r#"
-- Article table: one row per submitted article and its derived artifacts
DEFINE TABLE IF NOT EXISTS article SCHEMAFULL;

DEFINE FIELD IF NOT EXISTS owner_id ON article TYPE string;
DEFINE FIELD IF NOT EXISTS url ON article TYPE string;
DEFINE FIELD IF NOT EXISTS format ON article TYPE string ASSERT $value IN ["text", "audio", "video"];
DEFINE FIELD IF NOT EXISTS length ON article TYPE string ASSERT $value IN ["s", "m", "l"];
DEFINE FIELD IF NOT EXISTS language ON article TYPE option<string>;
DEFINE FIELD IF NOT EXISTS style ON article TYPE option<string>;
DEFINE FIELD IF NOT EXISTS status ON article TYPE string DEFAULT "queued"
    ASSERT $value IN ["queued", "processing", "ready", "failed"];
DEFINE FIELD IF NOT EXISTS title ON article TYPE option<string>;
DEFINE FIELD IF NOT EXISTS original_content ON article TYPE option<string>;
DEFINE FIELD IF NOT EXISTS summary ON article TYPE option<string>;
DEFINE FIELD IF NOT EXISTS thumbnail_path ON article TYPE option<string>;
DEFINE FIELD IF NOT EXISTS audio_file_path ON article TYPE option<string>;
DEFINE FIELD IF NOT EXISTS video_file_path ON article TYPE option<string>;
DEFINE FIELD IF NOT EXISTS duration_seconds ON article TYPE option<int>;
DEFINE FIELD IF NOT EXISTS error_message ON article TYPE option<string>;
DEFINE FIELD IF NOT EXISTS created_at ON article TYPE datetime DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON article TYPE datetime DEFAULT time::now();

-- Indexes for polling and listing
DEFINE INDEX IF NOT EXISTS article_status ON article FIELDS status;
DEFINE INDEX IF NOT EXISTS article_owner ON article FIELDS owner_id;
DEFINE INDEX IF NOT EXISTS article_created ON article FIELDS created_at;
"#;
