//! Database module
//!
//! Connectivity, schema checks and schema installation.

use sqlx::{Executor, PgPool};

/// Schema installed by `migrations/0001_documents.sql`
const SCHEMA_SQL: &str = include_str!("../migrations/0001_documents.sql");

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Apply the document schema. Every statement is idempotent.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(SCHEMA_SQL).await?;
    tracing::info!("Document schema applied");
    Ok(())
}

/// List required schema objects that do not exist
pub async fn missing_schema_objects(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let mut missing = Vec::new();

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = 'documents'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        tracing::error!("Required table 'documents' does not exist");
        missing.push("table documents".to_string());
    }

    let sequence_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.sequences
            WHERE sequence_schema = 'public' AND sequence_name = 'document_change_seq'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !sequence_exists {
        tracing::error!("Required sequence 'document_change_seq' does not exist");
        missing.push("sequence document_change_seq".to_string());
    }

    let trigger_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM pg_trigger WHERE tgname = 'documents_change_notify')",
    )
    .fetch_one(pool)
    .await?;

    if !trigger_exists {
        tracing::error!("Required trigger 'documents_change_notify' does not exist");
        missing.push("trigger documents_change_notify".to_string());
    }

    Ok(missing)
}
