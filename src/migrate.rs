use anyhow::Result;

use crate::config::Config;
use crate::store::NodeStore;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let store = NodeStore::connect(config).await?;
    let pool = store.pool();

    // One flat collection of typed nodes; the tree lives in parent_id and
    // the denormalized path column (JSON array of ancestor slugs).
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content_nodes (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL,
            title TEXT NOT NULL,
            summary TEXT NOT NULL DEFAULT '',
            node_type TEXT NOT NULL,
            author TEXT NOT NULL DEFAULT '',
            badge TEXT,
            body TEXT NOT NULL DEFAULT '',
            parent_id TEXT,
            path TEXT NOT NULL DEFAULT '[]',
            ord INTEGER NOT NULL DEFAULT 0,
            published INTEGER NOT NULL DEFAULT 1,
            icon TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_content_nodes_parent_ord ON content_nodes(parent_id, ord)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_content_nodes_type_published ON content_nodes(node_type, published)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_content_nodes_path_slug ON content_nodes(path, slug)",
    )
    .execute(pool)
    .await?;

    pool.close().await;
    Ok(())
}
