//! Substring search over the published collection.
//!
//! Matching is a plain `LIKE` over title, summary, and body with no ranking
//! beyond "stop at the limit". Each hit gets a navigable href rebuilt from
//! its parent chain; a broken chain degrades to the bare slug instead of
//! failing the whole search. SQLite's `LIKE` is ASCII-case-insensitive,
//! which covers the Latin half of the bilingual corpus; Thai script has no
//! letter case.

use anyhow::Result;

use crate::config::Config;
use crate::error::StoreResult;
use crate::models::{ContentNode, SearchHit};
use crate::store::NodeStore;

/// Hops allowed when walking a hit's parent chain; beyond this the chain is
/// treated as broken.
const MAX_WALK: usize = 64;

/// Runs a substring search and projects each match to a [`SearchHit`].
/// Blank queries return nothing.
pub async fn search_nodes(
    store: &NodeStore,
    query: &str,
    limit: i64,
) -> StoreResult<Vec<SearchHit>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(query));
    let rows = sqlx::query(
        r#"
        SELECT * FROM content_nodes
        WHERE published = 1
          AND (title LIKE ? ESCAPE '\'
           OR summary LIKE ? ESCAPE '\'
           OR body LIKE ? ESCAPE '\')
        LIMIT ?
        "#,
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(limit)
    .fetch_all(store.pool())
    .await?;

    let mut hits = Vec::with_capacity(rows.len());
    for row in &rows {
        let node = ContentNode::from_row(row)?;
        let path = node_href(store, &node).await;
        hits.push(SearchHit {
            id: node.id,
            title: node.title,
            node_type: node.node_type,
            path,
            slug: node.slug,
        });
    }

    Ok(hits)
}

/// CLI entry point — runs a search and prints the hits.
pub async fn run_search(config: &Config, query: &str, limit: Option<i64>) -> Result<()> {
    let store = NodeStore::connect(config).await?;

    let limit = limit.unwrap_or(config.search.result_limit);
    let hits = search_nodes(&store, query, limit).await?;

    if hits.is_empty() {
        println!("No results.");
        store.pool().close().await;
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, hit.node_type.as_str(), hit.title);
        println!("    path: {}", hit.path);
        println!("    id: {}", hit.id);
        println!();
    }

    store.pool().close().await;
    Ok(())
}

/// Rebuilds the full href for a node by walking its parent chain upward.
/// Best-effort: a missing ancestor or an over-long chain falls back to the
/// node's own slug.
async fn node_href(store: &NodeStore, node: &ContentNode) -> String {
    let fallback = format!("/c/{}", node.slug);

    let mut segments = vec![node.slug.clone()];
    let mut parent_id = node.parent_id.clone();
    let mut hops = 0usize;

    while let Some(pid) = parent_id {
        if hops >= MAX_WALK {
            return fallback;
        }
        match store.get(&pid).await {
            Ok(Some(parent)) => {
                segments.push(parent.slug.clone());
                parent_id = parent.parent_id;
            }
            _ => return fallback,
        }
        hops += 1;
    }

    segments.reverse();
    format!("/c/{}", segments.join("/"))
}

/// Escapes `LIKE` metacharacters so the query matches literally.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_passes_plain_text_through() {
        assert_eq!(escape_like("wudu basics"), "wudu basics");
        assert_eq!(escape_like("น้ำ"), "น้ำ");
    }

    #[test]
    fn escape_like_quotes_metacharacters() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
