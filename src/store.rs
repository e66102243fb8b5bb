//! Node repository: CRUD over the flat `content_nodes` collection plus the
//! consistency rules that keep the tree navigable.
//!
//! Invariants maintained here:
//!
//! - `slug` is unique among siblings (same `parent_id`), checked on create
//!   and on any update that changes slug or parent;
//! - `path` always equals the parent's `path + [parent.slug]`; moves and
//!   renames rewrite every descendant's `path` in the same transaction;
//! - a node cannot be moved underneath its own subtree;
//! - a node with children (published or not) is only deleted via cascade,
//!   which removes the subtree depth-first inside one transaction.

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::models::{ContentNode, NewNode, NodePatch, NodeType};

/// Upper bound on parent-chain walks. Real trees are admin-entered and
/// shallow; hitting this means a corrupt parent loop.
const MAX_DEPTH: usize = 64;

#[derive(Clone)]
pub struct NodeStore {
    pool: SqlitePool,
}

impl NodeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the content database and wraps it in a store, creating the
    /// file and its parent directory on first use.
    ///
    /// WAL journal with a small pool and a busy timeout: subtree path
    /// rewrites and cascade deletes hold multi-statement transactions, and
    /// SQLite serializes writers, so a handful of connections covers the
    /// read side while waiting writers ride out write bursts instead of
    /// surfacing SQLITE_BUSY.
    pub async fn connect(config: &Config) -> anyhow::Result<NodeStore> {
        let db_path = &config.db.path;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(NodeStore::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Point lookup by id, published or not.
    pub async fn get(&self, id: &str) -> StoreResult<Option<ContentNode>> {
        let row = sqlx::query("SELECT * FROM content_nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(ContentNode::from_row).transpose()?)
    }

    /// Published point lookup by `(parent, slug)` — one step of a path walk.
    /// `parent_id IS ?` matches root nodes when `None` is bound.
    pub async fn resolve_step(
        &self,
        parent_id: Option<&str>,
        slug: &str,
    ) -> StoreResult<Option<ContentNode>> {
        let row = sqlx::query(
            "SELECT * FROM content_nodes WHERE slug = ? AND parent_id IS ? AND published = 1",
        )
        .bind(slug)
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(ContentNode::from_row).transpose()?)
    }

    /// Sibling lookup regardless of published state; drives the
    /// duplicate-slug guard.
    async fn sibling_by_slug(
        &self,
        parent_id: Option<&str>,
        slug: &str,
    ) -> StoreResult<Option<ContentNode>> {
        let row = sqlx::query("SELECT * FROM content_nodes WHERE slug = ? AND parent_id IS ?")
            .bind(slug)
            .bind(parent_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(ContentNode::from_row).transpose()?)
    }

    /// Published children of a node, `order` ascending with title tiebreak.
    pub async fn children_of(&self, parent_id: &str) -> StoreResult<Vec<ContentNode>> {
        let rows = sqlx::query(
            "SELECT * FROM content_nodes WHERE parent_id = ? AND published = 1 \
             ORDER BY ord ASC, title ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        collect_nodes(rows)
    }

    /// All published nodes of one type, `order` ascending.
    pub async fn by_type(&self, node_type: NodeType) -> StoreResult<Vec<ContentNode>> {
        let rows = sqlx::query(
            "SELECT * FROM content_nodes WHERE node_type = ? AND published = 1 \
             ORDER BY ord ASC, title ASC",
        )
        .bind(node_type.as_str())
        .fetch_all(&self.pool)
        .await?;
        collect_nodes(rows)
    }

    /// Every published node, `order` ascending.
    pub async fn all_published(&self) -> StoreResult<Vec<ContentNode>> {
        let rows =
            sqlx::query("SELECT * FROM content_nodes WHERE published = 1 ORDER BY ord ASC, title ASC")
                .fetch_all(&self.pool)
                .await?;
        collect_nodes(rows)
    }

    /// Every node, published or not. Integrity tooling reads the whole
    /// collection through this.
    pub async fn all_nodes(&self) -> StoreResult<Vec<ContentNode>> {
        let rows = sqlx::query("SELECT * FROM content_nodes ORDER BY ord ASC, title ASC")
            .fetch_all(&self.pool)
            .await?;
        collect_nodes(rows)
    }

    /// True when any node, published or not, references `id` as its parent.
    pub async fn has_children(&self, id: &str) -> StoreResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM content_nodes WHERE parent_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Creates a node. Validates required fields, enforces sibling slug
    /// uniqueness, and derives `path` from the parent chain.
    pub async fn create(&self, input: NewNode) -> StoreResult<ContentNode> {
        let slug = input.slug.trim().to_string();
        let title = input.title.trim().to_string();
        let node_type = match input.node_type {
            Some(t) if !slug.is_empty() && !title.is_empty() => t,
            _ => {
                return Err(StoreError::Validation(
                    "missing required fields: slug, title, type".to_string(),
                ))
            }
        };
        validate_slug(&slug)?;

        let parent = match input.parent_id.as_deref() {
            Some(pid) => Some(
                self.get(pid)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(format!("parent {pid}")))?,
            ),
            None => None,
        };

        if self
            .sibling_by_slug(input.parent_id.as_deref(), &slug)
            .await?
            .is_some()
        {
            return Err(StoreError::DuplicateSlug { slug });
        }

        let path = parent.as_ref().map(child_path).unwrap_or_default();
        let now = Utc::now().timestamp();
        let node = ContentNode {
            id: Uuid::new_v4().to_string(),
            slug,
            title,
            summary: input.summary,
            node_type,
            author: input.author,
            badge: input.badge,
            body: input.body,
            parent_id: input.parent_id,
            path,
            order: input.order,
            published: input.published,
            icon: input.icon,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO content_nodes \
             (id, slug, title, summary, node_type, author, badge, body, parent_id, path, ord, published, icon, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&node.id)
        .bind(&node.slug)
        .bind(&node.title)
        .bind(&node.summary)
        .bind(node.node_type.as_str())
        .bind(&node.author)
        .bind(node.badge.to_column())
        .bind(&node.body)
        .bind(&node.parent_id)
        .bind(path_json(&node.path))
        .bind(node.order)
        .bind(node.published as i64)
        .bind(&node.icon)
        .bind(node.created_at)
        .bind(node.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(node)
    }

    /// Applies a field patch. `type` is immutable; absent patch fields stay
    /// untouched. A change of `parentId` or `slug` recomputes this node's
    /// `path` and rewrites every descendant's `path` in one transaction.
    pub async fn update(&self, id: &str, patch: NodePatch) -> StoreResult<ContentNode> {
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("content {id}")))?;

        let mut next = current.clone();
        if let Some(slug) = patch.slug {
            let slug = slug.trim().to_string();
            validate_slug(&slug)?;
            next.slug = slug;
        }
        if let Some(title) = patch.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(StoreError::Validation("title must not be empty".to_string()));
            }
            next.title = title;
        }
        if let Some(summary) = patch.summary {
            next.summary = summary;
        }
        if let Some(author) = patch.author {
            next.author = author;
        }
        if let Some(badge) = patch.badge {
            next.badge = badge;
        }
        if let Some(body) = patch.body {
            next.body = body;
        }
        if let Some(order) = patch.order {
            next.order = order;
        }
        if let Some(published) = patch.published {
            next.published = published;
        }
        if let Some(icon) = patch.icon {
            next.icon = icon;
        }
        if let Some(parent_id) = patch.parent_id {
            next.parent_id = parent_id;
        }

        let reparented = next.parent_id != current.parent_id;
        let renamed = next.slug != current.slug;

        if reparented {
            match next.parent_id.as_deref() {
                Some(pid) => {
                    if pid == id {
                        return Err(StoreError::Validation(
                            "cannot move content under itself".to_string(),
                        ));
                    }
                    let parent = self
                        .get(pid)
                        .await?
                        .ok_or_else(|| StoreError::NotFound(format!("parent {pid}")))?;
                    self.ensure_outside_subtree(id, &parent).await?;
                    next.path = child_path(&parent);
                }
                None => next.path = Vec::new(),
            }
        }

        if reparented || renamed {
            if let Some(existing) = self
                .sibling_by_slug(next.parent_id.as_deref(), &next.slug)
                .await?
            {
                if existing.id != id {
                    return Err(StoreError::DuplicateSlug { slug: next.slug });
                }
            }
        }

        next.updated_at = Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE content_nodes SET slug = ?, title = ?, summary = ?, author = ?, badge = ?, \
             body = ?, parent_id = ?, path = ?, ord = ?, published = ?, icon = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&next.slug)
        .bind(&next.title)
        .bind(&next.summary)
        .bind(&next.author)
        .bind(next.badge.to_column())
        .bind(&next.body)
        .bind(&next.parent_id)
        .bind(path_json(&next.path))
        .bind(next.order)
        .bind(next.published as i64)
        .bind(&next.icon)
        .bind(next.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if reparented || renamed {
            rewrite_descendant_paths(&mut tx, &next).await?;
        }

        tx.commit().await?;
        Ok(next)
    }

    /// Deletes a node. Without `cascade`, refuses when anything still
    /// references it as parent. With `cascade`, removes the whole subtree
    /// depth-first atomically. Returns the number of nodes removed.
    pub async fn delete(&self, id: &str, cascade: bool) -> StoreResult<u64> {
        if self.get(id).await?.is_none() {
            return Err(StoreError::NotFound(format!("content {id}")));
        }
        if !cascade && self.has_children(id).await? {
            return Err(StoreError::HasChildren { id: id.to_string() });
        }

        let mut tx = self.pool.begin().await?;
        let mut removed = 0u64;

        if cascade {
            // Collect descendants level by level, then delete in reverse so
            // children always go before their parents.
            let mut subtree: Vec<String> = Vec::new();
            let mut frontier = vec![id.to_string()];
            while let Some(pid) = frontier.pop() {
                let rows = sqlx::query("SELECT id FROM content_nodes WHERE parent_id = ?")
                    .bind(&pid)
                    .fetch_all(&mut *tx)
                    .await?;
                for row in rows {
                    let child_id: String = row.get("id");
                    subtree.push(child_id.clone());
                    frontier.push(child_id);
                }
            }
            for child_id in subtree.iter().rev() {
                removed += sqlx::query("DELETE FROM content_nodes WHERE id = ?")
                    .bind(child_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
            }
        }

        removed += sqlx::query("DELETE FROM content_nodes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed)
    }

    /// Rejects a new parent that sits inside `node_id`'s own subtree by
    /// walking the candidate's ancestor chain.
    async fn ensure_outside_subtree(
        &self,
        node_id: &str,
        new_parent: &ContentNode,
    ) -> StoreResult<()> {
        let mut cursor = Some(new_parent.clone());
        let mut hops = 0usize;
        while let Some(ancestor) = cursor {
            if ancestor.id == node_id {
                return Err(StoreError::Validation(
                    "cannot move content under its own subtree".to_string(),
                ));
            }
            cursor = match ancestor.parent_id.as_deref() {
                Some(pid) => self.get(pid).await?,
                None => None,
            };
            hops += 1;
            if hops > MAX_DEPTH {
                return Err(StoreError::Validation(
                    "parent chain exceeds maximum depth".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// The path a child of `parent` must carry.
pub fn child_path(parent: &ContentNode) -> Vec<String> {
    let mut path = parent.path.clone();
    path.push(parent.slug.clone());
    path
}

pub(crate) fn path_json(path: &[String]) -> String {
    serde_json::to_string(path).unwrap_or_else(|_| "[]".to_string())
}

fn validate_slug(slug: &str) -> StoreResult<()> {
    if slug.is_empty() {
        return Err(StoreError::Validation("slug must not be empty".to_string()));
    }
    if slug.contains('/') || slug.chars().any(char::is_whitespace) {
        return Err(StoreError::Validation(
            "slug must not contain '/' or whitespace".to_string(),
        ));
    }
    Ok(())
}

fn collect_nodes(rows: Vec<sqlx::sqlite::SqliteRow>) -> StoreResult<Vec<ContentNode>> {
    let mut nodes = Vec::with_capacity(rows.len());
    for row in &rows {
        nodes.push(ContentNode::from_row(row)?);
    }
    Ok(nodes)
}

/// Rewrites `path` for every descendant of `root` after a move or rename.
/// Runs inside the caller's transaction so a crash never leaves the subtree
/// half-updated.
async fn rewrite_descendant_paths(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    root: &ContentNode,
) -> Result<(), sqlx::Error> {
    let mut frontier: Vec<(String, Vec<String>)> = vec![(root.id.clone(), child_path(root))];
    while let Some((parent_id, path)) = frontier.pop() {
        let rows = sqlx::query("SELECT id, slug FROM content_nodes WHERE parent_id = ?")
            .bind(&parent_id)
            .fetch_all(&mut **tx)
            .await?;
        let encoded = path_json(&path);
        for row in rows {
            let child_id: String = row.get("id");
            let child_slug: String = row.get("slug");
            sqlx::query("UPDATE content_nodes SET path = ? WHERE id = ?")
                .bind(&encoded)
                .bind(&child_id)
                .execute(&mut **tx)
                .await?;
            let mut grandchild_path = path.clone();
            grandchild_path.push(child_slug);
            frontier.push((child_id, grandchild_path));
        }
    }
    Ok(())
}
