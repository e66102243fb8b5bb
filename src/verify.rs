//! Tree integrity audit and repair.
//!
//! The stored `path` column is denormalized; this module re-derives every
//! node's path from the live parent chain and reports disagreements,
//! dangling parent references, and sibling slug collisions. With `--fix`,
//! stale paths are rewritten from the chain. Orphans and duplicates are
//! only reported — resolving them needs an editorial decision.

use std::collections::HashMap;

use anyhow::Result;

use crate::config::Config;
use crate::error::StoreResult;
use crate::models::ContentNode;
use crate::store::{path_json, NodeStore};

const MAX_DEPTH: usize = 64;

/// One node whose stored path disagrees with its parent chain.
#[derive(Debug, Clone)]
pub struct StalePath {
    pub id: String,
    pub slug: String,
    pub stored: Vec<String>,
    pub expected: Vec<String>,
}

/// One node whose parent id points at nothing (or into a parent loop).
#[derive(Debug, Clone)]
pub struct Orphan {
    pub id: String,
    pub slug: String,
    pub parent_id: String,
}

/// Nodes sharing a slug under the same parent.
#[derive(Debug, Clone)]
pub struct DuplicateSlug {
    pub parent_id: Option<String>,
    pub slug: String,
    pub count: usize,
}

#[derive(Debug, Default)]
pub struct VerifyReport {
    pub scanned: usize,
    pub stale_paths: Vec<StalePath>,
    pub orphans: Vec<Orphan>,
    pub duplicate_slugs: Vec<DuplicateSlug>,
    pub repaired: usize,
}

impl VerifyReport {
    /// Problems still present after any repair pass.
    pub fn unresolved(&self) -> usize {
        self.orphans.len() + self.duplicate_slugs.len() + self.stale_paths.len() - self.repaired
    }
}

/// Audits the whole collection in memory (published and unpublished alike).
pub async fn audit(store: &NodeStore) -> StoreResult<VerifyReport> {
    let nodes = store.all_nodes().await?;
    let by_id: HashMap<&str, &ContentNode> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut report = VerifyReport {
        scanned: nodes.len(),
        ..VerifyReport::default()
    };

    for node in &nodes {
        match expected_path(node, &by_id) {
            Some(expected) => {
                if expected != node.path {
                    report.stale_paths.push(StalePath {
                        id: node.id.clone(),
                        slug: node.slug.clone(),
                        stored: node.path.clone(),
                        expected,
                    });
                }
            }
            None => report.orphans.push(Orphan {
                id: node.id.clone(),
                slug: node.slug.clone(),
                parent_id: node.parent_id.clone().unwrap_or_default(),
            }),
        }
    }

    let mut sibling_counts: HashMap<(Option<&str>, &str), usize> = HashMap::new();
    for node in &nodes {
        *sibling_counts
            .entry((node.parent_id.as_deref(), node.slug.as_str()))
            .or_insert(0) += 1;
    }
    for ((parent_id, slug), count) in sibling_counts {
        if count > 1 {
            report.duplicate_slugs.push(DuplicateSlug {
                parent_id: parent_id.map(str::to_string),
                slug: slug.to_string(),
                count,
            });
        }
    }

    Ok(report)
}

/// Rewrites the stored path of every stale node from its live chain.
pub async fn repair(store: &NodeStore, report: &mut VerifyReport) -> StoreResult<()> {
    for issue in &report.stale_paths {
        sqlx::query("UPDATE content_nodes SET path = ? WHERE id = ?")
            .bind(path_json(&issue.expected))
            .bind(&issue.id)
            .execute(store.pool())
            .await?;
        report.repaired += 1;
    }
    Ok(())
}

/// CLI entry point. Prints the report and returns whether the tree is
/// clean (after repair, when requested).
pub async fn run_verify(config: &Config, fix: bool) -> Result<bool> {
    let store = NodeStore::connect(config).await?;

    let mut report = audit(&store).await?;
    if fix {
        repair(&store, &mut report).await?;
    }

    println!("verify content_nodes");
    println!("  scanned: {}", report.scanned);

    println!("  stale paths: {}", report.stale_paths.len());
    for issue in &report.stale_paths {
        println!(
            "    {} ({}): stored [{}], expected [{}]",
            issue.id,
            issue.slug,
            issue.stored.join("/"),
            issue.expected.join("/")
        );
    }

    println!("  orphans: {}", report.orphans.len());
    for orphan in &report.orphans {
        println!(
            "    {} ({}): parent {} does not exist",
            orphan.id, orphan.slug, orphan.parent_id
        );
    }

    println!("  duplicate sibling slugs: {}", report.duplicate_slugs.len());
    for dup in &report.duplicate_slugs {
        println!(
            "    '{}' under {}: {} nodes",
            dup.slug,
            dup.parent_id.as_deref().unwrap_or("(root)"),
            dup.count
        );
    }

    if fix {
        println!("  repaired: {}", report.repaired);
    }

    let clean = report.unresolved() == 0;
    println!("{}", if clean { "ok" } else { "problems found" });

    store.pool().close().await;
    Ok(clean)
}

/// Re-derives a node's path by walking the parent chain through the
/// in-memory map. `None` means the chain is broken (missing parent or a
/// loop).
fn expected_path(node: &ContentNode, by_id: &HashMap<&str, &ContentNode>) -> Option<Vec<String>> {
    let mut slugs: Vec<String> = Vec::new();
    let mut cursor = node.parent_id.as_deref();
    let mut hops = 0usize;

    while let Some(pid) = cursor {
        let parent = by_id.get(pid)?;
        slugs.push(parent.slug.clone());
        cursor = parent.parent_id.as_deref();
        hops += 1;
        if hops > MAX_DEPTH {
            return None;
        }
    }

    slugs.reverse();
    Some(slugs)
}
