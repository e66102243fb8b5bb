//! Path resolution and breadcrumb construction.
//!
//! A path like `tafseer/foundation/intro` is resolved level by level: the
//! first segment must be a root node, each later segment a child of the one
//! before it. Depth is admin-entered and small, so a short chain of point
//! lookups is the whole algorithm.

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::models::{Badge, Breadcrumb, ContentNode, NodeType};
use crate::ordering;
use crate::store::NodeStore;

/// A resolved node together with its ordered, published children.
#[derive(Debug, Clone, Serialize)]
pub struct ContentWithChildren {
    pub content: ContentNode,
    pub children: Vec<ContentNode>,
}

/// Resolves a slug path to its published node. Fails with the longest
/// prefix that could not be matched.
pub async fn resolve_path(store: &NodeStore, slugs: &[String]) -> StoreResult<ContentNode> {
    if slugs.is_empty() {
        return Err(StoreError::Validation("path must not be empty".to_string()));
    }

    let mut current: Option<ContentNode> = None;
    for (i, slug) in slugs.iter().enumerate() {
        let parent_id = current.as_ref().map(|node| node.id.clone());
        match store.resolve_step(parent_id.as_deref(), slug).await? {
            Some(node) => current = Some(node),
            None => {
                return Err(StoreError::NotFound(format!(
                    "content at path '{}'",
                    slugs[..=i].join("/")
                )))
            }
        }
    }

    // The loop ran at least once, so current is always set here.
    current.ok_or_else(|| StoreError::NotFound("content".to_string()))
}

/// Resolves a path and attaches ordered children. Articles are leaves on
/// the reader side, so they get an empty child list without a query.
pub async fn content_with_children(
    store: &NodeStore,
    slugs: &[String],
) -> StoreResult<ContentWithChildren> {
    let content = resolve_path(store, slugs).await?;
    let children = if content.node_type == NodeType::Article {
        Vec::new()
    } else {
        store.children_of(&content.id).await?
    };
    Ok(ContentWithChildren { content, children })
}

/// Builds the breadcrumb trail for a path: one `{title, href}` entry per
/// resolvable level, stopping at the first level that fails. Hrefs
/// accumulate the slug prefix under `/c/`.
pub async fn breadcrumbs(store: &NodeStore, slugs: &[String]) -> StoreResult<Vec<Breadcrumb>> {
    let mut trail = Vec::with_capacity(slugs.len());
    let mut current: Option<ContentNode> = None;

    for (i, slug) in slugs.iter().enumerate() {
        let parent_id = current.as_ref().map(|node| node.id.clone());
        match store.resolve_step(parent_id.as_deref(), slug).await? {
            Some(node) => {
                trail.push(Breadcrumb {
                    title: node.title.clone(),
                    href: format!("/c/{}", slugs[..=i].join("/")),
                });
                current = Some(node);
            }
            None => break,
        }
    }

    Ok(trail)
}

/// CLI entry point — resolves a path and prints the node, its children,
/// and the breadcrumb trail.
pub async fn run_resolve(config: &Config, raw_path: &str) -> Result<()> {
    let store = NodeStore::connect(config).await?;

    let slugs = split_path(raw_path);
    let page = match content_with_children(&store, &slugs).await {
        Ok(page) => page,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let trail = breadcrumbs(&store, &slugs).await?;

    println!("--- Content ---");
    println!("id:        {}", page.content.id);
    println!("title:     {}", page.content.title);
    println!("type:      {}", page.content.node_type.as_str());
    println!("slug:      {}", page.content.slug);
    if !page.content.path.is_empty() {
        println!("path:      {}", page.content.path.join("/"));
    }
    println!("badge:     {}", badge_display(page.content.badge));
    println!("published: {}", page.content.published);
    if !page.content.author.is_empty() {
        println!("author:    {}", page.content.author);
    }
    if !page.content.summary.is_empty() {
        println!("summary:   {}", page.content.summary);
    }
    println!();

    println!("--- Children ({}) ---", page.children.len());
    for child in &page.children {
        println!(
            "  [{}] {} (slug: {}, badge: {})",
            child.node_type.as_str(),
            child.title,
            child.slug,
            badge_display(child.badge)
        );
    }
    println!();

    println!("--- Breadcrumbs ---");
    for crumb in &trail {
        println!("  {} -> {}", crumb.title, crumb.href);
    }

    // Articles get reading-order navigation within their chapter.
    if page.content.node_type == NodeType::Article {
        if let Some(parent_id) = page.content.parent_id.as_deref() {
            let nav = ordering::next_prev(&store, &page.content.id, parent_id).await?;
            println!();
            println!("--- Navigation ---");
            println!("  prev: {}", nav_display(nav.prev.as_ref()));
            println!("  next: {}", nav_display(nav.next.as_ref()));
        }
    }

    store.pool().close().await;
    Ok(())
}

fn nav_display(node: Option<&ContentNode>) -> String {
    match node {
        Some(n) if n.path.is_empty() => format!("{} (/c/{})", n.title, n.slug),
        Some(n) => format!("{} (/c/{}/{})", n.title, n.path.join("/"), n.slug),
        None => "-".to_string(),
    }
}

fn badge_display(badge: Badge) -> String {
    badge.to_column().unwrap_or_else(|| "-".to_string())
}

/// Splits a raw `?path=` query value into slug segments, dropping empty
/// pieces from doubled or trailing slashes.
pub fn split_path(raw: &str) -> Vec<String> {
    raw.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
