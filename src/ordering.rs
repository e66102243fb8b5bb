//! Sibling ordering and reader navigation.
//!
//! Articles inside a chapter are numbered by their badge; reading order is
//! badge ascending with unnumbered material at the end. Nested sub-chapters
//! contribute their articles too, so the collection walks the whole subtree.

use crate::error::StoreResult;
use crate::models::{ContentNode, NodeType};
use crate::store::NodeStore;

/// Previous/next reading neighbors of an article within its chapter.
#[derive(Debug, Clone, Default)]
pub struct NextPrev {
    pub prev: Option<ContentNode>,
    pub next: Option<ContentNode>,
}

/// Collects every published article in the subtree rooted at `chapter_id`
/// (nested sub-chapters included), sorted by numeric badge ascending.
/// Missing or `coming-soon` badges sort last; the stable sort keeps
/// depth-first sibling order among ties.
pub async fn articles_under(store: &NodeStore, chapter_id: &str) -> StoreResult<Vec<ContentNode>> {
    let mut articles: Vec<ContentNode> = Vec::new();

    // Depth-first preorder via an explicit stack; children are pushed in
    // reverse so siblings pop in their stored order.
    let mut stack: Vec<ContentNode> = Vec::new();
    let mut roots = store.children_of(chapter_id).await?;
    roots.reverse();
    stack.extend(roots);

    while let Some(node) = stack.pop() {
        let mut children = store.children_of(&node.id).await?;
        children.reverse();
        if node.node_type == NodeType::Article {
            articles.push(node);
        }
        stack.extend(children);
    }

    articles.sort_by_key(|article| article.badge.sort_key());
    Ok(articles)
}

/// Finds the reading neighbors of `article_id` among the chapter's ordered
/// articles. Both sides are `None` when the article is not in the subtree.
pub async fn next_prev(
    store: &NodeStore,
    article_id: &str,
    chapter_id: &str,
) -> StoreResult<NextPrev> {
    let articles = articles_under(store, chapter_id).await?;
    let position = articles.iter().position(|article| article.id == article_id);

    Ok(match position {
        None => NextPrev::default(),
        Some(i) => NextPrev {
            prev: (i > 0).then(|| articles[i - 1].clone()),
            next: articles.get(i + 1).cloned(),
        },
    })
}
