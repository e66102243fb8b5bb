//! Icon identifier resolution.
//!
//! Nodes rarely carry an explicit icon, so listings derive one: explicit
//! field, then the nearest ancestor's explicit icon (found by walking the
//! parent chain upward), then a curated slug/keyword table (Thai keywords
//! included), then a per-type default. The identifiers are
//! presentation-neutral names the UI maps to glyphs.

use crate::models::{ContentNode, NodeType};
use crate::store::NodeStore;

/// Hops allowed on the ancestor walk; beyond this the chain is treated as
/// broken.
const MAX_WALK: usize = 64;

/// Exact slug matches for well-known subject areas.
const SLUG_ICONS: &[(&str, &str)] = &[
    ("fiqh", "balance"),
    ("aqidah", "star"),
    ("seerah", "history-edu"),
    ("history", "timer"),
    ("hadith", "auto-stories"),
    ("quran", "menu-book"),
    ("tafsir", "lightbulb"),
    ("ibadah", "mosque"),
    ("muamalat", "gavel"),
    ("general", "public"),
    ("basics", "school"),
    ("principles", "emoji-objects"),
];

/// Keyword fragments matched against slug or title, in both languages.
const KEYWORD_ICONS: &[(&str, &str)] = &[
    ("water", "water-drop"),
    ("น้ำ", "water-drop"),
    ("cleanliness", "clean-hands"),
    ("ความสะอาด", "clean-hands"),
    ("prayer", "mosque"),
    ("ละหมาด", "mosque"),
    ("salah", "mosque"),
    ("zakat", "monetization"),
    ("fasting", "access-time"),
    ("sawm", "access-time"),
    ("hajj", "flight"),
    ("umrah", "flight"),
    ("marriage", "favorite"),
    ("nikah", "favorite"),
    ("trade", "gavel"),
    ("inheritance", "balance"),
    ("doubt", "help"),
    ("suspicion", "help"),
    ("confusion", "help"),
    ("สงสัย", "help"),
    ("สับสน", "help"),
];

/// Heuristic lookup from slug/title keywords. Returns `None` when nothing
/// matches so callers can fall through to inherited or type defaults.
pub fn specific_icon(slug: &str, title: &str) -> Option<&'static str> {
    let slug = slug.to_lowercase();
    let title = title.to_lowercase();

    if let Some((_, icon)) = SLUG_ICONS.iter().find(|(key, _)| *key == slug) {
        return Some(icon);
    }
    if let Some((_, icon)) = SLUG_ICONS.iter().find(|(key, _)| slug.contains(key)) {
        return Some(icon);
    }
    KEYWORD_ICONS
        .iter()
        .find(|(key, _)| slug.contains(key) || title.contains(key))
        .map(|(_, icon)| *icon)
}

/// Default icon per node type.
pub fn type_icon(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Category => "menu-book",
        NodeType::Chapter => "folder",
        NodeType::Article => "article",
    }
}

/// Nearest explicit icon on the chain starting at `node_id`, walking
/// `parent_id` upward. Best-effort: a missing ancestor or an over-long
/// chain ends the walk empty-handed.
pub async fn inherited_icon(store: &NodeStore, node_id: Option<&str>) -> Option<String> {
    let mut cursor = node_id.map(str::to_string);
    let mut hops = 0usize;

    while let Some(id) = cursor {
        if hops >= MAX_WALK {
            return None;
        }
        match store.get(&id).await {
            Ok(Some(node)) => {
                if node.icon.is_some() {
                    return node.icon;
                }
                cursor = node.parent_id;
            }
            _ => return None,
        }
        hops += 1;
    }

    None
}

/// Full resolution chain for one node. `inherited` is the nearest
/// ancestor's explicit icon, if any.
pub fn resolve_icon(node: &ContentNode, inherited: Option<&str>) -> String {
    if let Some(own) = node.icon.as_deref() {
        return own.to_string();
    }
    if let Some(icon) = inherited {
        return icon.to_string();
    }
    if let Some(icon) = specific_icon(&node.slug, &node.title) {
        return icon.to_string();
    }
    type_icon(node.node_type).to_string()
}
