//! Core data models for the content tree.
//!
//! Every stored record is a [`ContentNode`] — a category, chapter, or
//! article — kept in one flat table and linked to its parent by id. The
//! denormalized `path` field holds the ancestor slug chain (never the node's
//! own slug) so breadcrumbs and hrefs can be built without walking the tree.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Node kind. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Category,
    Chapter,
    Article,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Category => "category",
            NodeType::Chapter => "chapter",
            NodeType::Article => "article",
        }
    }

    pub fn parse(s: &str) -> Option<NodeType> {
        match s {
            "category" => Some(NodeType::Category),
            "chapter" => Some(NodeType::Chapter),
            "article" => Some(NodeType::Article),
            _ => None,
        }
    }
}

/// Sibling-ordering / availability marker.
///
/// On the wire this is a positive integer, the string `"coming-soon"`, or
/// null. Integer badges double as a manual sort key and visible numbering;
/// `ComingSoon` marks content whose children the reader UI hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Badge {
    #[default]
    Unnumbered,
    ComingSoon,
    Numbered(u32),
}

impl Badge {
    /// Sort key for article ordering. Non-numeric badges sort last.
    pub fn sort_key(&self) -> i64 {
        match self {
            Badge::Numbered(n) => i64::from(*n),
            Badge::Unnumbered | Badge::ComingSoon => 999,
        }
    }

    /// Column representation: NULL, `coming-soon`, or the number as text.
    pub fn to_column(&self) -> Option<String> {
        match self {
            Badge::Unnumbered => None,
            Badge::ComingSoon => Some("coming-soon".to_string()),
            Badge::Numbered(n) => Some(n.to_string()),
        }
    }

    /// Parse the column representation. Unknown text decodes as
    /// `Unnumbered` rather than failing the whole row.
    pub fn from_column(value: Option<&str>) -> Badge {
        match value {
            None => Badge::Unnumbered,
            Some("coming-soon") => Badge::ComingSoon,
            Some(text) => match text.parse::<u32>() {
                Ok(n) if n >= 1 => Badge::Numbered(n),
                _ => Badge::Unnumbered,
            },
        }
    }
}

impl Serialize for Badge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Badge::Unnumbered => serializer.serialize_unit(),
            Badge::ComingSoon => serializer.serialize_str("coming-soon"),
            Badge::Numbered(n) => serializer.serialize_u32(*n),
        }
    }
}

impl<'de> Deserialize<'de> for Badge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u32),
            Text(String),
        }

        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(Badge::Unnumbered),
            Some(Repr::Number(n)) if n >= 1 => Ok(Badge::Numbered(n)),
            Some(Repr::Number(_)) => Err(D::Error::custom("numbered badge must be >= 1")),
            Some(Repr::Text(s)) if s == "coming-soon" => Ok(Badge::ComingSoon),
            Some(Repr::Text(s)) => Err(D::Error::custom(format!("unknown badge value: {s}"))),
        }
    }
}

/// A single content record as stored and as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNode {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub author: String,
    pub badge: Badge,
    pub body: String,
    pub parent_id: Option<String>,
    /// Ancestor slug chain, excluding this node's own slug.
    pub path: Vec<String>,
    #[serde(rename = "order")]
    pub order: i64,
    pub published: bool,
    pub icon: Option<String>,
    #[serde(serialize_with = "ser_iso8601")]
    pub created_at: i64,
    #[serde(serialize_with = "ser_iso8601")]
    pub updated_at: i64,
}

impl ContentNode {
    /// Maps a `content_nodes` row. Fails on an unknown `node_type` or a
    /// `path` column that is not a JSON string array.
    pub fn from_row(row: &SqliteRow) -> Result<ContentNode, sqlx::Error> {
        let type_text: String = row.get("node_type");
        let node_type = NodeType::parse(&type_text)
            .ok_or_else(|| sqlx::Error::Decode(format!("unknown node_type: {type_text}").into()))?;

        let path_text: String = row.get("path");
        let path: Vec<String> = serde_json::from_str(&path_text)
            .map_err(|e| sqlx::Error::Decode(format!("bad path column: {e}").into()))?;

        let badge_text: Option<String> = row.get("badge");
        let published: i64 = row.get("published");

        Ok(ContentNode {
            id: row.get("id"),
            slug: row.get("slug"),
            title: row.get("title"),
            summary: row.get("summary"),
            node_type,
            author: row.get("author"),
            badge: Badge::from_column(badge_text.as_deref()),
            body: row.get("body"),
            parent_id: row.get("parent_id"),
            path,
            order: row.get("ord"),
            published: published != 0,
            icon: row.get("icon"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Create request body. Required fields are validated by the store so a
/// missing slug/title/type surfaces as a structured validation error, not a
/// deserialization failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub badge: Badge,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(rename = "order", default)]
    pub order: i64,
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub icon: Option<String>,
}

fn default_published() -> bool {
    true
}

impl Default for NewNode {
    fn default() -> Self {
        Self {
            slug: String::new(),
            title: String::new(),
            summary: String::new(),
            node_type: None,
            author: String::new(),
            badge: Badge::Unnumbered,
            body: String::new(),
            parent_id: None,
            order: 0,
            published: true,
            icon: None,
        }
    }
}

/// Update request body. Absent fields are left unchanged; `parentId` and
/// `icon` distinguish absent from explicit null (null clears), and `badge`
/// accepts null to reset to unnumbered.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    pub id: Option<String>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    #[serde(default, deserialize_with = "badge_patch")]
    pub badge: Option<Badge>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<String>>,
    #[serde(rename = "order")]
    pub order: Option<i64>,
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
}

/// Lean search projection: enough to render a result row and link to it.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Navigable href, e.g. `/c/tafseer/foundation/intro`.
    pub path: String,
    pub slug: String,
}

/// One breadcrumb trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub title: String,
    pub href: String,
}

fn ser_iso8601<S: Serializer>(ts: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    let rendered = chrono::DateTime::from_timestamp(*ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string());
    serializer.serialize_str(&rendered)
}

/// Present-vs-null discrimination for patch fields: an absent key stays
/// `None`, an explicit JSON null becomes `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn badge_patch<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Badge>, D::Error> {
    Badge::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_serializes_as_number_sentinel_or_null() {
        assert_eq!(serde_json::to_string(&Badge::Numbered(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&Badge::ComingSoon).unwrap(),
            "\"coming-soon\""
        );
        assert_eq!(serde_json::to_string(&Badge::Unnumbered).unwrap(), "null");
    }

    #[test]
    fn badge_deserializes_all_forms() {
        assert_eq!(serde_json::from_str::<Badge>("7").unwrap(), Badge::Numbered(7));
        assert_eq!(
            serde_json::from_str::<Badge>("\"coming-soon\"").unwrap(),
            Badge::ComingSoon
        );
        assert_eq!(serde_json::from_str::<Badge>("null").unwrap(), Badge::Unnumbered);
    }

    #[test]
    fn badge_rejects_zero_and_unknown_text() {
        assert!(serde_json::from_str::<Badge>("0").is_err());
        assert!(serde_json::from_str::<Badge>("\"soon\"").is_err());
    }

    #[test]
    fn badge_sort_key_puts_unnumbered_last() {
        assert_eq!(Badge::Numbered(1).sort_key(), 1);
        assert_eq!(Badge::Unnumbered.sort_key(), 999);
        assert_eq!(Badge::ComingSoon.sort_key(), 999);
    }

    #[test]
    fn badge_column_round_trip() {
        for badge in [Badge::Unnumbered, Badge::ComingSoon, Badge::Numbered(12)] {
            let col = badge.to_column();
            assert_eq!(Badge::from_column(col.as_deref()), badge);
        }
    }

    #[test]
    fn patch_distinguishes_absent_from_null_parent() {
        let absent: NodePatch = serde_json::from_str(r#"{"title":"t"}"#).unwrap();
        assert_eq!(absent.parent_id, None);

        let cleared: NodePatch = serde_json::from_str(r#"{"parentId":null}"#).unwrap();
        assert_eq!(cleared.parent_id, Some(None));

        let set: NodePatch = serde_json::from_str(r#"{"parentId":"abc"}"#).unwrap();
        assert_eq!(set.parent_id, Some(Some("abc".to_string())));
    }

    #[test]
    fn patch_badge_null_clears_absent_keeps() {
        let absent: NodePatch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.badge, None);

        let cleared: NodePatch = serde_json::from_str(r#"{"badge":null}"#).unwrap();
        assert_eq!(cleared.badge, Some(Badge::Unnumbered));

        let numbered: NodePatch = serde_json::from_str(r#"{"badge":4}"#).unwrap();
        assert_eq!(numbered.badge, Some(Badge::Numbered(4)));
    }

    #[test]
    fn node_serializes_camel_case_with_iso_timestamps() {
        let node = ContentNode {
            id: "n1".into(),
            slug: "intro".into(),
            title: "Introduction".into(),
            summary: String::new(),
            node_type: NodeType::Article,
            author: String::new(),
            badge: Badge::Numbered(1),
            body: "<p>hi</p>".into(),
            parent_id: Some("p1".into()),
            path: vec!["tafseer".into(), "foundation".into()],
            order: 0,
            published: true,
            icon: None,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        };
        let json: serde_json::Value = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "article");
        assert_eq!(json["parentId"], "p1");
        assert_eq!(json["badge"], 1);
        assert_eq!(json["path"][1], "foundation");
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20Z");
    }
}
