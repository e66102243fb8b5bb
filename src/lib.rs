//! # Minbar
//!
//! A hierarchical content store and API for a bilingual (Thai/Arabic)
//! Islamic studies library.
//!
//! Content is a tree of typed nodes — categories, chapters, articles —
//! stored as flat records in SQLite. Each record links to its parent by id
//! and carries a denormalized `path` of ancestor slugs, so path lookups,
//! breadcrumbs, and search stay cheap without a graph engine. The store
//! keeps the tree consistent: sibling slugs are unique, moves rewrite
//! descendant paths transactionally, and deletes are guarded by a
//! has-children check with an explicit cascade.
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────┐
//! │  Reader  │──▶│  HTTP API     │──▶│  SQLite   │
//! │  /Admin  │   │ (axum)       │   │ one table │
//! └──────────┘   └──────┬───────┘   └────┬─────┘
//!                       │                │
//!                  ┌────▼────────────────▼───┐
//!                  │ store / resolve / search │
//!                  └─────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! minbar init                          # create database
//! minbar serve                         # start the content API
//! minbar resolve tafseer/foundation    # inspect a path
//! minbar search "wudu"                 # substring search
//! minbar verify --fix                  # audit and repair path metadata
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Node, badge, and projection types |
//! | [`error`] | Store error taxonomy |
//! | [`store`] | Flat node repository and tree consistency rules |
//! | [`resolve`] | Slug-path resolution and breadcrumbs |
//! | [`ordering`] | Sibling ordering and prev/next article navigation |
//! | [`search`] | Substring search with href reconstruction |
//! | [`icon`] | Derived icon identifiers for listings |
//! | [`verify`] | Path-invariant audit and repair |
//! | [`server`] | Content API HTTP server |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod error;
pub mod icon;
pub mod migrate;
pub mod models;
pub mod ordering;
pub mod resolve;
pub mod search;
pub mod server;
pub mod store;
pub mod verify;
