//! # Minbar CLI (`minbar`)
//!
//! The `minbar` binary manages the content database and serves the content
//! API consumed by the reader and admin UIs.
//!
//! ## Usage
//!
//! ```bash
//! minbar --config ./config/minbar.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `minbar init` | Create the SQLite database and run schema migrations |
//! | `minbar resolve <path>` | Resolve a slug path and print the node, children, breadcrumbs |
//! | `minbar search "<query>"` | Substring search over published content |
//! | `minbar verify` | Audit tree integrity (`--fix` repairs stale paths) |
//! | `minbar serve` | Start the content API HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! minbar init --config ./config/minbar.toml
//!
//! # Inspect a category page the way the reader UI would
//! minbar resolve tafseer/foundation
//!
//! # Search in either language
//! minbar search "น้ำ"
//!
//! # Audit denormalized path metadata after hand-edits
//! minbar verify --fix
//!
//! # Serve the API
//! minbar serve --config ./config/minbar.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use minbar::{config, migrate, resolve, search, server, verify};

/// Minbar CLI — a hierarchical content store and API for a bilingual
/// Islamic studies library.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file with the database path, server bind address, and search limit.
#[derive(Parser)]
#[command(
    name = "minbar",
    about = "Minbar — hierarchical content store and API for a bilingual Islamic studies library",
    version,
    long_about = "Minbar stores categories, chapters, and arbitrarily nested articles as flat \
    records with denormalized path metadata, keeps the tree consistent across moves and deletes, \
    and serves path lookups, breadcrumbs, sibling ordering, and substring search over HTTP."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/minbar.toml`.
    #[arg(long, global = true, default_value = "./config/minbar.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the `content_nodes` table, and its
    /// indexes. This command is idempotent — running it multiple times is
    /// safe.
    Init,

    /// Resolve a slug path and print the node with its children.
    ///
    /// Walks the path level by level the way the reader UI does
    /// (`tafseer/foundation/intro`), then prints the resolved node, its
    /// ordered children, and the breadcrumb trail.
    Resolve {
        /// Slug path, segments joined with `/`.
        path: String,
    },

    /// Search published content.
    ///
    /// Case-insensitive substring match over title, summary, and body.
    /// Each hit is printed with its reconstructed href.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results (defaults to the configured limit).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Audit tree integrity.
    ///
    /// Re-derives every node's path from its live parent chain and reports
    /// stale paths, orphaned nodes, and duplicate sibling slugs. Exits
    /// nonzero when problems remain.
    Verify {
        /// Rewrite stale paths from the live parent chain.
        #[arg(long)]
        fix: bool,
    },

    /// Start the content API HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// content endpoints used by the reader and admin UIs.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Resolve { path } => {
            resolve::run_resolve(&cfg, &path).await?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Verify { fix } => {
            let clean = verify::run_verify(&cfg, fix).await?;
            if !clean {
                std::process::exit(1);
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
