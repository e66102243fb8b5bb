use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use minbar::models::{Badge, NewNode, NodeType};
use minbar::store::NodeStore;

fn minbar_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("minbar");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/content.sqlite"

[server]
bind = "127.0.0.1:7761"

[search]
result_limit = 8
"#,
        root.display()
    );

    let config_path = config_dir.join("minbar.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_minbar(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = minbar_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run minbar binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Seeds the canonical category → chapter → two articles tree and returns
/// the chapter id.
fn seed_tree(config_path: &Path) -> String {
    let cfg = minbar::config::load_config(config_path).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        minbar::migrate::run_migrations(&cfg).await.unwrap();
        let store = NodeStore::connect(&cfg).await.unwrap();

        let cat = store
            .create(NewNode {
                slug: "tafseer".to_string(),
                title: "Tafseer".to_string(),
                node_type: Some(NodeType::Category),
                ..NewNode::default()
            })
            .await
            .unwrap();
        let chapter = store
            .create(NewNode {
                slug: "foundation".to_string(),
                title: "Foundation".to_string(),
                node_type: Some(NodeType::Chapter),
                parent_id: Some(cat.id.clone()),
                badge: Badge::Numbered(1),
                ..NewNode::default()
            })
            .await
            .unwrap();
        for (i, (slug, title)) in [("intro", "Introduction"), ("history", "History")]
            .iter()
            .enumerate()
        {
            store
                .create(NewNode {
                    slug: slug.to_string(),
                    title: title.to_string(),
                    node_type: Some(NodeType::Article),
                    parent_id: Some(chapter.id.clone()),
                    badge: Badge::Numbered(i as u32 + 1),
                    ..NewNode::default()
                })
                .await
                .unwrap();
        }

        store.pool().close().await;
        chapter.id
    })
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_minbar(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data").join("content.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_minbar(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_minbar(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_missing_config_fails() {
    let (_tmp, config_path) = setup_test_env();
    let bad_path = config_path.with_file_name("nope.toml");

    let (_, stderr, success) = run_minbar(&bad_path, &["init"]);
    assert!(!success, "init with missing config should fail");
    assert!(stderr.contains("config"), "Should mention config, got: {}", stderr);
}

#[test]
fn test_resolve_prints_node_children_breadcrumbs() {
    let (_tmp, config_path) = setup_test_env();
    seed_tree(&config_path);

    let (stdout, stderr, success) =
        run_minbar(&config_path, &["resolve", "tafseer/foundation"]);
    assert!(success, "resolve failed: {}", stderr);
    assert!(stdout.contains("Foundation"));
    assert!(stdout.contains("Children (2)"));
    assert!(stdout.contains("Introduction"));
    assert!(stdout.contains("/c/tafseer/foundation"));
}

#[test]
fn test_resolve_article_prints_navigation() {
    let (_tmp, config_path) = setup_test_env();
    seed_tree(&config_path);

    let (stdout, stderr, success) =
        run_minbar(&config_path, &["resolve", "tafseer/foundation/intro"]);
    assert!(success, "resolve failed: {}", stderr);
    assert!(stdout.contains("prev: -"));
    assert!(stdout.contains("next: History"));
}

#[test]
fn test_resolve_unknown_path_fails() {
    let (_tmp, config_path) = setup_test_env();
    seed_tree(&config_path);

    let (_, stderr, success) = run_minbar(&config_path, &["resolve", "tafseer/missing"]);
    assert!(!success, "resolve of a missing path should fail");
    assert!(
        stderr.contains("not found"),
        "Should report not found, got: {}",
        stderr
    );
}

#[test]
fn test_search_finds_article_with_href() {
    let (_tmp, config_path) = setup_test_env();
    seed_tree(&config_path);

    let (stdout, _, success) = run_minbar(&config_path, &["search", "History"]);
    assert!(success, "search failed");
    assert!(stdout.contains("History"));
    assert!(stdout.contains("/c/tafseer/foundation/history"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env();
    seed_tree(&config_path);

    let (stdout, _, success) = run_minbar(&config_path, &["search", "xyznonexistent"]);
    assert!(success);
    assert!(stdout.contains("No results"));
}

#[test]
fn test_search_respects_limit() {
    let (_tmp, config_path) = setup_test_env();
    seed_tree(&config_path);

    // Both articles mention their slug in the title path; "o" hits several
    // titles, so cap at one.
    let (stdout, _, success) = run_minbar(&config_path, &["search", "o", "--limit", "1"]);
    assert!(success);
    let hits = stdout.matches("id: ").count();
    assert_eq!(hits, 1, "expected a single result, got: {}", stdout);
}

#[test]
fn test_search_deterministic() {
    let (_tmp, config_path) = setup_test_env();
    seed_tree(&config_path);

    let (stdout1, _, _) = run_minbar(&config_path, &["search", "tafseer"]);
    let (stdout2, _, _) = run_minbar(&config_path, &["search", "tafseer"]);
    assert_eq!(
        stdout1, stdout2,
        "Search results should be deterministic across runs"
    );
}

#[test]
fn test_verify_clean_tree() {
    let (_tmp, config_path) = setup_test_env();
    seed_tree(&config_path);

    let (stdout, _, success) = run_minbar(&config_path, &["verify"]);
    assert!(success, "verify of a clean tree should pass");
    assert!(stdout.contains("ok"));
    assert!(stdout.contains("scanned: 4"));
}

#[test]
fn test_verify_detects_and_fixes_stale_path() {
    let (_tmp, config_path) = setup_test_env();
    let chapter_id = seed_tree(&config_path);

    // Corrupt the chapter's stored path behind the store's back.
    let cfg = minbar::config::load_config(&config_path).unwrap();
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let store = NodeStore::connect(&cfg).await.unwrap();
        sqlx::query("UPDATE content_nodes SET path = '[\"wrong\"]' WHERE id = ?")
            .bind(&chapter_id)
            .execute(store.pool())
            .await
            .unwrap();
        store.pool().close().await;
    });

    let (stdout, _, success) = run_minbar(&config_path, &["verify"]);
    assert!(!success, "verify should fail on a stale path");
    assert!(stdout.contains("stale paths: 1"));

    let (stdout, _, success) = run_minbar(&config_path, &["verify", "--fix"]);
    assert!(success, "verify --fix should repair and pass: {}", stdout);
    assert!(stdout.contains("repaired: 1"));

    let (stdout, _, success) = run_minbar(&config_path, &["verify"]);
    assert!(success);
    assert!(stdout.contains("stale paths: 0"));
}
