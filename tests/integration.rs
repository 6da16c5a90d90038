use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00";

fn annot_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_annot"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    // Test images: two real signatures, plus a text file the globs skip.
    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(files_dir.join("alpha.png"), PNG_MAGIC).unwrap();
    fs::write(files_dir.join("beta.JPG"), JPEG_MAGIC).unwrap();
    fs::write(files_dir.join("readme.txt"), "not an image").unwrap();
    fs::write(root.join("notes.txt"), "also not an image").unwrap();

    let config_content = format!(
        r#"[storage]
path = "{}/data/annotations.sqlite"

[upload]
exclude_globs = ["**/skip/**"]
max_concurrent_reads = 2
"#,
        root.display()
    );

    let config_path = config_dir.join("annot.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_annot(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = annot_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run annot binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn root_of(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap().parent().unwrap().to_path_buf()
}

fn upload_fixtures(config_path: &Path) {
    let root = root_of(config_path);
    let files = root.join("files");
    let notes = root.join("notes.txt");
    let (stdout, stderr, success) = run_annot(
        config_path,
        &[
            "upload",
            "--progress",
            "off",
            files.to_str().unwrap(),
            notes.to_str().unwrap(),
        ],
    );
    assert!(success, "upload failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("added:   2"), "stdout={}", stdout);
    assert!(stdout.contains("skipped: 1"), "stdout={}", stdout);
}

fn export_json(config_path: &Path) -> serde_json::Value {
    let (stdout, stderr, success) = run_annot(config_path, &["export"]);
    assert!(success, "export failed: stderr={}", stderr);
    serde_json::from_str(&stdout).expect("export is valid JSON")
}

fn selected_comments(doc: &serde_json::Value) -> Vec<serde_json::Value> {
    let selected = doc["selectedImageId"].as_str().unwrap();
    doc["images"]
        .as_array()
        .unwrap()
        .iter()
        .find(|img| img["id"] == selected)
        .map(|img| img["comments"].as_array().unwrap().clone())
        .unwrap()
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_annot(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(root_of(&config_path).join("data/annotations.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_annot(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_annot(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_empty_store() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_annot(&config_path, &["images"]);
    assert!(success);
    assert!(stdout.contains("No images available"));

    let (stdout, _, success) = run_annot(&config_path, &["show"]);
    assert!(success);
    assert!(stdout.contains("No image selected"));

    let doc = export_json(&config_path);
    assert_eq!(doc["version"], 1);
    assert_eq!(doc["images"].as_array().unwrap().len(), 0);
    assert!(doc["selectedImageId"].is_null());
}

#[test]
fn test_upload_lists_and_selects() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);

    let (stdout, _, success) = run_annot(&config_path, &["images"]);
    assert!(success);
    assert!(stdout.contains("alpha.png"));
    assert!(stdout.contains("beta.JPG"));
    assert!(stdout.contains("2 image(s)"));

    let doc = export_json(&config_path);
    let images = doc["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    let urls: Vec<&str> = images.iter().map(|i| i["url"].as_str().unwrap()).collect();
    assert!(urls.iter().any(|u| u.starts_with("data:image/png;base64,")));
    assert!(urls.iter().any(|u| u.starts_with("data:image/jpeg;base64,")));

    // The first image added to an empty store is selected.
    let selected = doc["selectedImageId"].as_str().unwrap();
    assert!(images.iter().any(|i| i["id"] == selected));
}

#[test]
fn test_upload_missing_path_fails() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_annot(
        &config_path,
        &["upload", "--progress", "off", "/definitely/not/here"],
    );
    assert!(!success);
    assert!(stderr.contains("does not exist"));
}

#[test]
fn test_comment_and_reply_flow() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);

    let (stdout, stderr, success) = run_annot(
        &config_path,
        &["comment", "add", "--x", "25", "--y", "50", "Logo is blurry"],
    );
    assert!(success, "comment add failed: {}", stderr);
    assert!(stdout.contains("Added comment #1"));

    let (stdout, stderr, success) = run_annot(&config_path, &["reply", "add", "#1", "Agreed"]);
    assert!(success, "reply add failed: {}", stderr);
    assert!(stdout.contains("Added reply"));

    // A new comment is the open thread.
    let (stdout, _, success) = run_annot(&config_path, &["show"]);
    assert!(success);
    assert!(stdout.contains("Comments (1):"));
    assert!(stdout.contains("Logo is blurry"));
    assert!(stdout.contains("--- Comment #1 ---"));
    assert!(stdout.contains("Agreed"));

    let doc = export_json(&config_path);
    let comments = selected_comments(&doc);
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["x"], 25.0);
    assert_eq!(comments[0]["y"], 50.0);
    assert_eq!(comments[0]["replies"][0]["text"], "Agreed");
    assert_eq!(doc["activeCommentId"], comments[0]["id"]);
    let reply_id = comments[0]["replies"][0]["id"].as_str().unwrap().to_string();

    let (_, stderr, success) = run_annot(
        &config_path,
        &["reply", "edit", "#1", reply_id.as_str(), "Agreed, fixing"],
    );
    assert!(success, "reply edit failed: {}", stderr);
    let (_, _, success) = run_annot(&config_path, &["comment", "edit", "#1", "Logo is very blurry"]);
    assert!(success);

    let doc = export_json(&config_path);
    let comments = selected_comments(&doc);
    assert_eq!(comments[0]["text"], "Logo is very blurry");
    assert_eq!(comments[0]["replies"][0]["text"], "Agreed, fixing");

    let (_, _, success) = run_annot(&config_path, &["reply", "delete", "#1", reply_id.as_str()]);
    assert!(success);
    let (stdout, _, success) = run_annot(&config_path, &["comment", "delete", "#1"]);
    assert!(success);
    assert!(stdout.contains("Deleted comment"));

    let doc = export_json(&config_path);
    assert!(selected_comments(&doc).is_empty());
    assert!(doc["activeCommentId"].is_null());
}

#[test]
fn test_comment_at_click_position() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);

    let (_, stderr, success) = run_annot(
        &config_path,
        &[
            "comment", "add", "--click", "320,120", "--size", "640x480", "Here",
        ],
    );
    assert!(success, "comment add failed: {}", stderr);

    let doc = export_json(&config_path);
    let comments = selected_comments(&doc);
    assert_eq!(comments[0]["x"], 50.0);
    assert_eq!(comments[0]["y"], 25.0);
}

#[test]
fn test_non_finite_click_rejected() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);
    run_annot(&config_path, &["comment", "add", "--x", "10", "--y", "10", "keep me"]);

    let (_, _, success) = run_annot(
        &config_path,
        &["comment", "add", "--click", "NaN,5", "--size", "100x100", "nan"],
    );
    assert!(!success);
    let (_, _, success) = run_annot(
        &config_path,
        &["comment", "add", "--x", "inf", "--y", "5", "inf"],
    );
    assert!(!success);

    let doc = export_json(&config_path);
    assert_eq!(doc["images"].as_array().unwrap().len(), 2);
    let comments = selected_comments(&doc);
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "keep me");
}

#[test]
fn test_open_and_close_thread() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);

    run_annot(&config_path, &["comment", "add", "--x", "1", "--y", "1", "first"]);
    run_annot(&config_path, &["comment", "add", "--x", "2", "--y", "2", "second"]);

    let (_, _, success) = run_annot(&config_path, &["comment", "open", "#1"]);
    assert!(success);
    let doc = export_json(&config_path);
    assert_eq!(doc["activeCommentId"], selected_comments(&doc)[0]["id"]);

    let (stdout, _, success) = run_annot(&config_path, &["comment", "close"]);
    assert!(success);
    assert!(stdout.contains("Closed"));
    let doc = export_json(&config_path);
    assert!(doc["activeCommentId"].is_null());
}

#[test]
fn test_empty_text_rejected() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);

    let (_, stderr, success) = run_annot(
        &config_path,
        &["comment", "add", "--x", "10", "--y", "10", "   "],
    );
    assert!(!success);
    assert!(stderr.contains("must not be empty"));

    let doc = export_json(&config_path);
    assert!(selected_comments(&doc).is_empty());
}

#[test]
fn test_unknown_selection_makes_comment_noop() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);

    let (stdout, stderr, success) = run_annot(&config_path, &["select", "no-such-image"]);
    assert!(success);
    assert!(stdout.contains("Selected no-such-image"));
    assert!(stderr.contains("no image with id"));

    let (_, stderr, success) = run_annot(
        &config_path,
        &["comment", "add", "--x", "10", "--y", "10", "lost"],
    );
    assert!(success, "an ignored action is not an error");
    assert!(stderr.contains("Nothing changed"));

    let doc = export_json(&config_path);
    assert_eq!(doc["selectedImageId"], "no-such-image");
    let total: usize = doc["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|img| img["comments"].as_array().unwrap().len())
        .sum();
    assert_eq!(total, 0);
}

#[test]
fn test_unknown_comment_reported() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);

    let (_, stderr, success) = run_annot(&config_path, &["reply", "add", "#4", "hello"]);
    assert!(success);
    assert!(stderr.contains("Nothing changed"));
}

#[test]
fn test_delete_unknown_reply_warns() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);
    run_annot(&config_path, &["comment", "add", "--x", "5", "--y", "5", "note"]);
    run_annot(&config_path, &["reply", "add", "#1", "kept"]);

    let (stdout, stderr, success) =
        run_annot(&config_path, &["reply", "delete", "#1", "no-such-reply"]);
    assert!(success);
    assert!(!stdout.contains("Deleted reply"));
    assert!(stderr.contains("has no reply 'no-such-reply'"));

    let doc = export_json(&config_path);
    assert_eq!(selected_comments(&doc)[0]["replies"][0]["text"], "kept");
}

#[test]
fn test_export_to_file_and_stats() {
    let (_tmp, config_path) = setup_test_env();
    upload_fixtures(&config_path);
    run_annot(&config_path, &["comment", "add", "--x", "5", "--y", "5", "note"]);

    let out = root_of(&config_path).join("out/annotations.json");
    let (_, stderr, success) = run_annot(
        &config_path,
        &["export", "--output", out.to_str().unwrap()],
    );
    assert!(success, "export failed: {}", stderr);
    assert!(stderr.contains("Exported 2 images, 1 comments"));

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["version"], 1);

    let (stdout, _, success) = run_annot(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Images:      2"));
    assert!(stdout.contains("Comments:    1"));
    assert!(stdout.contains("Replies:     0"));
    assert!(stdout.contains("just now"));
}
