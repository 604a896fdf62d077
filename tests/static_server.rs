use http_body_util::BodyExt;
use hyper::header::{self, HeaderValue};
use hyper::{Request, Response, StatusCode};
use static_serve::body::Body;
use static_serve::config::ServeConfig;
use static_serve::static_server::StaticServer;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn server_for(root: &Path) -> StaticServer {
    StaticServer::from_config(ServeConfig::new(root)).unwrap()
}

fn get(path: &str) -> Request<()> {
    Request::get(path).body(()).unwrap()
}

fn get_with(path: &str, name: header::HeaderName, value: &str) -> Request<()> {
    Request::get(path).header(name, value).body(()).unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

#[tokio::test]
async fn serves_js_and_css_mime_types() {
    let dir = tempdir().unwrap();

    let mut js_file = File::create(dir.path().join("main.js")).unwrap();
    write!(js_file, "console.log('Hello');").unwrap();

    let mut css_file = File::create(dir.path().join("style.css")).unwrap();
    write!(css_file, "body {{ margin: 0; }}").unwrap();

    fs::write(dir.path().join("blob.unknownext"), [1u8, 2, 3]).unwrap();

    let server = server_for(dir.path());

    let js = server.serve(get("/main.js")).await;
    let js_type = js.headers()[header::CONTENT_TYPE].to_str().unwrap().to_owned();
    assert!(js_type == "application/javascript" || js_type == "text/javascript");

    let css = server.serve(get("/style.css")).await;
    assert_eq!(css.headers()[header::CONTENT_TYPE], "text/css");

    let blob = server.serve(get("/blob.unknownext")).await;
    assert_eq!(blob.headers()[header::CONTENT_TYPE], "application/octet-stream");
}

#[tokio::test]
async fn blocks_path_traversal_attempts() {
    let parent = tempdir().unwrap();
    let root = parent.path().join("served");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("safe.txt"), "OK").unwrap();
    fs::write(parent.path().join("outside.txt"), "NOPE").unwrap();

    let server = server_for(&root);

    // Normal file resolves fine
    let ok = server.serve(get("/safe.txt")).await;
    assert_eq!(ok.status(), StatusCode::OK);

    for attempt in [
        "/../outside.txt",
        "/%2e%2e/outside.txt",
        "/a/../../outside.txt",
        "/..%2foutside.txt",
    ] {
        let response = server.serve(get(attempt)).await;
        let status = response.status();
        assert!(
            status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND,
            "{attempt} -> {status}"
        );
        assert_ne!(body_bytes(response).await, b"NOPE");
    }
}

#[tokio::test]
async fn sibling_directory_sharing_the_root_prefix_is_unreachable() {
    let parent = tempdir().unwrap();
    let root = parent.path().join("served");
    let evil = parent.path().join("served-evil");
    fs::create_dir(&root).unwrap();
    fs::create_dir(&evil).unwrap();
    fs::write(evil.join("loot.txt"), "NOPE").unwrap();

    let server = server_for(&root);
    let response = server.serve(get("/../served-evil/loot.txt")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[cfg(unix)]
#[tokio::test]
async fn blocks_symlinks_that_escape_the_root() {
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), "NOPE").unwrap();

    let dir = tempdir().unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("escape")).unwrap();

    let server = server_for(dir.path());
    let response = server.serve(get("/escape/secret.txt")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_ne!(body_bytes(response).await, b"NOPE");

    let permissive = StaticServer::from_config(ServeConfig {
        follow_symlinks_outside_root: true,
        ..ServeConfig::new(dir.path())
    })
    .unwrap();
    let response = permissive.serve(get("/escape/secret.txt")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"NOPE");
}

#[tokio::test]
async fn range_request_returns_partial_content() {
    let dir = tempdir().unwrap();
    let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    fs::write(dir.path().join("data.bin"), &data).unwrap();

    let server = server_for(dir.path());
    let response = server
        .serve(get_with("/data.bin", header::RANGE, "bytes=0-99"))
        .await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 0-99/4096");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "100");
    assert_eq!(body_bytes(response).await, &data[..100]);
}

#[tokio::test]
async fn range_starting_at_file_size_is_not_satisfiable() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("data.bin"), vec![0u8; 500]).unwrap();

    let server = server_for(dir.path());
    let response = server
        .serve(get_with("/data.bin", header::RANGE, "bytes=500-550"))
        .await;

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */500");
}

#[tokio::test]
async fn malformed_range_serves_whole_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("data.txt"), "0123456789").unwrap();

    let server = server_for(dir.path());
    let response = server
        .serve(get_with("/data.txt", header::RANGE, "bytes=nonsense"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"0123456789");
}

#[tokio::test]
async fn matching_if_none_match_is_not_modified() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("page.html"), "<p>hello</p>").unwrap();

    let server = server_for(dir.path());
    let first = server.serve(get("/page.html")).await;
    let etag = first.headers()[header::ETAG].to_str().unwrap().to_owned();

    let second = server
        .serve(get_with("/page.html", header::IF_NONE_MATCH, &etag))
        .await;

    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(second).await.is_empty());
}

#[tokio::test]
async fn if_modified_since_round_trip_tracks_changes() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("notes.txt");
    let first_write = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    fs::write(&file_path, "version one").unwrap();
    set_mtime(&file_path, first_write);

    let server = server_for(dir.path());
    let original = server.serve(get("/notes.txt")).await;
    let etag = original.headers()[header::ETAG].clone();
    let last_modified = original.headers()[header::LAST_MODIFIED]
        .to_str()
        .unwrap()
        .to_owned();

    let unchanged = server
        .serve(get_with("/notes.txt", header::IF_MODIFIED_SINCE, &last_modified))
        .await;
    assert_eq!(unchanged.status(), StatusCode::NOT_MODIFIED);

    fs::write(&file_path, "version two, longer").unwrap();
    set_mtime(&file_path, first_write + Duration::from_secs(60));

    let changed = server
        .serve(get_with("/notes.txt", header::IF_MODIFIED_SINCE, &last_modified))
        .await;
    assert_eq!(changed.status(), StatusCode::OK);
    assert_ne!(changed.headers()[header::ETAG], etag);
    assert_eq!(body_bytes(changed).await, b"version two, longer");
}

#[tokio::test]
async fn hidden_dotfiles_are_absent_everywhere() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden"), "secret").unwrap();
    fs::write(dir.path().join("visible.txt"), "hello").unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    fs::write(dir.path().join(".git/config"), "[core]").unwrap();

    let server = StaticServer::from_config(ServeConfig {
        dotfiles: false,
        ..ServeConfig::new(dir.path())
    })
    .unwrap();

    assert_eq!(server.serve(get("/.hidden")).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.serve(get("/.git/config")).await.status(), StatusCode::NOT_FOUND);

    let listing = String::from_utf8(body_bytes(server.serve(get("/")).await).await).unwrap();
    assert!(listing.contains("visible.txt"));
    assert!(!listing.contains(".hidden"));
    assert!(!listing.contains(".git"));
}

#[tokio::test]
async fn dotfiles_are_served_by_default() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".hidden"), "secret").unwrap();

    let server = server_for(dir.path());

    let listing = String::from_utf8(body_bytes(server.serve(get("/")).await).await).unwrap();
    assert!(listing.contains(".hidden"));

    let response = server.serve(get("/.hidden")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"secret");
}

#[tokio::test]
async fn disabled_listing_falls_back_to_index_file() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("bare")).unwrap();
    fs::create_dir(dir.path().join("site")).unwrap();
    fs::write(dir.path().join("site/index.html"), "<h1>Site</h1>").unwrap();

    let server = StaticServer::from_config(ServeConfig {
        dir_listing: false,
        serve_index: false,
        ..ServeConfig::new(dir.path())
    })
    .unwrap();

    assert_eq!(server.serve(get("/bare/")).await.status(), StatusCode::FORBIDDEN);

    let response = server.serve(get("/site/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    assert_eq!(body_bytes(response).await, b"<h1>Site</h1>");
}

#[tokio::test]
async fn listing_links_to_parent_except_at_root() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a/b")).unwrap();
    fs::write(dir.path().join("a/b/file.txt"), "x").unwrap();

    let server = server_for(dir.path());

    let nested = String::from_utf8(body_bytes(server.serve(get("/a/b/")).await).await).unwrap();
    assert!(nested.contains("<a href=\"/a/\">../</a>"));
    assert!(nested.contains("href=\"/a/b/file.txt\""));

    let root = String::from_utf8(body_bytes(server.serve(get("/")).await).await).unwrap();
    assert!(!root.contains("../"));
    assert!(root.contains("href=\"/a/\""));
}

#[tokio::test]
async fn error_responses_carry_cors_headers() {
    let dir = tempdir().unwrap();

    let server = server_for(dir.path());
    let response = server.serve(get("/missing.txt")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static("*"))
    );
}

#[cfg(unix)]
#[tokio::test]
async fn visible_links_to_hidden_files_are_not_served() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
    std::os::unix::fs::symlink(dir.path().join(".env"), dir.path().join("env.txt")).unwrap();

    let server = StaticServer::from_config(ServeConfig {
        dotfiles: false,
        ..ServeConfig::new(dir.path())
    })
    .unwrap();

    let response = server.serve(get("/env.txt")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_ne!(body_bytes(response).await, b"SECRET=1");

    let listing = String::from_utf8(body_bytes(server.serve(get("/")).await).await).unwrap();
    assert!(!listing.contains("env.txt"));

    let permissive = server_for(dir.path());
    let response = permissive.serve(get("/env.txt")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"SECRET=1");
}

#[cfg(unix)]
#[tokio::test]
async fn listing_omits_links_that_leave_the_root() {
    let outside = tempdir().unwrap();
    fs::write(outside.path().join("secret.bin"), vec![0u8; 123_456]).unwrap();

    let dir = tempdir().unwrap();
    std::os::unix::fs::symlink(outside.path().join("secret.bin"), dir.path().join("link"))
        .unwrap();

    let server = server_for(dir.path());

    let listing = String::from_utf8(body_bytes(server.serve(get("/")).await).await).unwrap();
    assert!(!listing.contains("href=\"/link\""));
    assert!(!listing.contains("120.6 KiB"));
    assert_eq!(server.serve(get("/link")).await.status(), StatusCode::BAD_REQUEST);
}
