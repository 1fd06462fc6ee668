use std::io::Write;

use sibyl_core::config::{endpoint_from_script_url, Settings, DEFAULT_TRACE_URL};
use tempfile::tempdir;

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sibyl.toml");
    let mut file = std::fs::File::create(&path).expect("create");
    file.write_all(contents.as_bytes()).expect("write");
    (dir, path)
}

#[test]
fn defaults_apply_when_file_is_sparse() {
    let (_dir, path) = write_config("[server]\nport = 9090\n");
    let settings = Settings::from_file(&path).expect("settings");
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 9090);
    assert_eq!(settings.rate_limit.to, 3);
    assert_eq!(settings.rate_limit.per_ms, 30_000);
    assert_eq!(settings.trace.url, DEFAULT_TRACE_URL);
    assert_eq!(settings.monitor.allowed_country, "FR");
    assert_eq!(settings.monitor.endpoint, None);
    assert_eq!(settings.monitor.force_local, None);
    assert!(settings.resolve_endpoint().is_none());
}

#[test]
fn explicit_endpoint_wins_over_script_url() {
    let (_dir, path) = write_config(
        r#"
[monitor]
endpoint = "https://collect.example.com/graphql"
script_url = "https://cdn.example.com/sibyl.js?endpoint=https%3A%2F%2Fother.example.com"
force_robot = true

[page]
hostname = "shop.example.fr"
"#,
    );
    let settings = Settings::from_file(&path).expect("settings");
    assert_eq!(
        settings.resolve_endpoint().map(|u| u.to_string()).as_deref(),
        Some("https://collect.example.com/graphql")
    );
    assert_eq!(settings.monitor.force_robot, Some(true));
    assert_eq!(settings.page.to_page_info().hostname, "shop.example.fr");
}

#[test]
fn endpoint_is_read_from_script_url_query() {
    let (_dir, path) = write_config(
        r#"
[monitor]
script_url = "https://cdn.example.com/sibyl.js?v=3&endpoint=https%3A%2F%2Fcollect.example.com%2Fgraphql"
"#,
    );
    let settings = Settings::from_file(&path).expect("settings");
    assert_eq!(
        settings.resolve_endpoint().map(|u| u.to_string()).as_deref(),
        Some("https://collect.example.com/graphql")
    );
}

#[test]
fn script_url_without_endpoint_yields_none() {
    assert_eq!(
        endpoint_from_script_url("https://cdn.example.com/sibyl.js?v=3"),
        None
    );
    assert_eq!(
        endpoint_from_script_url("https://cdn.example.com/sibyl.js?endpoint="),
        None
    );
    assert_eq!(endpoint_from_script_url("not a url"), None);
}

#[test]
fn invalid_endpoint_is_ignored() {
    let (_dir, path) = write_config("[monitor]\nendpoint = \"::not-a-url\"\n");
    let settings = Settings::from_file(&path).expect("settings");
    assert!(settings.resolve_endpoint().is_none());
}
