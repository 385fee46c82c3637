//! End-to-end checks of startup wiring: configuration, tag loading and state.

mod common;

use std::io::Write;
use vndb_proxy::app_state::AppState;
use vndb_proxy::config::Config;
use vndb_proxy::error::ProxyError;
use vndb_proxy::metrics::{track_request, KANA};

#[test]
fn test_config_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("vndb_proxy_cfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[server]\nport = 9100\n\n[data]\nplaceholder_image = \"/blank.webp\"").unwrap();

    let cfg = Config::from_path(&path).unwrap();
    assert_eq!(cfg.server.port, 9100);
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.data.placeholder_image, "/blank.webp");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_state_from_config_loads_bundled_tags() {
    let cfg = common::config("http://127.0.0.1:1", 1);
    let state = AppState::from_config(cfg).expect("state builds");

    assert!(!state.tags.is_empty());
    assert_eq!(state.tags.get(7).unwrap().name, "Protagonist");
    assert_eq!(state.placeholder_image(), "/nsfw-warning.webp");
    assert_eq!(state.legacy.addr(), "127.0.0.1:1");
}

#[test]
fn test_missing_tag_file_fails_startup() {
    let mut cfg = Config::default();
    cfg.data.tags_path = "/nonexistent/tags.json".to_string();
    assert!(matches!(AppState::from_config(cfg), Err(ProxyError::Io(_))));
}

#[tokio::test]
async fn test_unreachable_upstream_is_recorded() {
    // nothing listens on port 1
    let state = common::state("http://127.0.0.1:1", 1);

    let result = track_request(&state.metrics, KANA, state.kana.stats()).await;

    assert!(matches!(result, Err(ProxyError::Http(_))));
    let metrics = state.metrics.get_metrics(KANA).unwrap();
    assert_eq!(metrics.failed_requests, 1);
    assert!(metrics.last_error.is_some());
}
