//! Fakes shared by the integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use vndb_proxy::app_state::AppState;
use vndb_proxy::config::Config;
use vndb_proxy::tags::TagStore;

pub const EOT: u8 = 0x04;

/// Commands received by a fake legacy server, login excluded.
pub type Seen = Arc<Mutex<Vec<String>>>;

pub fn tags_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data/tags.json"))
}

pub fn config(kana_url: &str, legacy_port: u16) -> Config {
    let mut cfg = Config::default();
    cfg.upstream.kana_url = kana_url.to_string();
    cfg.upstream.legacy_host = "127.0.0.1".to_string();
    cfg.upstream.legacy_port = legacy_port;
    cfg.upstream.timeout_secs = 5;
    cfg.data.tags_path = tags_path().display().to_string();
    cfg
}

pub fn state(kana_url: &str, legacy_port: u16) -> AppState {
    let tags = TagStore::load(tags_path()).expect("bundled tags load");
    AppState::with_tags(config(kana_url, legacy_port), tags).expect("state builds")
}

/// Upstream VN as kana returns it for the requested fields.
pub fn vn_record(id: u64) -> Value {
    json!({
        "id": format!("v{}", id),
        "title": format!("Visual Novel {}", id),
        "description": null,
        "image": {"url": format!("https://t.vndb.org/cv/{}.jpg", id), "sexual": 0.0, "violence": 0.0},
        "rating": 75.5,
        "length": 3,
        "length_minutes": 1200,
        "length_votes": 10,
        "languages": ["ja", "en"],
        "released": "2004-08-29",
        "aliases": [],
        "screenshots": [
            {"url": format!("https://t.vndb.org/sf/{}.jpg", id), "thumbnail": format!("https://t.vndb.org/st/{}.jpg", id),
             "sexual": 0.0, "violence": 0.0, "dims": [1024, 768]}
        ]
    })
}

/// Legacy server answering `ok` to the login and `reply` to every command.
pub async fn spawn_legacy(reply: &'static str) -> (u16, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let mut stream = BufReader::new(stream);
            let mut frame = Vec::new();

            if stream.read_until(EOT, &mut frame).await.unwrap_or(0) == 0 {
                continue;
            }
            if stream.get_mut().write_all(b"ok\x04").await.is_err() {
                continue;
            }

            frame.clear();
            if stream.read_until(EOT, &mut frame).await.unwrap_or(0) == 0 {
                continue;
            }
            frame.pop();
            seen_clone
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(&frame).into_owned());

            let mut out = reply.as_bytes().to_vec();
            out.push(EOT);
            let _ = stream.get_mut().write_all(&out).await;
        }
    });

    (port, seen)
}

/// Legacy server that accepts connections and never answers.
pub async fn spawn_silent_legacy() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    port
}
