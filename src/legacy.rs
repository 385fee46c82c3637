//! Client for the legacy VNDB TCP API.
//!
//! Every message in either direction is UTF-8 text terminated by `0x04`.
//! A session starts with `login {...}` answered by `ok`; after that each
//! `get ...` command is answered by `results {...}` or `error {...}`.
//!
//! One connection is opened per query and dropped afterwards.

use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;

/// Message terminator.
pub const EOT: u8 = 0x04;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub name: String,
    pub body: Option<Value>,
}

impl Reply {
    /// Body of a `results` reply; `error` replies become `ProxyError::Legacy`.
    pub fn into_results(self) -> Result<Value, ProxyError> {
        match self.name.as_str() {
            "results" => Ok(self.body.unwrap_or(Value::Null)),
            "error" => Err(ProxyError::Legacy(self.body.unwrap_or(Value::Null))),
            other => Err(ProxyError::Protocol(other.to_string())),
        }
    }
}

pub fn encode(command: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(command.len() + 1);
    frame.extend_from_slice(command.as_bytes());
    frame.push(EOT);
    frame
}

/// Parse one frame (terminator already stripped).
pub fn parse_reply(frame: &[u8]) -> Result<Reply, ProxyError> {
    let text = std::str::from_utf8(frame)
        .map_err(|e| ProxyError::Protocol(format!("reply is not utf-8: {}", e)))?
        .trim();
    if text.is_empty() {
        return Err(ProxyError::Protocol("empty reply".to_string()));
    }
    let reply = match text.split_once(' ') {
        Some((name, body)) => Reply {
            name: name.to_string(),
            body: Some(serde_json::from_str(body)?),
        },
        None => Reply {
            name: text.to_string(),
            body: None,
        },
    };
    Ok(reply)
}

pub fn login_command(client: &str) -> String {
    let body = json!({
        "protocol": PROTOCOL_VERSION,
        "client": client,
        "clientver": env!("CARGO_PKG_VERSION"),
    });
    format!("login {}", body)
}

pub struct LegacyClient {
    addr: String,
    client: String,
    acquire_timeout: Duration,
    timeout: Duration,
}

impl LegacyClient {
    pub fn new(cfg: &UpstreamConfig) -> Self {
        Self {
            addr: cfg.legacy_addr(),
            client: format!("{}-{}", cfg.client_name, Uuid::new_v4().simple()),
            acquire_timeout: cfg.acquire_timeout(),
            timeout: cfg.timeout(),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Run one `get ...` command and return the `results` body.
    pub async fn query(&self, command: &str) -> Result<Value, ProxyError> {
        timeout(self.timeout, self.exchange(command))
            .await
            .map_err(|_| ProxyError::Timeout(self.timeout.as_millis() as u64))?
    }

    async fn exchange(&self, command: &str) -> Result<Value, ProxyError> {
        let mut conn = timeout(self.acquire_timeout, self.connect())
            .await
            .map_err(|_| ProxyError::Timeout(self.acquire_timeout.as_millis() as u64))??;
        log::debug!("legacy> {}", command);
        conn.send(command).await?.into_results()
    }

    async fn connect(&self) -> Result<Connection, ProxyError> {
        let stream = TcpStream::connect(&self.addr).await?;
        let mut conn = Connection {
            stream: BufReader::new(stream),
        };
        let reply = conn.send(&login_command(&self.client)).await?;
        match reply.name.as_str() {
            "ok" => Ok(conn),
            "error" => Err(ProxyError::Legacy(reply.body.unwrap_or(Value::Null))),
            other => Err(ProxyError::Protocol(format!("login answered with `{}`", other))),
        }
    }
}

struct Connection {
    stream: BufReader<TcpStream>,
}

impl Connection {
    async fn send(&mut self, command: &str) -> Result<Reply, ProxyError> {
        self.stream.get_mut().write_all(&encode(command)).await?;
        self.stream.get_mut().flush().await?;

        let mut frame = Vec::new();
        self.stream.read_until(EOT, &mut frame).await?;
        match frame.pop() {
            Some(EOT) => parse_reply(&frame),
            _ => Err(ProxyError::Protocol("connection closed mid-reply".to_string())),
        }
    }
}
