//! Shared harness: a real server on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use zerokage_dex::app_state::{AppState, SharedDex};
use zerokage_dex::build_app;
use zerokage_dex::domain::{Address, EventBus, FeeRate, PoolEntry};
use zerokage_dex::ledger::InMemoryLedger;
use zerokage_dex::service::DexService;

pub const E18: u128 = 1_000_000_000_000_000_000;

pub const POOL: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";
pub const TOKEN: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const ALICE: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
pub const BOB: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

pub struct TestServer {
    pub addr: SocketAddr,
    pub dex: SharedDex,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

fn addr(raw: &str) -> Address {
    let Ok(a) = raw.parse() else {
        panic!("bad test address {raw}");
    };
    a
}

/// Starts a server whose genesis account (ALICE) holds 1 000 000 tokens
/// and 10 000 base units.
pub async fn spawn_server() -> TestServer {
    let ledger = Arc::new(InMemoryLedger::with_genesis(
        addr(POOL),
        addr(ALICE),
        1_000_000 * E18,
        10_000 * E18,
    ));
    let entry = PoolEntry::new(addr(POOL), addr(TOKEN), FeeRate::DEFAULT);
    let dex = Arc::new(DexService::new(entry, ledger, EventBus::new(1024)));
    let app = build_app(AppState::new(Arc::clone(&dex)), Duration::from_secs(10));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestServer { addr, dex }
}

/// POSTs `body` and returns `(status, json)`.
pub async fn post(
    client: &reqwest::Client,
    url: &str,
    body: serde_json::Value,
) -> (u16, serde_json::Value) {
    let Ok(resp) = client.post(url).json(&body).send().await else {
        panic!("POST {url} failed");
    };
    let status = resp.status().as_u16();
    let Ok(json) = resp.json::<serde_json::Value>().await else {
        panic!("POST {url}: body is not JSON");
    };
    (status, json)
}

/// GETs `url` and returns `(status, json)`.
pub async fn get(client: &reqwest::Client, url: &str) -> (u16, serde_json::Value) {
    let Ok(resp) = client.get(url).send().await else {
        panic!("GET {url} failed");
    };
    let status = resp.status().as_u16();
    let Ok(json) = resp.json::<serde_json::Value>().await else {
        panic!("GET {url}: body is not JSON");
    };
    (status, json)
}

/// Approves the pool for `amount` tokens of `owner`.
pub async fn approve(server: &TestServer, client: &reqwest::Client, owner: &str, amount: u128) {
    let (status, _) = post(
        client,
        &server.url("/api/v1/accounts/approve"),
        serde_json::json!({ "owner": owner, "amount": amount.to_string() }),
    )
    .await;
    assert_eq!(status, 200);
}

/// Initializes the pool from ALICE with 1000 tokens and 10 base.
pub async fn initialize(server: &TestServer, client: &reqwest::Client) -> serde_json::Value {
    approve(server, client, ALICE, 1_000 * E18).await;
    let (status, body) = post(
        client,
        &server.url("/api/v1/pool/initialize"),
        serde_json::json!({
            "caller": ALICE,
            "token_amount": (1_000 * E18).to_string(),
            "base_amount": (10 * E18).to_string(),
        }),
    )
    .await;
    assert_eq!(status, 201, "{body}");
    body
}

/// Parses a string-encoded amount field.
pub fn amount(value: &serde_json::Value) -> u128 {
    let Some(s) = value.as_str() else {
        panic!("amount field is not a string: {value}");
    };
    let Ok(n) = s.parse() else {
        panic!("amount field is not a u128: {s}");
    };
    n
}
