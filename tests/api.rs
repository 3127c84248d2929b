//! REST API integration tests.

#![allow(clippy::panic)]

mod common;

use common::{ALICE, BOB, E18, POOL, amount, approve, get, initialize, post, spawn_server};
use serde_json::json;

#[tokio::test]
async fn health_reports_healthy() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    let (status, body) = get(&client, &server.url("/health")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn fresh_pool_is_empty() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    let (status, body) = get(&client, &server.url("/api/v1/pool")).await;
    assert_eq!(status, 200);
    assert_eq!(body["initialized"], false);
    assert_eq!(body["reserve_base"], "0");
    assert_eq!(body["total_shares"], "0");
    assert_eq!(body["fee_numerator"], 997);
    assert_eq!(body["fee_denominator"], 1000);
    assert_eq!(body["pool_address"], POOL);
}

#[tokio::test]
async fn initialize_mints_geometric_mean_shares() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    let body = initialize(&server, &client).await;

    // sqrt(1000e18 * 10e18) = 100e18
    assert_eq!(amount(&body["shares_minted"]), 100 * E18);

    let (_, pool) = get(&client, &server.url("/api/v1/pool")).await;
    assert_eq!(pool["initialized"], true);
    assert_eq!(amount(&pool["reserve_token"]), 1_000 * E18);
    assert_eq!(amount(&pool["reserve_base"]), 10 * E18);
    assert_eq!(pool["provider_count"], 1);

    let (_, account) = get(&client, &server.url(&format!("/api/v1/accounts/{ALICE}"))).await;
    assert_eq!(amount(&account["token_balance"]), 999_000 * E18);
    assert_eq!(amount(&account["base_balance"]), 9_990 * E18);
    assert_eq!(amount(&account["pool_allowance"]), 0);
    assert_eq!(amount(&account["shares"]), 100 * E18);

    let (_, custody) = get(&client, &server.url(&format!("/api/v1/accounts/{POOL}"))).await;
    assert_eq!(amount(&custody["token_balance"]), 1_000 * E18);
    assert_eq!(amount(&custody["base_balance"]), 10 * E18);
}

#[tokio::test]
async fn second_initialize_conflicts() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    initialize(&server, &client).await;
    approve(&server, &client, ALICE, E18).await;

    let (status, body) = post(
        &client,
        &server.url("/api/v1/pool/initialize"),
        json!({ "caller": ALICE, "token_amount": E18.to_string(), "base_amount": E18.to_string() }),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], 2001);
}

#[tokio::test]
async fn operations_before_initialize_rejected() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, body) = post(
        &client,
        &server.url("/api/v1/swap/base-for-token"),
        json!({ "caller": ALICE, "amount_in": E18.to_string() }),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], 2002);

    let (status, body) = post(
        &client,
        &server.url("/api/v1/pool/deposit"),
        json!({ "caller": ALICE, "base_amount": E18.to_string() }),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], 2002);
}

#[tokio::test]
async fn swap_matches_quote_and_moves_reserves() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    initialize(&server, &client).await;

    let (status, quote) = post(
        &client,
        &server.url("/api/v1/quote/swap"),
        json!({ "direction": "base_for_token", "amount_in": E18.to_string() }),
    )
    .await;
    assert_eq!(status, 200, "{quote}");

    let (status, swap) = post(
        &client,
        &server.url("/api/v1/swap/base-for-token"),
        json!({ "caller": ALICE, "amount_in": E18.to_string() }),
    )
    .await;
    assert_eq!(status, 200, "{swap}");
    assert_eq!(swap["amount_out"], quote["amount_out"]);
    assert_eq!(swap["direction"], "base_for_token");

    // floor(997e18 * 1000e18 / (10e18 * 1000 + 997e18))
    let out = amount(&swap["amount_out"]);
    assert_eq!(out, 90_661_089_388_014_913_158);

    let (_, pool) = get(&client, &server.url("/api/v1/pool")).await;
    assert_eq!(amount(&pool["reserve_base"]), 11 * E18);
    assert_eq!(amount(&pool["reserve_token"]), 1_000 * E18 - out);
    assert_eq!(pool["swap_count"], 1);
    assert_eq!(amount(&pool["base_volume"]), E18);
}

#[tokio::test]
async fn token_for_base_requires_allowance() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    initialize(&server, &client).await;
    let (_, before) = get(&client, &server.url("/api/v1/pool")).await;

    let (status, body) = post(
        &client,
        &server.url("/api/v1/swap/token-for-base"),
        json!({ "caller": ALICE, "amount_in": (10 * E18).to_string() }),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["code"], 4003);
    assert_eq!(body["error"]["details"], "insufficient_allowance");

    let (_, after) = get(&client, &server.url("/api/v1/pool")).await;
    assert_eq!(before["reserve_base"], after["reserve_base"]);
    assert_eq!(before["reserve_token"], after["reserve_token"]);
    assert_eq!(after["swap_count"], 0);

    approve(&server, &client, ALICE, 10 * E18).await;
    let (status, body) = post(
        &client,
        &server.url("/api/v1/swap/token-for-base"),
        json!({ "caller": ALICE, "amount_in": (10 * E18).to_string() }),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert!(amount(&body["amount_out"]) > 0);
}

#[tokio::test]
async fn deposit_then_withdraw_everything() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    initialize(&server, &client).await;

    // fund BOB and let him provide at the 100:1 ratio
    for (asset, units) in [("token", 500 * E18), ("base", 5 * E18)] {
        let (status, _) = post(
            &client,
            &server.url("/api/v1/accounts/transfer"),
            json!({ "from": ALICE, "to": BOB, "asset": asset, "amount": units.to_string() }),
        )
        .await;
        assert_eq!(status, 200);
    }
    approve(&server, &client, BOB, 500 * E18).await;

    let (status, quote) = post(
        &client,
        &server.url("/api/v1/quote/deposit"),
        json!({ "base_amount": (2 * E18).to_string() }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(amount(&quote["token_in"]), 200 * E18);
    assert_eq!(amount(&quote["shares_minted"]), 20 * E18);

    let (status, deposit) = post(
        &client,
        &server.url("/api/v1/pool/deposit"),
        json!({ "caller": BOB, "base_amount": (2 * E18).to_string() }),
    )
    .await;
    assert_eq!(status, 200, "{deposit}");
    assert_eq!(deposit["token_in"], quote["token_in"]);
    assert_eq!(deposit["shares_minted"], quote["shares_minted"]);

    let (_, shares) = get(&client, &server.url(&format!("/api/v1/pool/shares/{BOB}"))).await;
    assert_eq!(amount(&shares["shares"]), 20 * E18);
    assert_eq!(amount(&shares["total_shares"]), 120 * E18);

    let (status, body) = post(
        &client,
        &server.url("/api/v1/pool/withdraw"),
        json!({ "caller": BOB, "shares": (21 * E18).to_string() }),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["code"], 4001);

    let (status, withdraw) = post(
        &client,
        &server.url("/api/v1/pool/withdraw"),
        json!({ "caller": BOB, "shares": (20 * E18).to_string() }),
    )
    .await;
    assert_eq!(status, 200, "{withdraw}");
    assert_eq!(amount(&withdraw["base_out"]), 2 * E18);
    assert_eq!(amount(&withdraw["token_out"]), 200 * E18);

    let (_, account) = get(&client, &server.url(&format!("/api/v1/accounts/{BOB}"))).await;
    assert_eq!(amount(&account["token_balance"]), 500 * E18);
    assert_eq!(amount(&account["base_balance"]), 5 * E18);
    assert_eq!(amount(&account["shares"]), 0);
}

#[tokio::test]
async fn malformed_input_is_bad_request() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, body) = post(
        &client,
        &server.url("/api/v1/pool/deposit"),
        json!({ "caller": "0x1234", "base_amount": "1" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);

    let (status, body) = post(
        &client,
        &server.url("/api/v1/quote/swap"),
        json!({ "direction": "base_for_token", "amount_in": "1.5" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);

    let (status, body) = get(&client, &server.url("/api/v1/pool/shares/nope")).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn zero_amounts_rejected() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    initialize(&server, &client).await;

    let (status, body) = post(
        &client,
        &server.url("/api/v1/swap/base-for-token"),
        json!({ "caller": ALICE, "amount_in": "0" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1002);

    let (status, body) = post(
        &client,
        &server.url("/api/v1/pool/withdraw"),
        json!({ "caller": ALICE, "shares": "0" }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1002);
}

#[tokio::test]
async fn transfer_touching_custody_rejected() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();
    initialize(&server, &client).await;

    let (status, body) = post(
        &client,
        &server.url("/api/v1/accounts/transfer"),
        json!({ "from": POOL, "to": BOB, "asset": "base", "amount": E18.to_string() }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);

    let (status, body) = post(
        &client,
        &server.url("/api/v1/accounts/transfer"),
        json!({ "from": ALICE, "to": POOL, "asset": "token", "amount": E18.to_string() }),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);
    let (_, custody) = get(&client, &server.url(&format!("/api/v1/accounts/{POOL}"))).await;
    assert_eq!(amount(&custody["token_balance"]), 1_000 * E18);

    let (status, body) = post(
        &client,
        &server.url("/api/v1/accounts/transfer"),
        json!({ "from": BOB, "to": ALICE, "asset": "token", "amount": E18.to_string() }),
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(body["error"]["details"], "insufficient_balance");
}
