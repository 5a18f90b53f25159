//! Tests for the rebalancing routines and the dispatcher
//!
//! Each pool runs on its own wiremock server. Submitted transactions are
//! matched by the function selector inside the raw transaction.

use bridge_functions::dispatch::{self, Routine};
use bridge_functions::{FunctionError, Secrets};
use chain_clients_evm::abi;
use chain_clients_evm::U256;
use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::MockServer;

mod helpers;
use helpers::{
    build_config, call_result, contract_call, rpc_error, rpc_method, rpc_result, signer_secrets,
    TestChain, CHILD_A_SELECTOR, CHILD_B_SELECTOR, DUMMY_HOST_CHAIN_ID, DUMMY_TX_HASH,
    FAST_SETTINGS, HUB_SELECTOR,
};

const JOINING_SELECTOR: u64 = 6433500567565415381;

fn selector_hex(signature: &str) -> String {
    hex::encode(abi::function_selector(signature))
}

async fn mount_pool(server: &MockServer, balance: u64, loans: u64) {
    contract_call("balanceOf(address)")
        .respond_with(call_result(&abi::word_u256(U256::from(balance))))
        .mount(server)
        .await;
    contract_call("s_loansInUse()")
        .respond_with(call_result(&abi::word_u256(U256::from(loans))))
        .mount(server)
        .await;
    rpc_method("eth_getTransactionCount")
        .respond_with(rpc_result(json!("0x0")))
        .mount(server)
        .await;
    rpc_method("eth_gasPrice")
        .respond_with(rpc_result(json!("0x3b9aca00")))
        .mount(server)
        .await;
}

async fn expect_submissions(server: &MockServer, signature: &str, times: u64) {
    rpc_method("eth_sendRawTransaction")
        .and(body_string_contains(selector_hex(signature)))
        .respond_with(rpc_result(json!(DUMMY_TX_HASH)))
        .expect(times)
        .mount(server)
        .await;
}

fn redistribute_args(distribution_type: u8, host_chain_id: u64) -> Vec<Vec<u8>> {
    Routine::RedistributeLiquidity.invocation_args(vec![
        JOINING_SELECTOR.to_be_bytes().to_vec(),
        vec![0x5e; 32],
        vec![distribution_type],
        host_chain_id.to_be_bytes().to_vec(),
    ])
}

fn success() -> Vec<u8> {
    abi::word_u256(U256::one()).to_vec()
}

// ============================================================================
// REDISTRIBUTE LIQUIDITY
// ============================================================================

/// What is tested: pools above the new target fund the joining pool, others stay untouched
/// Why: Balances 100/200/300 with one joining pool give a target of 150 per pool
#[tokio::test]
async fn test_redistribute_funds_joining_pool() {
    let hub = MockServer::start().await;
    let child_a = MockServer::start().await;
    let child_b = MockServer::start().await;

    mount_pool(&hub, 100, 0).await;
    mount_pool(&child_a, 150, 50).await;
    mount_pool(&child_b, 300, 0).await;
    expect_submissions(&hub, "distributeLiquidity(uint64,uint256,bytes32)", 0).await;
    expect_submissions(&child_a, "distributeLiquidity(uint64,uint256,bytes32)", 1).await;
    expect_submissions(&child_b, "distributeLiquidity(uint64,uint256,bytes32)", 1).await;

    let config = build_config(
        FAST_SETTINGS,
        &[
            TestChain::pool("hub", HUB_SELECTOR, hub.uri()),
            TestChain::pool("child-a", CHILD_A_SELECTOR, child_a.uri()),
            TestChain::pool("child-b", CHILD_B_SELECTOR, child_b.uri()),
        ],
    );

    let args = redistribute_args(0, DUMMY_HOST_CHAIN_ID);

    let result = dispatch::execute(&config, &signer_secrets(), &args).await.unwrap();

    assert_eq!(result, success());
}

/// What is tested: a race rejection before the broadcast still lets the routine succeed
/// Why: Another run that already funded the joining pool may leave the node
/// rejecting this run at any step of the submission
#[tokio::test]
async fn test_redistribute_race_before_broadcast_is_success() {
    let hub = MockServer::start().await;
    let child_a = MockServer::start().await;
    let child_b = MockServer::start().await;

    // Mounted first so it wins over the nonce mock of mount_pool
    rpc_method("eth_getTransactionCount")
        .respond_with(rpc_error(-32000, "nonce too low"))
        .expect(1)
        .mount(&child_b)
        .await;
    mount_pool(&hub, 100, 0).await;
    mount_pool(&child_a, 200, 0).await;
    mount_pool(&child_b, 300, 0).await;
    expect_submissions(&child_a, "distributeLiquidity(uint64,uint256,bytes32)", 1).await;
    expect_submissions(&child_b, "distributeLiquidity(uint64,uint256,bytes32)", 0).await;

    let config = build_config(
        FAST_SETTINGS,
        &[
            TestChain::pool("hub", HUB_SELECTOR, hub.uri()),
            TestChain::pool("child-a", CHILD_A_SELECTOR, child_a.uri()),
            TestChain::pool("child-b", CHILD_B_SELECTOR, child_b.uri()),
        ],
    );
    let args = redistribute_args(0, DUMMY_HOST_CHAIN_ID);

    let result = dispatch::execute(&config, &signer_secrets(), &args).await.unwrap();

    assert_eq!(result, success());
}

/// What is tested: liquidate-and-exit is rejected before any chain is contacted
/// Why: Only the join distribution is implemented
#[tokio::test]
async fn test_liquidate_and_exit_unsupported() {
    let hub = MockServer::start().await;
    rpc_method("eth_call")
        .respond_with(rpc_result(json!("0x")))
        .expect(0)
        .mount(&hub)
        .await;

    let config = build_config(FAST_SETTINGS, &[TestChain::pool("hub", HUB_SELECTOR, hub.uri())]);

    let args = redistribute_args(1, DUMMY_HOST_CHAIN_ID);

    let err = dispatch::execute(&config, &signer_secrets(), &args).await.unwrap_err();

    assert!(matches!(err, FunctionError::Unsupported(_)));
}

/// What is tested: a host chain id without a configured network is rejected
/// Why: The host chain id selects between testnet and mainnet deployments
#[tokio::test]
async fn test_wrong_host_chain_id() {
    let config = build_config(
        FAST_SETTINGS,
        &[TestChain::pool("hub", HUB_SELECTOR, "http://127.0.0.1:1".to_string())],
    );

    let err = dispatch::run(&config, &signer_secrets(), &redistribute_args(0, 1))
        .await
        .unwrap_err();

    assert_eq!(err, "Wrong chain id 1");
}

/// What is tested: a missing pool messenger key fails before any transaction is built
/// Why: Submissions cannot be signed without it
#[tokio::test]
async fn test_missing_signer_key() {
    let config = build_config(
        FAST_SETTINGS,
        &[TestChain::pool("hub", HUB_SELECTOR, "http://127.0.0.1:1".to_string())],
    );

    let args = redistribute_args(0, DUMMY_HOST_CHAIN_ID);

    let err = dispatch::execute(&config, &Secrets::default(), &args).await.unwrap_err();

    assert!(matches!(err, FunctionError::NotFound(_)));
    assert_eq!(err.to_string(), "Secret POOL_MESSENGER_0_PRIVATE_KEY is not set");
}

// ============================================================================
// COLLECT WITHDRAWAL LIQUIDITY
// ============================================================================

/// What is tested: every child pool, and not the hub, is asked to send liquidity to the hub
/// Why: Withdrawals are paid out on the hub from all child pools
#[tokio::test]
async fn test_collect_withdrawal_fans_out_to_children() {
    let hub = MockServer::start().await;
    let child_a = MockServer::start().await;
    let child_b = MockServer::start().await;

    for server in [&hub, &child_a, &child_b] {
        mount_pool(server, 0, 0).await;
    }
    expect_submissions(&hub, "ccipSendToPool(uint64,uint256,bytes32)", 0).await;
    expect_submissions(&child_a, "ccipSendToPool(uint64,uint256,bytes32)", 1).await;
    expect_submissions(&child_b, "ccipSendToPool(uint64,uint256,bytes32)", 1).await;

    let config = build_config(
        FAST_SETTINGS,
        &[
            TestChain::pool("hub", HUB_SELECTOR, hub.uri()),
            TestChain::pool("child-a", CHILD_A_SELECTOR, child_a.uri()),
            TestChain::pool("child-b", CHILD_B_SELECTOR, child_b.uri()),
            TestChain::verification_only(
                "source",
                JOINING_SELECTOR,
                "http://127.0.0.1:1".to_string(),
            ),
        ],
    );
    let args = Routine::CollectWithdrawalLiquidity.invocation_args(vec![
        abi::word_u256(U256::from(1_000_000u64)).to_vec(),
        vec![0x3d; 32],
    ]);

    let result = dispatch::execute(&config, &signer_secrets(), &args).await.unwrap();

    assert_eq!(result, success());
}

/// What is tested: running the same withdrawal collection twice succeeds both times
/// Why: The host may re-run a request; the second broadcast of each pool is
/// rejected as "already known" and must not fail the routine
#[tokio::test]
async fn test_collect_withdrawal_is_idempotent() {
    let hub = MockServer::start().await;
    let child_a = MockServer::start().await;
    let child_b = MockServer::start().await;

    mount_pool(&hub, 0, 0).await;
    for server in [&child_a, &child_b] {
        mount_pool(server, 0, 0).await;
        rpc_method("eth_sendRawTransaction")
            .respond_with(rpc_result(json!(DUMMY_TX_HASH)))
            .up_to_n_times(1)
            .expect(1)
            .mount(server)
            .await;
        rpc_method("eth_sendRawTransaction")
            .respond_with(rpc_error(-32000, "already known"))
            .expect(1)
            .mount(server)
            .await;
    }

    let config = build_config(
        FAST_SETTINGS,
        &[
            TestChain::pool("hub", HUB_SELECTOR, hub.uri()),
            TestChain::pool("child-a", CHILD_A_SELECTOR, child_a.uri()),
            TestChain::pool("child-b", CHILD_B_SELECTOR, child_b.uri()),
        ],
    );
    let args = Routine::CollectWithdrawalLiquidity.invocation_args(vec![
        abi::word_u256(U256::from(500u64)).to_vec(),
        vec![0x4e; 32],
    ]);

    let first = dispatch::execute(&config, &signer_secrets(), &args).await.unwrap();
    let second = dispatch::execute(&config, &signer_secrets(), &args).await.unwrap();

    assert_eq!(first, success());
    assert_eq!(second, success());
}

// ============================================================================
// DISPATCHER
// ============================================================================

/// What is tested: a routine digest that does not match this build is rejected
/// Why: The caller must be pinned to the deployed routine code
#[tokio::test]
async fn test_digest_mismatch() {
    let config = build_config(
        FAST_SETTINGS,
        &[TestChain::pool("hub", HUB_SELECTOR, "http://127.0.0.1:1".to_string())],
    );
    let mut args = Routine::TotalBalance.invocation_args(Vec::new());
    args[0] = vec![0u8; 32];

    let err = dispatch::execute(&config, &Secrets::default(), &args).await.unwrap_err();

    assert!(matches!(err, FunctionError::Integrity(_)));
    assert!(err.to_string().contains(" != 0x"));
}

/// What is tested: an unknown routine id is rejected with a truncated host message
/// Why: Only the four routines may be dispatched
#[tokio::test]
async fn test_unknown_routine() {
    let config = build_config(
        FAST_SETTINGS,
        &[TestChain::pool("hub", HUB_SELECTOR, "http://127.0.0.1:1".to_string())],
    );
    let args = vec![vec![0u8; 32], vec![9], Vec::new()];

    let err = dispatch::run(&config, &Secrets::default(), &args).await.unwrap_err();

    assert_eq!(err, "Unknown routine 9");
}
