//! Integration tests: run scenarios against the in-process dev node and check
//! the ledger is left clean.

use std::sync::Arc;
use std::time::Duration;

use crate::chain::types::AssetId;
use crate::chain::ChainClient;
use crate::crypto::{Keyring, DEFAULT_SUDO_SEED};
use crate::node::{DevNode, DevNodeConfig, ServiceHandle, STABLE_ASSET};
use crate::suite::{SuiteConfig, TestParams, TestSuite, Verdict};
use crate::sync::{PriceListener, PriceSynchronizer};
use crate::utils::LoadError;

struct Fixture {
    node: Arc<DevNode>,
    svc: ServiceHandle,
    listener: PriceListener,
    keyring: Arc<Keyring>,
    suite: TestSuite<DevNode>,
}

async fn setup(node_cfg: DevNodeConfig, config: SuiteConfig) -> Fixture {
    let node = Arc::new(DevNode::new(node_cfg).unwrap());
    let svc = node.start();
    let keyring = Arc::new(Keyring::new(Some(DEFAULT_SUDO_SEED)).unwrap());
    let prices = PriceSynchronizer::new(AssetId::new(STABLE_ASSET));
    let listener = prices.observe(node.as_ref()).await.unwrap();
    let suite = TestSuite::new(node.clone(), keyring.clone(), prices, config);
    Fixture { node, svc, listener, keyring, suite }
}

fn fast_node() -> DevNodeConfig {
    DevNodeConfig { block_time: Some(Duration::from_millis(50)), price_period: 10, ..Default::default() }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_iteration_predicts_balances_and_finish_cleans_up() {
    let config = SuiteConfig { iterations: 1, ..Default::default() };
    let eps = config.eps;
    let Fixture { node, svc, listener, suite, .. } = setup(fast_node(), config).await;

    let mut scenario = suite.init(TestParams { clients: 10, assets: 1 }).await.unwrap();
    assert_eq!(scenario.accounts.len(), 10);
    assert_eq!(scenario.assets, vec![AssetId::new("A")]);
    assert!(scenario.balances.values().all(|b| *b == 10_000_000_000_000));

    let before = scenario.balances.clone();
    let outcome = suite.iteration(&scenario).await.unwrap();
    assert!(outcome.good);
    assert_eq!(outcome.deltas.len(), 10);
    suite.check(&mut scenario, &outcome.deltas).await.unwrap();
    for (key, old) in &before {
        let expected = old + outcome.deltas[key];
        assert!(expected.abs_diff(scenario.balances[key]) < eps);
    }

    suite.finish(&scenario).await.unwrap();
    for acc in &scenario.accounts {
        let who = acc.account_id();
        for asset in &scenario.assets {
            assert_eq!(node.balance(&who, asset).await.unwrap(), 0);
            assert_eq!(node.deposit_of(&who, asset).await.unwrap(), 0);
        }
    }
    let remaining: Vec<AssetId> = node.assets().await.unwrap().into_iter().map(|(id, _)| id).collect();
    assert!(!remaining.contains(&AssetId::new("A")));

    listener.stop().await.unwrap();
    svc.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_loop_grows_clients_between_scenarios() {
    let config = SuiteConfig { iterations: 2, max_runs: Some(2), client_step: 2, ..Default::default() };
    let Fixture { svc, listener, keyring, suite, .. } = setup(fast_node(), config).await;

    let verdicts = suite.run_loop(TestParams { clients: 2, assets: 2 }).await.unwrap();
    assert_eq!(verdicts, vec![Verdict::Success, Verdict::Success]);

    // second scenario ran with 2 + 2 clients
    assert!(keyring.pair_by_name("#3").is_some());
    assert!(keyring.pair_by_name("#4").is_none());
    // sudo, then 2 fresh accounts, then 4 fresh accounts
    assert_eq!(suite.ops().submitter().nonces().len(), 1 + 2 + 4);

    listener.stop().await.unwrap();
    svc.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_loop_fails_when_every_iteration_is_late() {
    let node_cfg = DevNodeConfig { block_time: Some(Duration::from_millis(100)), price_period: 2, ..Default::default() };
    let config = SuiteConfig { iterations: 2, block_timeout_ms: 20, max_runs: Some(1), ..Default::default() };
    let Fixture { svc, listener, suite, .. } = setup(node_cfg, config).await;

    let res = suite.run_loop(TestParams { clients: 2, assets: 1 }).await;
    assert!(matches!(res, Err(LoadError::ScenarioFailed { clients: 2, assets: 1 })), "{:?}", res);

    listener.stop().await.unwrap();
    svc.shutdown().await.unwrap();
}
