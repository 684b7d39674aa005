use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::chain::types::AssetId;
use crate::chain::ChainClient;
use crate::crypto::{Keyring, DEFAULT_SUDO_SEED};
use crate::node::config::FileConfig;
use crate::node::{DevNode, DevNodeConfig, NODE_NAME};
use crate::runtime::RuntimeConfig;
use crate::suite::{SuiteConfig, TestParams, TestSuite};
use crate::sync::PriceSynchronizer;
use crate::utils::init_logging;

pub const DEFAULT_BLOCK_TIME_MS: u64 = 1000;

/// Load and consistency test for the distribution chain.
#[derive(Parser)]
#[clap(name = "distload", version)]
pub struct Cli {
    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Start an in-process dev node and run scenarios against it
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// number of client accounts in the first scenario
    #[clap(short = 'N', long, default_value_t = 10)]
    pub clients: usize,

    /// number of assets created per scenario
    #[clap(short = 'M', long, default_value_t = 20)]
    pub assets: usize,

    /// TOML file with [suite] and [devnode] overrides
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// dev seed of the privileged key
    #[clap(long, default_value = DEFAULT_SUDO_SEED)]
    pub sudo_seed: String,

    /// block authoring interval of the dev node
    #[clap(long)]
    pub block_time_ms: Option<u64>,

    /// stop after this many scenarios
    #[clap(long)]
    pub runs: Option<u32>,
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging("info");
    match cli.cmd {
        Cmd::Run(args) => run(args).await,
    }
}

/// Boot the dev node, run the loop, then tear down listener and node.
pub async fn run(args: RunArgs) -> Result<()> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let mut suite_cfg = file.suite;
    if args.runs.is_some() {
        suite_cfg.max_runs = args.runs;
    }

    let block_time = args.block_time_ms.or(file.devnode.block_time_ms).unwrap_or(DEFAULT_BLOCK_TIME_MS);
    let defaults = DevNodeConfig::default();
    let node_cfg = DevNodeConfig {
        block_time: Some(Duration::from_millis(block_time)),
        price_period: file.devnode.price_period.unwrap_or(defaults.price_period),
        sudo_seed: args.sudo_seed.clone(),
        runtime: RuntimeConfig {
            main_asset: AssetId::new(suite_cfg.main_asset.as_str()),
            stable_asset: AssetId::new(suite_cfg.stable_asset.as_str()),
            decimals: suite_cfg.decimals,
            ..RuntimeConfig::default()
        },
        ..defaults
    };

    let node = Arc::new(DevNode::new(node_cfg)?);
    let svc = node.start();
    let result = drive(node, &args, suite_cfg).await;
    svc.shutdown().await?;
    info!("Node stopped");
    result
}

async fn drive(node: Arc<DevNode>, args: &RunArgs, suite_cfg: SuiteConfig) -> Result<()> {
    let chain = node.chain_info().await?;
    if chain.node_name != NODE_NAME {
        bail!("unexpected node {}, expected {}", chain.node_name, NODE_NAME);
    }
    info!("Connected to {} {} on {}", chain.node_name, chain.node_version, chain.chain);

    let keyring = Arc::new(Keyring::new(Some(&args.sudo_seed))?);
    let sudo = node.sudo_key().await?;
    if sudo != keyring.sudo()?.account_id() {
        bail!("node sudo key {} does not match {}", sudo, args.sudo_seed);
    }

    let prices = PriceSynchronizer::new(AssetId::new(suite_cfg.stable_asset.as_str()));
    let listener = prices.observe(node.as_ref()).await?;
    let suite = TestSuite::new(node, keyring, prices, suite_cfg);
    let params = TestParams { clients: args.clients, assets: args.assets };

    let result = tokio::select! {
        r = suite.run_loop(params) => r.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    };
    let stopped = listener.stop().await;
    result?;
    stopped?;
    Ok(())
}
