//! Configuration management
//!
//! One explicit struct carrying every recognised option, resolved once at
//! startup from CLI flags and environment variables. `--kovan` switches the
//! whole environment: the `KOVAN_*` variable set, the static YAML pool
//! universe, the testnet chain id and a coarser optimiser step.
//!
//! Author: AI-Generated
//! Created: 2026-07-12

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{address, Address, B256};
use clap::ValueEnum;

use crate::error::BotError;
use crate::types::Token;

/// Gas units one printer execution is budgeted at. Calibrated against the
/// deployed contract; all profitability math uses this constant.
pub const ESTIMATE_GAS_EXECUTION: u64 = 500_000;

/// Gas limit placed on the signed transaction (headroom over the budget).
pub const TX_GAS_LIMIT: u64 = 800_000;

/// Blocks between pool-universe reloads (FRESH/WATCH), roughly 40 minutes.
pub const POOL_RELOAD_BLOCKS: u64 = 200;

/// Blocks between liveness pings to the errors webhook.
pub const HEARTBEAT_BLOCKS: u64 = 200;

/// Per-call RPC deadline. A timeout surfaces as SimulationFailed for the
/// path being evaluated, never as a cycle abort.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval of the new-block wait loop.
pub const BLOCK_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Mainnet Uniswap V2 / SushiSwap routers (env-overridable).
const UNISWAP_V2_ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
const SUSHISWAP_ROUTER: Address = address!("d9e1cE17f2641f24aE83637ab66a2cca9C378B9F");

/// Default XOR mask for addresses in printer calldata. Must match the
/// deployed contract; override with MASK_ADDRESS.
const DEFAULT_MASK: Address = address!("5afe5afe5afe5afe5afe5afe5afe5afe5afe5afe");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Kovan,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Kovan => 42,
        }
    }

    pub fn etherscan_tx_base(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://etherscan.io/tx/",
            Network::Kovan => "https://kovan.etherscan.io/tx/",
        }
    }
}

/// Block tag simulator reads are pinned against. `Latest` pins every view
/// call of a cycle to the cycle's block number; `Pending` reads the node's
/// pending state instead (quotes may shift inside a cycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinceBlock {
    Latest,
    Pending,
}

/// CLI surface shared by every strategy binary.
#[derive(Debug, Clone, clap::Args)]
pub struct CommonArgs {
    /// Point to the Kovan test network
    #[arg(long)]
    pub kovan: bool,

    /// Display debug logs
    #[arg(long)]
    pub debug: bool,

    /// Activate sending transactions on-chain
    #[arg(long)]
    pub send_tx: bool,

    /// Max amount to trade with, in WETH
    #[arg(long, default_value_t = 6.0)]
    pub max_amount: f64,

    /// Min amount to trade with, in WETH
    #[arg(long, default_value_t = 3.0)]
    pub min_amount: f64,

    /// Minimum pool liquidity (USD) for the subgraph filters
    #[arg(long, default_value_t = 30_000)]
    pub min_liquidity: u64,

    /// Maximum pool liquidity (USD) for the subgraph filters
    #[arg(long, default_value_t = 500_000)]
    pub max_liquidity: u64,

    /// Gas price multiplier applied to the node's quote
    #[arg(long, default_value_t = 1.5)]
    pub gas_multiplier: f64,

    /// Max number of blocks the transaction is allowed to go through in
    #[arg(long, default_value_t = 3)]
    pub max_block: u64,

    /// Block tag for simulator reads (latest|pending)
    #[arg(long, value_enum, default_value_t = SinceBlock::Latest)]
    pub since: SinceBlock,

    /// Only keep pools whose tokens are all in this list (i.e. XIOT,XAMP,UNI)
    #[arg(long, value_delimiter = ',')]
    pub only_tokens: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SlackWebhooks {
    pub errors: String,
    pub printing_tx: String,
    pub opportunities: String,
    pub snipe: String,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub agent_numbers: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,
    pub debug: bool,
    pub send_tx: bool,
    pub chain_id: u64,

    // Node endpoints
    pub ws_uri: String,
    pub http_uri: String,

    // Accounts and contracts
    pub executor_address: Address,
    pub signer_key: B256,
    pub weth_address: Address,
    pub printer_address: Address,
    pub mask_address: Address,
    pub uniswap_router: Address,
    pub sushiswap_router: Address,
    pub etherscan_api_key: String,

    // Sinks
    pub slack: SlackWebhooks,
    pub twilio: Option<TwilioConfig>,

    // Trading parameters
    pub min_amount: f64,
    pub max_amount: f64,
    pub incremental_step: f64,
    pub min_liquidity: u64,
    pub max_liquidity: u64,
    pub gas_multiplier: f64,
    pub max_block: u64,
    pub since: SinceBlock,
    pub only_tokens: Option<Vec<String>>,

    // Core constants (env-overridable where it matters per deployment)
    pub max_depth: usize,
    pub gas_units: u64,
    pub safety_margin_weth: f64,
    pub min_executor_balance_weth: f64,
    pub eval_concurrency: usize,
    pub gas_floor_gwei: u64,

    // Pool universe files
    pub tokens_yaml: PathBuf,
    pub pools_yaml: PathBuf,
    pub blacklist_yaml: PathBuf,
    pub snipers_yaml: PathBuf,
}

impl Config {
    pub fn load(args: &CommonArgs) -> Result<Self, BotError> {
        dotenv::dotenv().ok();

        let network = if args.kovan {
            Network::Kovan
        } else {
            Network::Mainnet
        };

        let slack = SlackWebhooks {
            errors: required(network, "SLACK_ERRORS_WEBHOOK")?,
            printing_tx: required(network, "SLACK_PRINTING_TX_WEBHOOK")?,
            opportunities: required(network, "SLACK_ARBITRAGE_OPPORTUNITIES_WEBHOOK")?,
            snipe: required(network, "SLACK_SNIPE_WEBHOOK")?,
        };

        let twilio = match (
            optional(network, "TWILIO_ACCOUNT_SID"),
            optional(network, "TWILIO_AUTH_TOKEN"),
            optional(network, "TWILIO_FROM_NUMBER"),
            optional(network, "AGENT_PHONE_NUMBERS"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number), Some(numbers)) => {
                Some(TwilioConfig {
                    account_sid,
                    auth_token,
                    from_number,
                    agent_numbers: numbers.split(',').map(|n| n.trim().to_string()).collect(),
                })
            }
            _ => None,
        };

        let pools_dir = if args.kovan { "pools/kovan" } else { "pools" };

        let only_tokens = if args.only_tokens.is_empty()
            || args.only_tokens.iter().any(|t| t == "all")
        {
            None
        } else {
            Some(args.only_tokens.clone())
        };

        Ok(Config {
            network,
            debug: args.debug,
            send_tx: args.send_tx,
            chain_id: network.chain_id(),
            ws_uri: required(network, "ETHEREUM_WS_URI")?,
            http_uri: required(network, "ETHEREUM_HTTP_URI")?,
            executor_address: parse_address(&required(network, "EXECUTOR_ADDRESS")?)?,
            signer_key: parse_key(&required(network, "MY_SOCKS")?)?,
            weth_address: parse_address(&required(network, "WETH_ADDRESS")?)?,
            printer_address: parse_address(&required(network, "PRINTER_ADDRESS")?)?,
            mask_address: optional(network, "MASK_ADDRESS")
                .map(|s| parse_address(&s))
                .transpose()?
                .unwrap_or(DEFAULT_MASK),
            uniswap_router: optional(network, "UNISWAP_ROUTER_ADDRESS")
                .map(|s| parse_address(&s))
                .transpose()?
                .unwrap_or(UNISWAP_V2_ROUTER),
            sushiswap_router: optional(network, "SUSHISWAP_ROUTER_ADDRESS")
                .map(|s| parse_address(&s))
                .transpose()?
                .unwrap_or(SUSHISWAP_ROUTER),
            etherscan_api_key: required(network, "ETHERSCAN_API_KEY")?,
            slack,
            twilio,
            min_amount: args.min_amount,
            max_amount: args.max_amount,
            // Kovan liquidity is thin; a coarse sweep converges in two or
            // three probes instead of thirty.
            incremental_step: if args.kovan { 1.0 } else { 0.1 },
            min_liquidity: args.min_liquidity,
            max_liquidity: args.max_liquidity,
            gas_multiplier: args.gas_multiplier,
            max_block: args.max_block,
            since: args.since,
            only_tokens,
            max_depth: env_usize("MAX_STEP_SUPPORTED", 3),
            gas_units: env_u64("ESTIMATE_GAS_EXECUTION", ESTIMATE_GAS_EXECUTION),
            safety_margin_weth: 0.05,
            min_executor_balance_weth: 2.0,
            eval_concurrency: env_usize("EVAL_CONCURRENCY", 8),
            gas_floor_gwei: env_u64("GAS_FLOOR_GWEI", 121),
            tokens_yaml: PathBuf::from(format!("{pools_dir}/tokens.yaml")),
            pools_yaml: PathBuf::from(format!("{pools_dir}/pools.yaml")),
            blacklist_yaml: PathBuf::from("pools/blacklist.yaml"),
            snipers_yaml: PathBuf::from("pools/snipers.yaml"),
        })
    }

    pub fn is_kovan(&self) -> bool {
        self.network == Network::Kovan
    }

    /// The reference asset every cycle starts and ends in.
    pub fn weth_token(&self) -> Arc<Token> {
        Arc::new(Token::new("WETH", self.weth_address, 18))
    }

    pub fn etherscan_tx_url(&self, tx_hash: B256) -> String {
        format!("{}{tx_hash}", self.network.etherscan_tx_base())
    }
}

/// Resolve `name`, preferring `KOVAN_<name>` on the test network.
fn required(network: Network, name: &str) -> Result<String, BotError> {
    if network == Network::Kovan {
        if let Ok(v) = std::env::var(format!("KOVAN_{name}")) {
            return Ok(v);
        }
    }
    std::env::var(name).map_err(|_| BotError::ConfigMissing(name.to_string()))
}

fn optional(network: Network, name: &str) -> Option<String> {
    required(network, name).ok()
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_address(s: &str) -> Result<Address, BotError> {
    s.trim()
        .parse()
        .map_err(|_| BotError::Validation(format!("invalid address: {s}")))
}

fn parse_key(s: &str) -> Result<B256, BotError> {
    s.trim()
        .trim_start_matches("0x")
        .parse()
        .map_err(|_| BotError::Validation("invalid signer key".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_chain_ids() {
        assert_eq!(Network::Mainnet.chain_id(), 1);
        assert_eq!(Network::Kovan.chain_id(), 42);
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D").is_ok());
    }

    #[test]
    fn test_etherscan_base_by_network() {
        assert!(Network::Kovan.etherscan_tx_base().contains("kovan"));
        assert!(!Network::Mainnet.etherscan_tx_base().contains("kovan"));
    }
}
