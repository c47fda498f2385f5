use alloy::primitives::utils::parse_units;
use alloy::primitives::{address, Address};
use rand::seq::SliceRandom;
use rust_decimal::Decimal;
use std::env;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{BotError, Result};

/// Immutable description of the connected chain.
#[derive(Debug, Clone)]
pub struct NetworkProfile {
    pub name: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub symbol: String,
    pub explorer: String,
}

impl NetworkProfile {
    pub fn rise_testnet() -> Self {
        Self {
            name: "Rise Testnet".to_string(),
            rpc_url: "https://testnet.riselabs.xyz/".to_string(),
            chain_id: 11155931,
            symbol: "ETH".to_string(),
            explorer: "https://explorer.testnet.riselabs.xyz/".to_string(),
        }
    }

    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer.trim_end_matches('/'), hash)
    }
}

/// An ERC-20 style token with the fixed precision used for amount conversion.
#[derive(Debug, Clone)]
pub struct Token {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

/// Network-specific contract addresses. They must match the connected chain or
/// calls fail on chain.
#[derive(Debug, Clone)]
pub struct ContractRegistry {
    pub gateway: Address,
    pub lending_pool: Address,
    pub wrapped: Token,
    pub stable: Token,
    pub router: Address,
    pub mix_adapter: Address,
    pub mix_pair: Address,
}

impl ContractRegistry {
    pub fn rise_testnet() -> Self {
        Self {
            gateway: address!("832e537e88d0e8e5bb4efb735f521a9a0e085e0a"),
            lending_pool: address!("81edb206Fd1FB9dC517B61793AaA0325c8d11A23"),
            wrapped: Token {
                symbol: "WETH".to_string(),
                address: address!("4200000000000000000000000000000000000006"),
                decimals: 18,
            },
            stable: Token {
                symbol: "USDC".to_string(),
                address: address!("8A93d247134d91e0de6f96547cB0204e5BE8e5D8"),
                decimals: 6,
            },
            router: address!("8c6DbF95448AcbcBb1c3D6E9b3b9ceF7E6fbAb00"),
            mix_adapter: address!("0f9053E174c123098C17e60A2B1FAb3b303f9e29"),
            mix_pair: address!("c7E2B7C2519bB911bA4a1eeE246Cb05ACb0b1df1"),
        }
    }
}

/// EIP-1559 fee overrides applied to every state-changing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
}

impl FeePolicy {
    pub fn from_gwei(priority: &str, max: &str) -> Result<Self> {
        Ok(Self {
            max_priority_fee_per_gas: gwei_to_wei(priority)?,
            max_fee_per_gas: gwei_to_wei(max)?,
        })
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        // 1.5 gwei and 1.500000008 gwei
        Self {
            max_priority_fee_per_gas: 1_500_000_000,
            max_fee_per_gas: 1_500_000_008,
        }
    }
}

fn gwei_to_wei(value: &str) -> Result<u128> {
    if value.trim().starts_with('-') {
        return Err(BotError::Config(format!("fee must not be negative: {value}")));
    }
    let parsed = parse_units(value.trim(), "gwei")
        .map_err(|e| BotError::Config(format!("invalid gwei value {value:?}: {e}")))?;
    u128::try_from(parsed.get_absolute())
        .map_err(|_| BotError::Config(format!("fee out of range: {value}")))
}

/// Fixed gas limits per action kind, used both for the estimate and the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasLimits {
    pub transfer: u64,
    pub gateway: u64,
    pub wrap: u64,
    pub approve: u64,
    pub swap: u64,
}

impl Default for GasLimits {
    fn default() -> Self {
        Self {
            transfer: 21_000,
            gateway: 310_079,
            wrap: 95_312,
            approve: 100_000,
            swap: 300_000,
        }
    }
}

/// Static swap pricing. The rate is not read from chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapSettings {
    /// Stable-token units per one wrapped token.
    pub rate: Decimal,
    pub min_return_factor: Decimal,
    pub deadline_secs: u64,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            rate: Decimal::new(1_071_568, 3),
            min_return_factor: Decimal::new(968, 3),
            deadline_secs: 3600,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub network: NetworkProfile,
    pub contracts: ContractRegistry,
    pub fees: FeePolicy,
    pub gas: GasLimits,
    pub swap: SwapSettings,
    pub transfer_delay_ms: u64,
    pub proxy_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: NetworkProfile::rise_testnet(),
            contracts: ContractRegistry::rise_testnet(),
            fees: FeePolicy::default(),
            gas: GasLimits::default(),
            swap: SwapSettings::default(),
            transfer_delay_ms: 2000,
            proxy_file: "proxies.txt".to_string(),
        }
    }
}

impl Settings {
    /// Builds settings from the process environment on top of the Rise Testnet defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(rpc_url) = lookup("RPC_URL") {
            settings.network.rpc_url = rpc_url;
        }
        if let Some(proxy_file) = lookup("PROXY_FILE") {
            settings.proxy_file = proxy_file;
        }

        let priority = lookup("PRIORITY_FEE_GWEI");
        let max = lookup("MAX_FEE_GWEI");
        if priority.is_some() || max.is_some() {
            settings.fees = FeePolicy::from_gwei(
                priority.as_deref().unwrap_or("1.5"),
                max.as_deref().unwrap_or("1.500000008"),
            )?;
        }
        if settings.fees.max_priority_fee_per_gas > settings.fees.max_fee_per_gas {
            return Err(BotError::Config(
                "PRIORITY_FEE_GWEI must not exceed MAX_FEE_GWEI".to_string(),
            ));
        }

        let gas = &mut settings.gas;
        for (key, slot) in [
            ("GAS_LIMIT_TRANSFER", &mut gas.transfer),
            ("GAS_LIMIT_GATEWAY", &mut gas.gateway),
            ("GAS_LIMIT_WRAP", &mut gas.wrap),
            ("GAS_LIMIT_APPROVE", &mut gas.approve),
            ("GAS_LIMIT_SWAP", &mut gas.swap),
        ] {
            if let Some(raw) = lookup(key) {
                *slot = parse_positive::<u64>(key, &raw)?;
            }
        }

        if let Some(raw) = lookup("SWAP_RATE") {
            settings.swap.rate = parse_positive_decimal("SWAP_RATE", &raw)?;
        }
        if let Some(raw) = lookup("SWAP_MIN_RETURN_FACTOR") {
            let factor = parse_positive_decimal("SWAP_MIN_RETURN_FACTOR", &raw)?;
            if factor > Decimal::ONE {
                return Err(BotError::Config("SWAP_MIN_RETURN_FACTOR must be at most 1".to_string()));
            }
            settings.swap.min_return_factor = factor;
        }
        if let Some(raw) = lookup("TRANSFER_DELAY_MS") {
            settings.transfer_delay_ms = raw
                .trim()
                .parse()
                .map_err(|_| BotError::Config(format!("invalid TRANSFER_DELAY_MS: {raw}")))?;
        }

        debug!(fees = ?settings.fees, gas = ?settings.gas, rpc = %settings.network.rpc_url, "settings loaded");
        Ok(settings)
    }
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(BotError::Config(format!("invalid {key}: {raw}"))),
    }
}

fn parse_positive_decimal(key: &str, raw: &str) -> Result<Decimal> {
    match Decimal::from_str(raw.trim()) {
        Ok(value) if value > Decimal::ZERO => Ok(value),
        _ => Err(BotError::Config(format!("invalid {key}: {raw}"))),
    }
}

/// Reads the signing key. Its absence is the only fatal configuration error.
pub fn private_key_from_env() -> Result<String> {
    match env::var("PRIVATE_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(BotError::Config("PRIVATE_KEY not found in environment or .env file".to_string())),
    }
}

/// Loads proxies from a text file, one per line. A missing or empty file means
/// a direct connection.
pub fn load_proxies(path: impl AsRef<Path>) -> Vec<String> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no proxy list, connecting directly");
            return Vec::new();
        }
    };

    let proxies: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if proxies.is_empty() {
        warn!(path = %path.display(), "proxy list is empty, running without proxy");
    }
    proxies
}

/// Picks one proxy at random and normalizes it to a URL.
pub fn pick_proxy(proxies: &[String]) -> Option<String> {
    proxies.choose(&mut rand::thread_rng()).map(|p| normalize_proxy(p))
}

pub fn normalize_proxy(proxy: &str) -> String {
    if proxy.starts_with("http://") || proxy.starts_with("https://") {
        proxy.to_string()
    } else {
        format!("http://{proxy}")
    }
}
