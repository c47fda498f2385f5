pub mod chain_client;
pub mod contracts;

pub use chain_client::ChainClient;
pub use contracts::{ContractCall, Erc20, LendingGateway, SwapLeg, SwapRouter, WrappedNative};

use alloy::primitives::{Address, TxHash, U256};

use crate::config::FeePolicy;
use crate::error::Result;

/// Result of waiting for a submitted transaction to land in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inclusion {
    pub hash: TxHash,
    pub block_number: u64,
    pub success: bool,
}

/// Chain operations the workflows depend on.
///
/// Reads are pass-through and never retried; a failed read surfaces as an error.
#[allow(async_fn_in_trait)]
pub trait Chain {
    fn address(&self) -> Address;

    async fn block_number(&self) -> Result<u64>;

    async fn gas_price(&self) -> Result<u128>;

    async fn native_balance(&self, owner: Address) -> Result<U256>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;

    async fn token_decimals(&self, token: Address) -> Result<u8>;

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256>;

    /// Signs and broadcasts `call` with a fixed gas limit and fee policy,
    /// returning as soon as the node accepted it.
    async fn submit(&self, call: &ContractCall, gas_limit: u64, fees: &FeePolicy) -> Result<TxHash>;

    async fn wait_for_inclusion(&self, hash: TxHash) -> Result<Inclusion>;
}
