use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::client::RpcClient;
use alloy::transports::TransportError;
use alloy_network::{Ethereum, TransactionBuilder};
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{decode_revert_reason, Revert, SolError};
use alloy_transport_http::Http;
use eyre::Result;
use tracing::{debug, info};
use url::Url;

use super::contracts::{ContractCall, IERC20};
use super::{Chain, Inclusion};
use crate::config::FeePolicy;
use crate::error::{BotError, Result as BotResult};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Signing client for one wallet on one network, optionally routed through an
/// HTTP(S) proxy.
pub struct ChainClient {
    provider: DynProvider<Ethereum>,
    address: Address,
    chain_id: u64,
    proxy: Option<String>,
}

impl ChainClient {
    pub fn new(rpc_url: &str, private_key: &str, chain_id: u64, proxy: Option<String>) -> Result<Self> {
        let url = Url::parse(rpc_url)?;
        let wallet: PrivateKeySigner = private_key.parse()?;
        let address = wallet.address();

        let mut http = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(proxy_url) = proxy.as_deref() {
            http = http.proxy(reqwest::Proxy::all(proxy_url)?);
        }
        let transport = Http::with_client(http.build()?, url);
        let client = RpcClient::new(transport, false);

        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_client(client)
            .erased();

        debug!(%address, chain_id, proxy = proxy.as_deref().unwrap_or("none"), "chain client ready");
        Ok(Self {
            provider,
            address,
            chain_id,
            proxy,
        })
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Fixed gas and fee overrides. The nonce is left to the provider's nonce
    /// filler, which counts pending transactions.
    fn request(&self, call: &ContractCall, gas_limit: u64, fees: &FeePolicy) -> TransactionRequest {
        TransactionRequest::default()
            .with_to(call.to)
            .with_input(call.input.clone())
            .with_value(call.value)
            .with_gas_limit(gas_limit)
            .with_max_fee_per_gas(fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
            .with_chain_id(self.chain_id)
    }
}

impl Chain for ChainClient {
    fn address(&self) -> Address {
        self.address
    }

    async fn block_number(&self) -> BotResult<u64> {
        self.provider.get_block_number().await.map_err(classify)
    }

    async fn gas_price(&self) -> BotResult<u128> {
        self.provider.get_gas_price().await.map_err(classify)
    }

    async fn native_balance(&self, owner: Address) -> BotResult<U256> {
        self.provider.get_balance(owner).await.map_err(classify)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> BotResult<U256> {
        let contract = IERC20::new(token, &self.provider);
        contract.balanceOf(owner).call().await.map_err(contract_error)
    }

    async fn token_decimals(&self, token: Address) -> BotResult<u8> {
        let contract = IERC20::new(token, &self.provider);
        contract.decimals().call().await.map_err(contract_error)
    }

    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> BotResult<U256> {
        let contract = IERC20::new(token, &self.provider);
        contract.allowance(owner, spender).call().await.map_err(contract_error)
    }

    async fn submit(&self, call: &ContractCall, gas_limit: u64, fees: &FeePolicy) -> BotResult<TxHash> {
        let tx = self.request(call, gas_limit, fees);
        let pending = self.provider.send_transaction(tx).await.map_err(classify)?;
        let hash = *pending.tx_hash();
        info!(method = call.label, to = %call.to, %hash, "transaction submitted");
        Ok(hash)
    }

    async fn wait_for_inclusion(&self, hash: TxHash) -> BotResult<Inclusion> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), hash)
            .get_receipt()
            .await
            .map_err(|e| BotError::Rpc(format!("failed waiting for {hash}: {e}")))?;

        let inclusion = Inclusion {
            hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            success: receipt.status(),
        };
        debug!(?inclusion, "transaction included");
        Ok(inclusion)
    }
}

/// Maps a transport failure to a bot error, keeping revert data and its decoded
/// reason when the node returned them.
pub(crate) fn classify(err: TransportError) -> BotError {
    if let Some(payload) = err.as_error_resp() {
        if let Some(data) = payload.as_revert_data() {
            return BotError::Revert {
                message: payload.message.to_string(),
                reason: revert_reason(&data),
                data: Some(format!("0x{}", hex::encode(&data))),
            };
        }
        if payload.message.contains("revert") {
            return BotError::Revert {
                message: payload.message.to_string(),
                reason: None,
                data: payload.data.as_ref().map(|raw| raw.get().to_string()),
            };
        }
    }
    BotError::Rpc(err.to_string())
}

/// `Error(string)` payloads yield the bare message; anything else goes through
/// the generic decoder.
fn revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data)
        .map(|revert| revert.reason)
        .ok()
        .or_else(|| decode_revert_reason(data))
}

fn contract_error(err: alloy_contract::Error) -> BotError {
    match err {
        alloy_contract::Error::TransportError(inner) => classify(inner),
        other => BotError::Rpc(other.to_string()),
    }
}
