use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy_sol_types::SolCall;

use crate::config::ContractRegistry;

sol! {
    #[sol(rpc)]
    interface IWrappedTokenGateway {
        function depositETH(address pool, address onBehalfOf, uint16 referralCode) external payable;
        function withdrawETH(address pool, uint256 amount, address to) external;
    }

    #[sol(rpc)]
    interface IWrappedNative {
        function deposit() external payable;
        function withdraw(uint256 amount) external;
    }

    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    #[sol(rpc)]
    interface IFeeRouteProxy {
        function mixSwap(
            address fromToken,
            address toToken,
            uint256 fromTokenAmount,
            uint256 expReturnAmount,
            uint256 minReturnAmount,
            address[] mixAdapters,
            address[] mixPairs,
            address[] assetTo,
            uint256 directions,
            bytes[] moreInfos,
            bytes feeData,
            uint256 deadLine
        ) external returns (uint256);
    }
}

/// A fully encoded state-changing call, ready to be signed and submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub label: &'static str,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

impl ContractCall {
    /// Plain native-currency transfer, no calldata.
    pub fn native_transfer(to: Address, value: U256) -> Self {
        Self {
            label: "transfer",
            to,
            value,
            input: Bytes::new(),
        }
    }

    /// Four-byte selector of the encoded call, if any.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).map(|s| [s[0], s[1], s[2], s[3]])
    }
}

/// Lending gateway that wraps native currency on the caller's behalf.
#[derive(Debug, Clone, Copy)]
pub struct LendingGateway {
    pub address: Address,
    pub pool: Address,
}

impl LendingGateway {
    pub fn new(registry: &ContractRegistry) -> Self {
        Self {
            address: registry.gateway,
            pool: registry.lending_pool,
        }
    }

    pub fn deposit_eth(&self, on_behalf_of: Address, value: U256) -> ContractCall {
        let call = IWrappedTokenGateway::depositETHCall {
            pool: self.pool,
            onBehalfOf: on_behalf_of,
            referralCode: 0,
        };
        ContractCall {
            label: "depositETH",
            to: self.address,
            value,
            input: call.abi_encode().into(),
        }
    }

    pub fn withdraw_eth(&self, amount: U256, to: Address) -> ContractCall {
        let call = IWrappedTokenGateway::withdrawETHCall {
            pool: self.pool,
            amount,
            to,
        };
        ContractCall {
            label: "withdrawETH",
            to: self.address,
            value: U256::ZERO,
            input: call.abi_encode().into(),
        }
    }
}

/// ERC-20 write calls shared by the wrapped and the stable token.
#[derive(Debug, Clone, Copy)]
pub struct Erc20 {
    pub address: Address,
}

impl Erc20 {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn approve(&self, spender: Address, amount: U256) -> ContractCall {
        let call = IERC20::approveCall { spender, amount };
        ContractCall {
            label: "approve",
            to: self.address,
            value: U256::ZERO,
            input: call.abi_encode().into(),
        }
    }
}

/// Wrapped-native token: ERC-20 plus 1:1 deposit/withdraw.
#[derive(Debug, Clone, Copy)]
pub struct WrappedNative {
    pub token: Erc20,
}

impl WrappedNative {
    pub fn new(address: Address) -> Self {
        Self {
            token: Erc20::new(address),
        }
    }

    pub fn deposit(&self, value: U256) -> ContractCall {
        ContractCall {
            label: "deposit",
            to: self.token.address,
            value,
            input: IWrappedNative::depositCall {}.abi_encode().into(),
        }
    }

    pub fn withdraw(&self, amount: U256) -> ContractCall {
        ContractCall {
            label: "withdraw",
            to: self.token.address,
            value: U256::ZERO,
            input: IWrappedNative::withdrawCall { amount }.abi_encode().into(),
        }
    }

    pub fn approve(&self, spender: Address, amount: U256) -> ContractCall {
        self.token.approve(spender, amount)
    }
}

/// Arguments of one `mixSwap` call that vary per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapLeg {
    pub from_token: Address,
    pub to_token: Address,
    pub amount: U256,
    pub expected: U256,
    pub minimum: U256,
    pub direction: u64,
    pub deadline: u64,
}

/// Routing contract with the single adapter/pair route configured for the network.
#[derive(Debug, Clone, Copy)]
pub struct SwapRouter {
    pub address: Address,
    pub adapter: Address,
    pub pair: Address,
}

impl SwapRouter {
    pub fn new(registry: &ContractRegistry) -> Self {
        Self {
            address: registry.router,
            adapter: registry.mix_adapter,
            pair: registry.mix_pair,
        }
    }

    pub fn mix_swap(&self, leg: &SwapLeg) -> ContractCall {
        let call = IFeeRouteProxy::mixSwapCall {
            fromToken: leg.from_token,
            toToken: leg.to_token,
            fromTokenAmount: leg.amount,
            expReturnAmount: leg.expected,
            minReturnAmount: leg.minimum,
            mixAdapters: vec![self.adapter],
            mixPairs: vec![self.pair],
            assetTo: vec![self.pair, self.address],
            directions: U256::from(leg.direction),
            moreInfos: vec![Bytes::from_static(&[0x00])],
            feeData: Bytes::from(vec![0u8; 64]),
            deadLine: U256::from(leg.deadline),
        };
        ContractCall {
            label: "mixSwap",
            to: self.address,
            value: U256::ZERO,
            input: call.abi_encode().into(),
        }
    }
}
