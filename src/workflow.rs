use alloy::primitives::{Address, U256};
use alloy_signer_local::PrivateKeySigner;
use colored::Colorize;
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::client::{Chain, ContractCall, Erc20, Inclusion, LendingGateway, SwapLeg, SwapRouter, WrappedNative};
use crate::config::{Settings, Token};
use crate::error::{BotError, Result};
use crate::session::{Preview, Session};
use crate::swap::{quote, SwapSide};
use crate::units::{format_amount, parse_amount, parse_count, Amount};

const NATIVE_DECIMALS: u8 = 18;

/// The eight user-facing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    BatchTransfer,
    Supply,
    Withdraw,
    Wrap,
    Unwrap,
    Approve,
    SwapWrappedToStable,
    SwapStableToWrapped,
}

impl Action {
    fn title(self) -> &'static str {
        match self {
            Action::BatchTransfer => "RANDOM TRANSFERS",
            Action::Supply => "SUPPLY ETH TO INARI BANK",
            Action::Withdraw => "WITHDRAW ETH FROM INARI BANK",
            Action::Wrap => "WRAP ETH TO WETH",
            Action::Unwrap => "UNWRAP WETH TO ETH",
            Action::Approve => "APPROVE WETH",
            Action::SwapWrappedToStable => "SWAP WETH TO USDC",
            Action::SwapStableToWrapped => "SWAP USDC TO WETH",
        }
    }

    fn footer(self) -> &'static str {
        match self {
            Action::BatchTransfer => "BATCH TRANSFER",
            Action::Supply => "SUPPLY",
            Action::Withdraw => "WITHDRAW",
            Action::Wrap => "WRAP",
            Action::Unwrap => "UNWRAP",
            Action::Approve => "APPROVE",
            Action::SwapWrappedToStable | Action::SwapStableToWrapped => "SWAP",
        }
    }

    /// Name of the menu control returns to.
    pub fn menu(self) -> &'static str {
        match self {
            Action::BatchTransfer => "main",
            Action::Supply | Action::Withdraw => "Inari Bank",
            _ => "Gas Pump",
        }
    }
}

/// How an action ended. Every variant hands control back to the menu.
#[derive(Debug)]
pub enum Outcome {
    Completed,
    Canceled,
    Failed(BotError),
}

/// Runs one action at a time against a chain, talking to the user through a session.
pub struct Workflow<'a, C, R, W> {
    chain: &'a C,
    session: &'a mut Session<R, W>,
    settings: &'a Settings,
}

impl<'a, C, R, W> Workflow<'a, C, R, W>
where
    C: Chain,
    R: BufRead,
    W: Write,
{
    pub fn new(chain: &'a C, session: &'a mut Session<R, W>, settings: &'a Settings) -> Self {
        Self {
            chain,
            session,
            settings,
        }
    }

    /// Runs `action` to a terminal state and reports it. Only a lost input
    /// stream is returned as an error; everything else becomes an [`Outcome`].
    pub async fn run(&mut self, action: Action) -> Result<Outcome> {
        self.session.say(format!("\n===== {} =====", action.title()).white());

        let result = match action {
            Action::BatchTransfer => self.batch_transfer().await,
            Action::Supply => self.supply().await,
            Action::Withdraw => self.withdraw().await,
            Action::Wrap => self.wrap().await,
            Action::Unwrap => self.unwrap_wrapped().await,
            Action::Approve => self.approve().await,
            Action::SwapWrappedToStable => self.swap(SwapSide::WrappedToStable).await,
            Action::SwapStableToWrapped => self.swap(SwapSide::StableToWrapped).await,
        };

        let outcome = match result {
            Ok(()) => {
                self.session.say(format!("===== {} COMPLETED =====\n", action.footer()).white());
                Outcome::Completed
            }
            Err(err) if err.is_input_failure() => return Err(err),
            Err(err) if err.is_cancellation() => {
                self.session.error(&err);
                self.session.say(format!("===== {} CANCELED =====\n", action.footer()).white());
                Outcome::Canceled
            }
            Err(err @ BotError::InsufficientBalance { .. }) => {
                self.session.error(&err);
                Outcome::Failed(err)
            }
            Err(err) => {
                warn!(?action, error = %err, "action failed");
                self.report_failure(&err);
                self.session.say(format!("===== {} FAILED =====\n", action.footer()).white());
                Outcome::Failed(err)
            }
        };

        self.session.pause(action.menu())?;
        Ok(outcome)
    }

    async fn batch_transfer(&mut self) -> Result<()> {
        let symbol = self.settings.network.symbol.clone();
        let (amount, count) = loop {
            let amount = self
                .read_amount(&format!("Enter amount of {symbol} to send in each transfer: "), NATIVE_DECIMALS)?;
            let raw = self.session.ask("Enter number of transfers to make: ")?;
            match parse_count(&raw) {
                Ok(count) => break (amount, count),
                Err(err) => self.session.error(err),
            }
        };

        self.session.warn(format!(
            "Preparing {count} random transfers of {amount} {symbol} each... 🚀"
        ));
        let cost = self.estimate_cost(self.settings.gas.transfer, u64::from(count)).await?;
        let total = amount
            .human
            .checked_mul(Decimal::from(count))
            .map(|t| t.normalize().to_string())
            .unwrap_or_else(|| "overflow".to_string());

        self.confirm(
            Preview::new()
                .row("Action", "Batch Transfer")
                .row("Total Amount", format!("{total} {symbol}"))
                .row("Transfers", count)
                .row("Est. Gas", self.native(cost)),
        )?;

        self.session.warn(format!("Starting {count} transfers...\n"));
        let mut succeeded = 0u32;
        for i in 0..count {
            self.session.say(format!("\nTransfer {}/{}", i + 1, count).white());
            let to = random_address();
            self.session.warn(format!(
                "Sending {amount} {symbol} to random address: {} 📤",
                to.to_string().cyan()
            ));

            match self
                .send(&ContractCall::native_transfer(to, amount.units), self.settings.gas.transfer)
                .await
            {
                Ok(_) => succeeded += 1,
                Err(err) => {
                    warn!(transfer = i + 1, error = %err, "transfer failed");
                    self.session.error(format!("Error sending {symbol}: {err}"));
                }
            }

            if i + 1 < count && self.settings.transfer_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.settings.transfer_delay_ms)).await;
            }
        }

        info!(succeeded, attempted = count, "batch transfer finished");
        self.session
            .say(format!("\nCompleted {succeeded}/{count} transfers successfully. 🎉").green());
        Ok(())
    }

    async fn supply(&mut self) -> Result<()> {
        self.session
            .warn("WARNING: Verify WrappedTokenGatewayV3 address for Rise Testnet before proceeding.");
        let amount = self.read_amount("Enter amount of ETH to supply: ", NATIVE_DECIMALS)?;
        let gas_limit = self.settings.gas.gateway;
        let cost = self.estimate_cost(gas_limit, 1).await?;
        self.confirm(
            Preview::new()
                .row("Action", "Supply ETH")
                .row("Amount", format!("{amount} ETH"))
                .row("Est. Gas", self.native(cost)),
        )?;

        let gateway = LendingGateway::new(&self.settings.contracts);
        self.session.warn(format!("Supplying {amount} ETH to Inari Bank..."));
        self.send(&gateway.deposit_eth(self.chain.address(), amount.units), gas_limit)
            .await?;
        self.session.success(format!("Successfully supplied {amount} ETH! 🎉"));
        Ok(())
    }

    async fn withdraw(&mut self) -> Result<()> {
        self.session
            .warn("WARNING: Verify WrappedTokenGatewayV3 address for Rise Testnet before proceeding.");
        let amount = self.read_amount("Enter amount of ETH to withdraw: ", NATIVE_DECIMALS)?;
        let gas_limit = self.settings.gas.gateway;
        let cost = self.estimate_cost(gas_limit, 1).await?;
        self.confirm(
            Preview::new()
                .row("Action", "Withdraw ETH")
                .row("Amount", format!("{amount} ETH"))
                .row("Est. Gas", self.native(cost)),
        )?;

        let gateway = LendingGateway::new(&self.settings.contracts);
        self.session.warn(format!("Withdrawing {amount} ETH from Inari Bank..."));
        self.send(&gateway.withdraw_eth(amount.units, self.chain.address()), gas_limit)
            .await?;
        self.session.success(format!("Successfully withdrew {amount} ETH! 🎉"));
        Ok(())
    }

    async fn wrap(&mut self) -> Result<()> {
        let wrapped = self.settings.contracts.wrapped.clone();
        let amount = self.read_amount("Enter amount of ETH to wrap: ", NATIVE_DECIMALS)?;
        let gas_limit = self.settings.gas.wrap;
        let cost = self.estimate_cost(gas_limit, 1).await?;
        self.confirm(
            Preview::new()
                .row("Action", "Wrap ETH")
                .row("Amount", format!("{amount} ETH"))
                .row("Est. Gas", self.native(cost)),
        )?;

        self.session.warn(format!("Wrapping {amount} ETH to {}...", wrapped.symbol));
        let call = WrappedNative::new(wrapped.address).deposit(amount.units);
        self.send(&call, gas_limit).await?;
        self.session
            .success(format!("Successfully wrapped {amount} ETH to {}! 🎉", wrapped.symbol));
        Ok(())
    }

    async fn unwrap_wrapped(&mut self) -> Result<()> {
        let wrapped = self.settings.contracts.wrapped.clone();
        let amount = self.read_amount(
            &format!("Enter amount of {} to unwrap: ", wrapped.symbol),
            wrapped.decimals,
        )?;
        self.ensure_balance(&wrapped, &amount).await?;

        let gas_limit = self.settings.gas.wrap;
        let cost = self.estimate_cost(gas_limit, 1).await?;
        self.confirm(
            Preview::new()
                .row("Action", format!("Unwrap {}", wrapped.symbol))
                .row("Amount", format!("{amount} {}", wrapped.symbol))
                .row("Est. Gas", self.native(cost)),
        )?;

        self.session.warn(format!("Unwrapping {amount} {} to ETH...", wrapped.symbol));
        let call = WrappedNative::new(wrapped.address).withdraw(amount.units);
        self.send(&call, gas_limit).await?;
        self.session
            .success(format!("Successfully unwrapped {amount} {} to ETH! 🎉", wrapped.symbol));
        Ok(())
    }

    async fn approve(&mut self) -> Result<()> {
        let wrapped = self.settings.contracts.wrapped.clone();
        let router = self.settings.contracts.router;
        let amount = self.read_amount(
            &format!("Enter amount of {} to approve for DODO: ", wrapped.symbol),
            wrapped.decimals,
        )?;

        let current = self
            .chain
            .allowance(wrapped.address, self.chain.address(), router)
            .await?;
        if current >= amount.units {
            debug!(token = %wrapped.symbol, %current, required = %amount.units, "allowance sufficient");
            self.session.success(format!(
                "{} allowance already sufficient: {} (required {amount})",
                wrapped.symbol,
                format_amount(current, wrapped.decimals)
            ));
            return Ok(());
        }

        let gas_limit = self.settings.gas.approve;
        let cost = self.estimate_cost(gas_limit, 1).await?;
        self.confirm(
            Preview::new()
                .row("Action", format!("Approve {}", wrapped.symbol))
                .row("Amount", format!("{amount} {}", wrapped.symbol))
                .row("Spender", router)
                .row("Est. Gas", self.native(cost)),
        )?;

        self.session.warn(format!(
            "Approving {amount} {} for DODOFeeRouteProxy...",
            wrapped.symbol
        ));
        let call = WrappedNative::new(wrapped.address).approve(router, amount.units);
        self.send(&call, gas_limit).await?;
        self.session
            .success(format!("Successfully approved {amount} {}! 🎉", wrapped.symbol));
        Ok(())
    }

    async fn swap(&mut self, side: SwapSide) -> Result<()> {
        let contracts = &self.settings.contracts;
        let (from, to) = match side {
            SwapSide::WrappedToStable => (contracts.wrapped.clone(), contracts.stable.clone()),
            SwapSide::StableToWrapped => (contracts.stable.clone(), contracts.wrapped.clone()),
        };

        let amount = self.read_amount(
            &format!("Enter amount of {} to swap: ", from.symbol),
            from.decimals,
        )?;
        self.ensure_balance(&from, &amount).await?;

        let gas_limit = self.settings.gas.swap;
        let cost = self.estimate_cost(gas_limit, 1).await?;
        let swap_quote = quote(amount.human, side, &self.settings.swap, to.decimals)?;

        self.confirm(
            Preview::new()
                .row("Action", format!("Swap {} to {}", from.symbol, to.symbol))
                .row(format!("{} Amount", from.symbol), format!("{amount} {}", from.symbol))
                .row(format!("Exp. {}", to.symbol), format!("{} {}", swap_quote.expected, to.symbol))
                .row(format!("Min. {}", to.symbol), format!("{} {}", swap_quote.minimum, to.symbol))
                .row(
                    "Rate",
                    format!(
                        "{} {}/{} (static)",
                        self.settings.swap.rate,
                        self.settings.contracts.stable.symbol,
                        self.settings.contracts.wrapped.symbol
                    ),
                )
                .row("Est. Gas", self.native(cost)),
        )?;

        let router = SwapRouter::new(&self.settings.contracts);
        self.ensure_allowance(&from, router.address, amount.units).await?;

        self.session
            .warn(format!("Swapping {amount} {} to {}...", from.symbol, to.symbol));

        let deadline = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
            + self.settings.swap.deadline_secs;

        let policy = side.direction_policy();
        let directions = policy.directions();
        let mut failures = Vec::with_capacity(directions.len());

        for (i, &direction) in directions.iter().enumerate() {
            let leg = SwapLeg {
                from_token: from.address,
                to_token: to.address,
                amount: amount.units,
                expected: swap_quote.expected_units,
                minimum: swap_quote.minimum_units,
                direction,
                deadline,
            };
            if directions.len() > 1 {
                self.session
                    .say(format!("Attempting swap with directions={direction}...").bright_black());
            }

            match self.send(&router.mix_swap(&leg), gas_limit).await {
                Ok(_) => {
                    self.session.success(format!(
                        "Successfully swapped {amount} {} to {}! 🎉",
                        from.symbol, to.symbol
                    ));
                    return Ok(());
                }
                Err(err) => {
                    warn!(direction, error = %err, "swap attempt failed");
                    if directions.len() > 1 {
                        self.session
                            .error(format!("Swap with directions={direction} failed: {err}"));
                        self.print_revert_details(&err);
                        if let Some(next) = directions.get(i + 1) {
                            self.session.warn(format!("Retrying with directions={next}..."));
                        } else {
                            self.session
                                .error("Both directions failed. Please verify pool parameters.");
                        }
                    }
                    failures.push((direction, err));
                }
            }
        }

        Err(policy.into_error(failures))
    }

    /// Asks until the input parses as a positive amount at `decimals` precision.
    fn read_amount(&mut self, prompt: &str, decimals: u8) -> Result<Amount> {
        loop {
            let raw = self.session.ask(prompt)?;
            match parse_amount(&raw, decimals) {
                Ok(amount) => return Ok(amount),
                Err(err) => {
                    debug!(input = %raw, "rejected amount");
                    self.session.error(err);
                }
            }
        }
    }

    /// Gas price times the action's fixed gas limit, times `count` transactions.
    async fn estimate_cost(&self, gas_limit: u64, count: u64) -> Result<U256> {
        let gas_price = self.chain.gas_price().await?;
        Ok(U256::from(gas_price) * U256::from(gas_limit) * U256::from(count))
    }

    fn confirm(&mut self, preview: Preview) -> Result<()> {
        if self.session.confirm(&preview)? {
            Ok(())
        } else {
            Err(BotError::UserCanceled)
        }
    }

    /// Aborts before any prompt or gas spend when the wallet holds less than `amount`.
    /// A failed balance read is an error, never a zero balance.
    async fn ensure_balance(&mut self, token: &Token, amount: &Amount) -> Result<()> {
        let balance = self.chain.token_balance(token.address, self.chain.address()).await?;
        if balance < amount.units {
            return Err(BotError::InsufficientBalance {
                symbol: token.symbol.clone(),
                available: format_amount(balance, token.decimals),
                required: amount.to_string(),
            });
        }
        Ok(())
    }

    /// Makes sure `spender` may move `required` units of `token`, running a
    /// confirmed approval first when the current allowance is lower.
    async fn ensure_allowance(&mut self, token: &Token, spender: Address, required: U256) -> Result<()> {
        let current = self
            .chain
            .allowance(token.address, self.chain.address(), spender)
            .await?;
        if current >= required {
            debug!(token = %token.symbol, %current, %required, "allowance sufficient");
            return Ok(());
        }

        let required_human = format_amount(required, token.decimals);
        self.session.warn(format!(
            "Insufficient {} allowance. Current: {}, Required: {}",
            token.symbol,
            format_amount(current, token.decimals),
            required_human
        ));

        let gas_limit = self.settings.gas.approve;
        let cost = self.estimate_cost(gas_limit, 1).await?;
        let preview = Preview::new()
            .row("Action", format!("Approve {}", token.symbol))
            .row("Amount", format!("{required_human} {}", token.symbol))
            .row("Spender", spender)
            .row("Est. Gas", self.native(cost));
        if !self.session.confirm(&preview)? {
            return Err(BotError::AllowanceDenied);
        }

        self.session.warn(format!(
            "Approving {required_human} {} for {spender}...",
            token.symbol
        ));
        self.send(&Erc20::new(token.address).approve(spender, required), gas_limit)
            .await?;
        Ok(())
    }

    /// Submits `call`, prints its hash before waiting, then waits for inclusion.
    /// A receipt with failed status is a revert.
    async fn send(&mut self, call: &ContractCall, gas_limit: u64) -> Result<Inclusion> {
        let hash = self.chain.submit(call, gas_limit, &self.settings.fees).await?;
        let hash_text = hash.to_string();
        self.session
            .say(format!("Transaction sent! Hash: {} 📤", hash_text.cyan()).white());
        self.session.say(
            format!("View on explorer: {} 🔗", self.settings.network.tx_url(&hash_text)).bright_black(),
        );

        let inclusion = self
            .session
            .with_spinner("Waiting for confirmation...", self.chain.wait_for_inclusion(hash))
            .await?;

        if !inclusion.success {
            return Err(BotError::Revert {
                message: format!(
                    "{} transaction {} reverted in block {}",
                    call.label, hash_text, inclusion.block_number
                ),
                reason: None,
                data: None,
            });
        }

        debug!(hash = %inclusion.hash, block = inclusion.block_number, "transaction confirmed");
        self.session
            .success(format!("Transaction confirmed in block {}", inclusion.block_number));
        Ok(inclusion)
    }

    fn report_failure(&mut self, err: &BotError) {
        self.session.error(format!("Error: {err}"));
        self.print_revert_details(err);
    }

    fn print_revert_details(&mut self, err: &BotError) {
        let (reason, data) = err.revert_details();
        if let Some(reason) = reason {
            self.session.say(format!("Revert reason: {reason}").red());
        }
        if let Some(data) = data {
            self.session.say(format!("Revert data: {data}").red());
        }
    }

    fn native(&self, wei: U256) -> String {
        format!("{} {}", format_amount(wei, NATIVE_DECIMALS), self.settings.network.symbol)
    }
}

/// A fresh address nobody holds the key to after this call.
fn random_address() -> Address {
    PrivateKeySigner::random().address()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::contracts::{IFeeRouteProxy, IWrappedNative, IERC20};
    use crate::config::FeePolicy;
    use crate::session::tests::{scripted, transcript};
    use alloy::primitives::TxHash;
    use alloy_sol_types::SolCall;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    const ONE: u128 = 1_000_000_000_000_000_000;

    #[derive(Debug, Clone)]
    pub struct Submitted {
        pub call: ContractCall,
        pub gas_limit: u64,
        pub fees: FeePolicy,
    }

    /// In-memory chain with scripted reads and a log of every submission.
    #[derive(Default)]
    pub struct MockChain {
        pub address: Address,
        pub gas_price: u128,
        pub balances: HashMap<Address, U256>,
        pub allowances: HashMap<Address, U256>,
        pub failing_reads: bool,
        pub failing_gas_price: bool,
        /// Submission indices rejected by the node.
        pub rejected: HashSet<usize>,
        /// Submission indices that are mined but revert.
        pub reverted: HashSet<usize>,
        pub submitted: Mutex<Vec<Submitted>>,
    }

    impl MockChain {
        pub fn new() -> Self {
            Self {
                address: Address::from([0xaa; 20]),
                gas_price: 1_000_000_000,
                ..Default::default()
            }
        }

        pub fn with_balance(mut self, token: Address, units: U256) -> Self {
            self.balances.insert(token, units);
            self
        }

        pub fn with_allowance(mut self, token: Address, units: U256) -> Self {
            self.allowances.insert(token, units);
            self
        }

        pub fn rejecting(mut self, indices: &[usize]) -> Self {
            self.rejected.extend(indices.iter().copied());
            self
        }

        pub fn reverting(mut self, indices: &[usize]) -> Self {
            self.reverted.extend(indices.iter().copied());
            self
        }

        pub fn submissions(&self) -> Vec<Submitted> {
            self.submitted.lock().unwrap().clone()
        }

        fn read_error(&self) -> BotError {
            BotError::Rpc("connection refused".to_string())
        }
    }

    impl Chain for MockChain {
        fn address(&self) -> Address {
            self.address
        }

        async fn block_number(&self) -> Result<u64> {
            if self.failing_reads {
                return Err(self.read_error());
            }
            Ok(1_234)
        }

        async fn gas_price(&self) -> Result<u128> {
            if self.failing_gas_price {
                return Err(self.read_error());
            }
            Ok(self.gas_price)
        }

        async fn native_balance(&self, _owner: Address) -> Result<U256> {
            if self.failing_reads {
                return Err(self.read_error());
            }
            Ok(U256::from(5 * ONE))
        }

        async fn token_balance(&self, token: Address, _owner: Address) -> Result<U256> {
            if self.failing_reads {
                return Err(self.read_error());
            }
            Ok(self.balances.get(&token).copied().unwrap_or_default())
        }

        async fn token_decimals(&self, token: Address) -> Result<u8> {
            if self.failing_reads {
                return Err(self.read_error());
            }
            let registry = Settings::default().contracts;
            Ok(if token == registry.stable.address { registry.stable.decimals } else { 18 })
        }

        async fn allowance(&self, token: Address, _owner: Address, _spender: Address) -> Result<U256> {
            if self.failing_reads {
                return Err(self.read_error());
            }
            Ok(self.allowances.get(&token).copied().unwrap_or_default())
        }

        async fn submit(&self, call: &ContractCall, gas_limit: u64, fees: &FeePolicy) -> Result<TxHash> {
            let mut submitted = self.submitted.lock().unwrap();
            let index = submitted.len();
            submitted.push(Submitted {
                call: call.clone(),
                gas_limit,
                fees: *fees,
            });
            if self.rejected.contains(&index) {
                return Err(BotError::Revert {
                    message: "execution reverted".to_string(),
                    reason: Some(format!("rejected #{index}")),
                    data: Some("0x08c379a0".to_string()),
                });
            }
            Ok(TxHash::with_last_byte(index as u8))
        }

        async fn wait_for_inclusion(&self, hash: TxHash) -> Result<Inclusion> {
            let index = hash.0[31] as usize;
            Ok(Inclusion {
                hash,
                block_number: 100 + index as u64,
                success: !self.reverted.contains(&index),
            })
        }
    }

    fn settings() -> Settings {
        Settings {
            transfer_delay_ms: 0,
            ..Settings::default()
        }
    }

    async fn run(chain: &MockChain, action: Action, script: &[&str]) -> (Outcome, String) {
        let settings = settings();
        let mut session = scripted(script);
        let outcome = Workflow::new(chain, &mut session, &settings)
            .run(action)
            .await
            .unwrap();
        (outcome, transcript(&session))
    }

    fn weth() -> Address {
        settings().contracts.wrapped.address
    }

    fn usdc() -> Address {
        settings().contracts.stable.address
    }

    fn direction_of(call: &ContractCall) -> U256 {
        IFeeRouteProxy::mixSwapCall::abi_decode(&call.input).unwrap().directions
    }

    #[tokio::test]
    async fn wrap_submits_deposit_with_fixed_fees() {
        let chain = MockChain::new();
        let (outcome, out) = run(&chain, Action::Wrap, &["0.5", "y", ""]).await;

        assert!(matches!(outcome, Outcome::Completed));
        let sent = chain.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].call.to, weth());
        assert_eq!(sent[0].call.value, U256::from(ONE / 2));
        assert_eq!(sent[0].call.selector(), Some(IWrappedNative::depositCall::SELECTOR));
        assert_eq!(sent[0].gas_limit, 95_312);
        assert_eq!(sent[0].fees.max_priority_fee_per_gas, 1_500_000_000);
        assert_eq!(sent[0].fees.max_fee_per_gas, 1_500_000_008);
        assert!(out.contains("Transaction sent! Hash: 0x"));
        assert!(out.contains("Transaction confirmed in block 100"));
        assert!(out.contains("===== WRAP COMPLETED ====="));
    }

    #[tokio::test]
    async fn invalid_amounts_reprompt_without_submitting() {
        let chain = MockChain::new();
        let (outcome, out) = run(&chain, Action::Wrap, &["abc", "0", "-1", "", "1", "n", ""]).await;

        assert!(matches!(outcome, Outcome::Canceled));
        assert!(chain.submissions().is_empty());
        assert_eq!(out.matches("Invalid amount").count(), 4);
        assert_eq!(out.matches("Enter amount of ETH to wrap").count(), 5);
    }

    #[tokio::test]
    async fn supply_estimates_gateway_cost_and_targets_gateway() {
        let chain = MockChain::new();
        let (outcome, out) = run(&chain, Action::Supply, &["2", "yes", ""]).await;

        assert!(matches!(outcome, Outcome::Completed));
        // 1 gwei * 310079 gas
        assert!(out.contains("0.000310079 ETH"));
        let sent = chain.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].call.to, settings().contracts.gateway);
        assert_eq!(sent[0].call.value, U256::from(2 * ONE));
        assert_eq!(sent[0].gas_limit, 310_079);
    }

    #[tokio::test]
    async fn withdraw_sends_amount_as_argument() {
        let chain = MockChain::new();
        let (outcome, _) = run(&chain, Action::Withdraw, &["1.25", "Y", ""]).await;

        assert!(matches!(outcome, Outcome::Completed));
        let sent = chain.submissions();
        assert_eq!(sent[0].call.value, U256::ZERO);
        assert_eq!(sent[0].call.label, "withdrawETH");
    }

    #[tokio::test]
    async fn cancel_submits_nothing_for_every_action() {
        let cases: [(Action, &[&str]); 8] = [
            (Action::BatchTransfer, &["0.01", "3", "no", ""]),
            (Action::Supply, &["1", "n", ""]),
            (Action::Withdraw, &["1", "", ""]),
            (Action::Wrap, &["1", "nope", ""]),
            (Action::Unwrap, &["1", "n", ""]),
            (Action::Approve, &["1", "x", ""]),
            (Action::SwapWrappedToStable, &["1", "n", ""]),
            (Action::SwapStableToWrapped, &["10", "n", ""]),
        ];

        for (action, script) in cases {
            let chain = MockChain::new()
                .with_balance(weth(), U256::from(10 * ONE))
                .with_balance(usdc(), U256::from(100_000_000u64));
            let (outcome, out) = run(&chain, action, script).await;
            assert!(matches!(outcome, Outcome::Canceled), "{action:?}");
            assert!(chain.submissions().is_empty(), "{action:?}");
            assert!(out.contains("Transaction canceled."), "{action:?}");
        }
    }

    #[tokio::test]
    async fn unwrap_with_insufficient_balance_never_prompts() {
        let chain = MockChain::new().with_balance(weth(), U256::from(ONE));
        let (outcome, out) = run(&chain, Action::Unwrap, &["2", ""]).await;

        assert!(matches!(outcome, Outcome::Failed(BotError::InsufficientBalance { .. })));
        assert!(chain.submissions().is_empty());
        assert!(!out.contains("Confirm transaction?"));
        assert!(out.contains("Available: 1, Required: 2 WETH"));
    }

    #[tokio::test]
    async fn failed_balance_read_is_not_treated_as_zero() {
        let mut chain = MockChain::new().with_balance(weth(), U256::from(10 * ONE));
        chain.failing_reads = true;
        let (outcome, _) = run(&chain, Action::SwapWrappedToStable, &["1", ""]).await;

        assert!(matches!(outcome, Outcome::Failed(BotError::Rpc(_))));
        assert!(chain.submissions().is_empty());
    }

    #[tokio::test]
    async fn sufficient_allowance_skips_approval() {
        let chain = MockChain::new()
            .with_balance(weth(), U256::from(10 * ONE))
            .with_allowance(weth(), U256::from(ONE));
        let (outcome, _) = run(&chain, Action::SwapWrappedToStable, &["1", "y", ""]).await;

        assert!(matches!(outcome, Outcome::Completed));
        let sent = chain.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].call.label, "mixSwap");
        assert_eq!(direction_of(&sent[0].call), U256::ZERO);
        assert_eq!(sent[0].gas_limit, 300_000);
    }

    #[tokio::test]
    async fn low_allowance_approves_once_before_swap() {
        let chain = MockChain::new()
            .with_balance(weth(), U256::from(10 * ONE))
            .with_allowance(weth(), U256::from(ONE / 10));
        let (outcome, out) = run(&chain, Action::SwapWrappedToStable, &["1", "y", "y", ""]).await;

        assert!(matches!(outcome, Outcome::Completed));
        let sent = chain.submissions();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].call.label, "approve");
        assert_eq!(sent[0].call.to, weth());
        assert_eq!(sent[0].gas_limit, 100_000);
        let approval = IERC20::approveCall::abi_decode(&sent[0].call.input).unwrap();
        assert_eq!(approval.spender, settings().contracts.router);
        assert_eq!(approval.amount, U256::from(ONE));
        assert_eq!(sent[1].call.label, "mixSwap");
        assert!(out.contains("Insufficient WETH allowance. Current: 0.1, Required: 1"));
    }

    #[tokio::test]
    async fn declined_approval_aborts_swap() {
        let chain = MockChain::new().with_balance(usdc(), U256::from(50_000_000u64));
        let (outcome, _) = run(&chain, Action::SwapStableToWrapped, &["10", "y", "n", ""]).await;

        assert!(matches!(outcome, Outcome::Canceled));
        assert!(chain.submissions().is_empty());
    }

    #[tokio::test]
    async fn reverted_approval_blocks_main_call() {
        let chain = MockChain::new()
            .with_balance(usdc(), U256::from(50_000_000u64))
            .reverting(&[0]);
        let (outcome, _) = run(&chain, Action::SwapStableToWrapped, &["10", "y", "y", ""]).await;

        assert!(matches!(outcome, Outcome::Failed(BotError::Revert { .. })));
        let sent = chain.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].call.label, "approve");
    }

    #[tokio::test]
    async fn stable_to_wrapped_retries_with_alternate_direction() {
        let chain = MockChain::new()
            .with_balance(usdc(), U256::from(50_000_000u64))
            .with_allowance(usdc(), U256::from(50_000_000u64))
            .rejecting(&[0]);
        let (outcome, out) = run(&chain, Action::SwapStableToWrapped, &["10", "y", ""]).await;

        assert!(matches!(outcome, Outcome::Completed));
        let sent = chain.submissions();
        assert_eq!(sent.len(), 2);
        assert_eq!(direction_of(&sent[0].call), U256::from(1u64));
        assert_eq!(direction_of(&sent[1].call), U256::ZERO);
        assert!(out.contains("Revert reason: rejected #0"));
        assert!(out.contains("Retrying with directions=0..."));
    }

    #[tokio::test]
    async fn stable_to_wrapped_stops_after_two_failures() {
        let chain = MockChain::new()
            .with_balance(usdc(), U256::from(50_000_000u64))
            .with_allowance(usdc(), U256::from(50_000_000u64))
            .rejecting(&[0])
            .reverting(&[1]);
        let (outcome, out) = run(&chain, Action::SwapStableToWrapped, &["10", "y", ""]).await;

        match outcome {
            Outcome::Failed(BotError::SwapFailed { attempts }) => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].direction, 1);
                assert!(attempts[0].reason.contains("rejected #0"));
                assert_eq!(attempts[1].direction, 0);
                assert!(attempts[1].reason.contains("reverted in block 101"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(chain.submissions().len(), 2);
        assert!(out.contains("Both directions failed"));
        assert!(out.contains("===== SWAP FAILED ====="));
    }

    #[tokio::test]
    async fn wrapped_to_stable_makes_a_single_attempt() {
        let chain = MockChain::new()
            .with_balance(weth(), U256::from(10 * ONE))
            .with_allowance(weth(), U256::from(10 * ONE))
            .rejecting(&[0]);
        let (outcome, _) = run(&chain, Action::SwapWrappedToStable, &["1", "y", ""]).await;

        assert!(matches!(outcome, Outcome::Failed(BotError::Revert { .. })));
        assert_eq!(chain.submissions().len(), 1);
    }

    #[tokio::test]
    async fn swap_quote_reaches_router_call() {
        let chain = MockChain::new()
            .with_balance(weth(), U256::from(10 * ONE))
            .with_allowance(weth(), U256::from(10 * ONE));
        let (_, out) = run(&chain, Action::SwapWrappedToStable, &["1", "y", ""]).await;

        let call = IFeeRouteProxy::mixSwapCall::abi_decode(&chain.submissions()[0].call.input).unwrap();
        assert_eq!(call.fromToken, weth());
        assert_eq!(call.toToken, usdc());
        assert_eq!(call.fromTokenAmount, U256::from(ONE));
        assert_eq!(call.expReturnAmount, U256::from(1_071_568_000u64));
        assert_eq!(call.minReturnAmount, U256::from(1_037_277_824u64));
        assert!(out.contains("1071.568 USDC/WETH (static)"));
    }

    #[tokio::test]
    async fn batch_transfer_continues_past_failures() {
        let chain = MockChain::new().rejecting(&[1]).reverting(&[3]);
        let (outcome, out) = run(&chain, Action::BatchTransfer, &["0.01", "5", "y", ""]).await;

        assert!(matches!(outcome, Outcome::Completed));
        let sent = chain.submissions();
        assert_eq!(sent.len(), 5);
        assert!(sent.iter().all(|s| s.call.input.is_empty() && s.gas_limit == 21_000));
        assert!(sent.iter().all(|s| s.call.value == U256::from(ONE / 100)));
        let recipients: HashSet<Address> = sent.iter().map(|s| s.call.to).collect();
        assert_eq!(recipients.len(), 5);
        assert!(out.contains("Completed 3/5 transfers successfully."));
        assert!(out.contains("Total Amount    : 0.05 ETH"));
    }

    #[tokio::test]
    async fn invalid_count_restarts_from_amount() {
        let chain = MockChain::new();
        let (outcome, out) = run(&chain, Action::BatchTransfer, &["0.01", "0", "0.02", "2", "n", ""]).await;

        assert!(matches!(outcome, Outcome::Canceled));
        assert_eq!(out.matches("Invalid count").count(), 1);
        assert_eq!(out.matches("to send in each transfer").count(), 2);
        assert!(out.contains("Total Amount    : 0.04 ETH"));
    }

    #[tokio::test]
    async fn gas_price_failure_returns_to_menu() {
        let mut chain = MockChain::new();
        chain.failing_gas_price = true;
        let (outcome, out) = run(&chain, Action::Wrap, &["1", ""]).await;

        assert!(matches!(outcome, Outcome::Failed(BotError::Rpc(_))));
        assert!(chain.submissions().is_empty());
        assert!(out.contains("Press Enter to return to the Gas Pump menu..."));
    }

    #[tokio::test]
    async fn closed_input_propagates() {
        let chain = MockChain::new();
        let settings = settings();
        let mut session = scripted(&["nonsense"]);
        let result = Workflow::new(&chain, &mut session, &settings)
            .run(Action::Approve)
            .await;
        assert!(matches!(result, Err(BotError::InputClosed)));
    }

    #[tokio::test]
    async fn standalone_approve_targets_router() {
        let chain = MockChain::new();
        let (outcome, _) = run(&chain, Action::Approve, &["3", "y", ""]).await;

        assert!(matches!(outcome, Outcome::Completed));
        let sent = chain.submissions();
        let approval = IERC20::approveCall::abi_decode(&sent[0].call.input).unwrap();
        assert_eq!(approval.spender, settings().contracts.router);
        assert_eq!(approval.amount, U256::from(3 * ONE));
    }

    #[tokio::test]
    async fn standalone_approve_skips_when_allowance_covers_amount() {
        let chain = MockChain::new().with_allowance(weth(), U256::from(10 * ONE));
        let (outcome, out) = run(&chain, Action::Approve, &["1", ""]).await;

        assert!(matches!(outcome, Outcome::Completed));
        assert!(chain.submissions().is_empty());
        assert!(!out.contains("Confirm transaction?"));
        assert!(out.contains("WETH allowance already sufficient: 10 (required 1)"));
    }

    #[tokio::test]
    async fn swap_with_insufficient_stable_balance_never_prompts() {
        let chain = MockChain::new()
            .with_balance(usdc(), U256::from(5_000_000u64))
            .with_allowance(usdc(), U256::from(100_000_000u64));
        let (outcome, out) = run(&chain, Action::SwapStableToWrapped, &["10", ""]).await;

        assert!(matches!(outcome, Outcome::Failed(BotError::InsufficientBalance { .. })));
        assert!(chain.submissions().is_empty());
        assert!(!out.contains("Confirm transaction?"));
        assert!(out.contains("Insufficient USDC balance. Available: 5, Required: 10 USDC"));
    }
}
