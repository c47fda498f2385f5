use alloy::primitives::{Address, U256};
use colored::Colorize;
use std::io::{BufRead, Write};
use tracing::{debug, warn};

use crate::client::Chain;
use crate::config::Settings;
use crate::error::Result;
use crate::session::Session;
use crate::units::{format_amount, format_gwei};
use crate::workflow::{Action, Workflow};

const MAIN_OPTIONS: [&str; 4] = [
    "Send to Random Addresses",
    "Gas Pump",
    "Inari Bank",
    "Exit",
];

const GAS_PUMP_OPTIONS: [&str; 6] = [
    "Wrap ETH to WETH",
    "Unwrap WETH to ETH",
    "Approve WETH for DODO",
    "Swap WETH to USDC",
    "Swap USDC to WETH",
    "Back to Main Menu",
];

const BANK_OPTIONS: [&str; 3] = [
    "Supply ETH",
    "Withdraw ETH",
    "Back to Main Menu",
];

/// Interactive menu tree: main menu, Gas Pump and Inari Bank.
pub struct Menu<'a, C, R, W> {
    chain: &'a C,
    session: &'a mut Session<R, W>,
    settings: &'a Settings,
    proxy: Option<&'a str>,
}

impl<'a, C, R, W> Menu<'a, C, R, W>
where
    C: Chain,
    R: BufRead,
    W: Write,
{
    pub fn new(chain: &'a C, session: &'a mut Session<R, W>, settings: &'a Settings, proxy: Option<&'a str>) -> Self {
        Self {
            chain,
            session,
            settings,
            proxy,
        }
    }

    /// Loops until the user picks Exit or input ends.
    pub async fn run(&mut self) -> Result<()> {
        match self.main_menu().await {
            Err(err) if err.is_input_failure() => {
                debug!(error = %err, "input unavailable, leaving menu");
                self.session.say("");
                Ok(())
            }
            other => other,
        }
    }

    async fn main_menu(&mut self) -> Result<()> {
        loop {
            self.header().await;
            self.options("MAIN MENU", &MAIN_OPTIONS);

            match self.session.ask("Select an option (1-4): ")?.as_str() {
                "1" => self.action(Action::BatchTransfer).await?,
                "2" => self.gas_pump().await?,
                "3" => self.bank().await?,
                "4" => {
                    self.session.say("Exiting... 👋".yellow());
                    return Ok(());
                }
                other => self.invalid(other),
            }
        }
    }

    async fn gas_pump(&mut self) -> Result<()> {
        loop {
            self.header().await;
            self.options("GAS PUMP", &GAS_PUMP_OPTIONS);
            match self.session.ask("Select an option (1-6): ")?.as_str() {
                "1" => self.action(Action::Wrap).await?,
                "2" => self.action(Action::Unwrap).await?,
                "3" => self.action(Action::Approve).await?,
                "4" => self.action(Action::SwapWrappedToStable).await?,
                "5" => self.action(Action::SwapStableToWrapped).await?,
                "6" => return Ok(()),
                other => self.invalid(other),
            }
        }
    }

    async fn bank(&mut self) -> Result<()> {
        loop {
            self.header().await;
            self.options("INARI BANK", &BANK_OPTIONS);
            match self.session.ask("Select an option (1-3): ")?.as_str() {
                "1" => self.action(Action::Supply).await?,
                "2" => self.action(Action::Withdraw).await?,
                "3" => return Ok(()),
                other => self.invalid(other),
            }
        }
    }

    async fn action(&mut self, action: Action) -> Result<()> {
        let outcome = Workflow::new(self.chain, self.session, self.settings)
            .run(action)
            .await?;
        debug!(?action, ?outcome, "action finished");
        Ok(())
    }

    /// Fresh screen with live network status and balances.
    async fn header(&mut self) {
        self.session.clear();
        self.banner().await;
        self.wallet_info().await;
    }

    fn options(&mut self, title: &str, options: &[&str]) {
        self.session.say(format!("\n===== {title} =====").white());
        for (i, option) in options.iter().enumerate() {
            self.session.say(format!("{}. {}", i + 1, option));
        }
    }

    fn invalid(&mut self, choice: &str) {
        self.session
            .error(format!("Invalid option {choice:?}. Please choose a number from the menu."));
    }

    /// Header with live block number and gas price.
    async fn banner(&mut self) {
        let network = &self.settings.network;
        self.session.say("╔══════════════════════════════════╗".cyan());
        self.session.say("║        RISE TESTNET BOT          ║".cyan());
        self.session.say("╚══════════════════════════════════╝".cyan());
        self.session.say(format!("Network: {} (Chain ID {})", network.name, network.chain_id));

        let status = match (self.chain.block_number().await, self.chain.gas_price().await) {
            (Ok(block), Ok(gas_price)) => {
                format!("Block: {} | Gas: {} Gwei", block, format_gwei(gas_price)).green()
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "network status unavailable");
                "Network status unavailable".red()
            }
        };
        self.session.say(status);
    }

    /// Address, balances and proxy. Balances that fail to load are shown as zero.
    async fn wallet_info(&mut self) {
        let address = self.chain.address();
        let contracts = &self.settings.contracts;

        let native = or_zero("native", self.chain.native_balance(address).await);
        let wrapped = or_zero(
            &contracts.wrapped.symbol,
            self.chain.token_balance(contracts.wrapped.address, address).await,
        );
        let stable = or_zero(
            &contracts.stable.symbol,
            self.chain.token_balance(contracts.stable.address, address).await,
        );

        let wrapped_decimals = self.decimals(contracts.wrapped.address, contracts.wrapped.decimals).await;
        let stable_decimals = self.decimals(contracts.stable.address, contracts.stable.decimals).await;

        self.session.say("\n===== WALLET INFORMATION =====".white());
        self.session.say(format!("Address: {}", address.to_string().cyan()));
        self.session.say(format!(
            "{}: {}",
            self.settings.network.symbol,
            format_amount(native, 18)
        ));
        self.session.say(format!(
            "{}: {}",
            contracts.wrapped.symbol,
            format_amount(wrapped, wrapped_decimals)
        ));
        self.session.say(format!(
            "{}: {}",
            contracts.stable.symbol,
            format_amount(stable, stable_decimals)
        ));
        self.session.say(format!("Proxy: {}", self.proxy.unwrap_or("None")));
    }

    /// On-chain decimals for display, falling back to the configured precision.
    async fn decimals(&self, token: Address, configured: u8) -> u8 {
        match self.chain.token_decimals(token).await {
            Ok(decimals) => {
                if decimals != configured {
                    warn!(%token, decimals, configured, "token decimals differ from configuration");
                }
                decimals
            }
            Err(e) => {
                debug!(%token, error = %e, "decimals unavailable");
                configured
            }
        }
    }
}

fn or_zero(what: &str, balance: Result<U256>) -> U256 {
    balance.unwrap_or_else(|e| {
        warn!(balance = what, error = %e, "balance unavailable, showing zero");
        U256::ZERO
    })
}
