mod client;
mod config;
mod error;
mod menu;
mod session;
mod swap;
mod units;
mod workflow;

use client::{Chain, ChainClient};
use colored::Colorize;
use config::{load_proxies, pick_proxy, private_key_from_env, Settings};
use menu::Menu;
use session::Session;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // .env is optional, real environment variables win
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", format!("❌ {e}").red());
            process::exit(1);
        }
    };
    let private_key = match private_key_from_env() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{}", format!("❌ {e}").red());
            process::exit(1);
        }
    };

    let proxies = load_proxies(&settings.proxy_file);
    let proxy = pick_proxy(&proxies);

    // Create the chain client
    let client = match ChainClient::new(
        &settings.network.rpc_url,
        &private_key,
        settings.network.chain_id,
        proxy,
    ) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", format!("❌ Failed to initialize wallet: {e}").red());
            process::exit(1);
        }
    };
    info!(
        address = %client.address(),
        chain_id = client.chain_id(),
        proxies = proxies.len(),
        "wallet ready"
    );

    let mut session = Session::stdio();
    Menu::new(&client, &mut session, &settings, client.proxy())
        .run()
        .await?;

    Ok(())
}
