use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    pricing,
    rpc::{JsonRpcTransport, RpcNameRegistry, RpcWalletProvider},
    ClientEvent, ClientOptions, FormState, NameServiceClient, NetworkTable, SwitchOutcome,
};
use shared::domain::Registration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, ClientSettings};

#[derive(Parser, Debug)]
#[command(name = "namesvc", about = "Register and manage names on the registry")]
struct Args {
    /// Settings file; defaults to ./namesvc.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    settle_delay_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show account, network and catalog size.
    Status,
    /// Ask the wallet for account access.
    Connect,
    /// Move the wallet to the registry's network, adding it if needed.
    Switch,
    /// Show the registration fee for a name.
    Price { name: String },
    /// Register a name and set its record.
    Mint {
        name: String,
        #[arg(default_value = "")]
        record: String,
    },
    /// Replace the record of a name you own.
    Update { name: String, record: String },
    /// List registered names.
    List {
        /// Only names owned by the connected account.
        #[arg(long)]
        mine: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print session events and reload when the wallet changes network.
    Watch {
        #[arg(long, default_value_t = 2000)]
        poll_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(rpc_url) = args.rpc_url {
        settings.rpc_url = rpc_url;
    }
    if let Some(ms) = args.settle_delay_ms {
        settings.settle_delay = Duration::from_millis(ms);
    }

    let client = build_client(&settings)?;
    let outcome = run(&client, &settings, args.command).await;
    if let Err(err) = &outcome {
        error!(error = %format!("{err:#}"), "namesvc: command failed");
    }
    outcome
}

async fn run(
    client: &Arc<NameServiceClient>,
    settings: &ClientSettings,
    command: Command,
) -> Result<()> {
    let target = client.network_guard().target();
    match command {
        Command::Price { name } => {
            let price = pricing::price(&name)?;
            println!(
                "{} costs {price} {}",
                settings.display_name(&name),
                target.native_currency.symbol
            );
        }
        Command::Status => {
            let snapshot = client.bootstrap().await;
            match &snapshot.account {
                Some(account) => println!("account: {account}"),
                None => println!("account: not connected"),
            }
            match (&snapshot.network, snapshot.chain_id) {
                (Some(network), _) => println!("network: {network}"),
                (None, Some(chain_id)) => println!("network: unknown ({chain_id})"),
                (None, None) => println!("network: unavailable"),
            }
            let on_target = client.network_guard().on_target().await;
            println!(
                "target: {} ({})",
                target.chain_name,
                if on_target { "ok" } else { "switch required" }
            );
            println!("names: {}", client.catalog().entries().await.len());
        }
        Command::Connect => {
            client.bootstrap().await;
            let account = client.connect().await?;
            println!("connected {account}");
        }
        Command::Switch => {
            client.bootstrap().await;
            let outcome = client.switch_network().await?;
            info!(?outcome, chain = %target.chain_id, "namesvc: wallet on target network");
            match outcome {
                SwitchOutcome::Switched => println!("switched to {}", target.chain_name),
                SwitchOutcome::AddedChain => {
                    println!("added and switched to {}", target.chain_name)
                }
            }
        }
        Command::Mint { name, record } => {
            client.bootstrap().await;
            let mut form = FormState::new();
            form.set_domain(name.as_str())?;
            form.set_record(record);
            let receipt = client.workflow().mint(&mut form).await?;
            info!(name = %name, tx = %receipt.transaction_hash, "namesvc: name registered");
            println!(
                "registered {} in block {}",
                settings.display_name(&name),
                receipt.block_number
            );
        }
        Command::Update { name, record } => {
            client.bootstrap().await;
            let mut form = FormState::new();
            client.edit_session().begin(&mut form, &name).await?;
            form.set_record(record);
            let receipt = client.workflow().update(&mut form).await?;
            info!(name = %name, tx = %receipt.transaction_hash, "namesvc: record updated");
            println!("updated {}", settings.display_name(&name));
        }
        Command::List { mine, json } => {
            let snapshot = client.bootstrap().await;
            let entries = if mine {
                if !snapshot.is_connected() {
                    bail!("connect a wallet to list your names");
                }
                client.edit_session().editable().await
            } else {
                client.catalog().entries().await
            };
            print_entries(settings, &entries, json)?;
        }
        Command::Watch { poll_ms } => {
            client.bootstrap().await;
            watch(client, Duration::from_millis(poll_ms)).await?
        }
    }
    Ok(())
}

fn build_client(settings: &ClientSettings) -> Result<Arc<NameServiceClient>> {
    let transport = Arc::new(
        JsonRpcTransport::new(&settings.rpc_url)
            .with_context(|| format!("cannot use rpc url '{}'", settings.rpc_url))?,
    );
    let wallet = Arc::new(RpcWalletProvider::new(Arc::clone(&transport)));
    let registry = Arc::new(RpcNameRegistry::new(transport));
    Ok(NameServiceClient::new(
        wallet,
        registry,
        ClientOptions {
            target: settings.target.clone(),
            networks: NetworkTable::default(),
            settle_delay: settings.settle_delay,
        },
    ))
}

fn print_entries(settings: &ClientSettings, entries: &[Registration], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("no names registered");
    }
    for entry in entries {
        println!(
            "{:>3}  {:<24} {}  {}",
            entry.id,
            settings.display_name(&entry.name),
            entry.owner,
            entry.record
        );
    }
    Ok(())
}

/// The wallet has no push channel over JSON-RPC, so the chain id is polled
/// and the watcher reacts to the change notifications that polling yields.
async fn watch(client: &Arc<NameServiceClient>, poll: Duration) -> Result<()> {
    let mut events = client.subscribe_events();
    let watcher = client.spawn_chain_watcher();
    let mut ticker = tokio::time::interval(poll);
    println!("watching, press ctrl-c to stop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                client.network_guard().current_network().await;
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    println!("(missed {skipped} events)");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    watcher.abort();
    Ok(())
}

fn print_event(event: &ClientEvent) {
    match event {
        ClientEvent::AccountChanged(Some(account)) => println!("account: {account}"),
        ClientEvent::AccountChanged(None) => println!("account: disconnected"),
        ClientEvent::NetworkChanged {
            network: Some(network),
            ..
        } => println!("network: {network}"),
        ClientEvent::NetworkChanged { chain_id, .. } => match chain_id {
            Some(chain_id) => println!("network: unknown ({chain_id})"),
            None => println!("network: unavailable"),
        },
        ClientEvent::SessionInvalidated => println!("session reloaded"),
        ClientEvent::CatalogUpdated(entries) => println!("catalog: {} names", entries.len()),
        ClientEvent::WorkflowStateChanged(state) => println!("workflow: {state:?}"),
        ClientEvent::Notice(message) => println!("notice: {message}"),
    }
}
