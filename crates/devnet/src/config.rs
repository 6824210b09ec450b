use std::{collections::HashMap, fs, path::Path, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use shared::domain::{Address, ChainId};

pub const SETTINGS_FILE: &str = "devnet.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    /// Chain the simulated wallet is on at startup.
    pub chain_id: ChainId,
    /// Chain the registry contract is deployed on.
    pub registry_chain_id: ChainId,
    /// Chains the simulated wallet can switch to without being told about them.
    pub known_chains: Vec<ChainId>,
    pub accounts: Vec<Address>,
    /// Whether the accounts start out authorized for `eth_accounts`.
    pub pre_authorized: bool,
    /// Answers every `eth_requestAccounts` prompt with approval; otherwise 4001.
    pub auto_approve: bool,
    pub confirmation_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8545".into(),
            chain_id: ChainId(0x1),
            registry_chain_id: ChainId(0x13881),
            known_chains: vec![ChainId(0x1), ChainId(0x89)],
            accounts: vec![
                Address::new("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
                Address::new("0x70997970C51812dc3A010C7d01b50e0d17dc79C8"),
            ],
            pre_authorized: false,
            auto_approve: true,
            confirmation_delay: Duration::from_millis(1500),
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    if Path::new(SETTINGS_FILE).exists() {
        let raw = fs::read_to_string(SETTINGS_FILE)
            .with_context(|| format!("failed to read {SETTINGS_FILE}"))?;
        apply_file(&mut settings, &raw)?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

/// Applies a flat `key = "value"` toml document over `settings`.
pub fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: HashMap<String, toml::Value> =
        toml::from_str(raw).context("devnet.toml is not valid toml")?;
    for (key, value) in file_cfg {
        let value = match value {
            toml::Value::String(text) => text,
            other => other.to_string(),
        };
        apply_key(settings, &key, &value)
            .with_context(|| format!("invalid value for '{key}' in {SETTINGS_FILE}"))?;
    }
    Ok(())
}

/// Environment overrides. `APP__*` names win over `DEVNET_*` names.
pub fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    const KEYS: &[(&str, &str, &str)] = &[
        ("bind_addr", "DEVNET_BIND", "APP__BIND_ADDR"),
        ("chain_id", "DEVNET_CHAIN_ID", "APP__CHAIN_ID"),
        ("registry_chain_id", "DEVNET_REGISTRY_CHAIN_ID", "APP__REGISTRY_CHAIN_ID"),
        ("known_chains", "DEVNET_KNOWN_CHAINS", "APP__KNOWN_CHAINS"),
        ("accounts", "DEVNET_ACCOUNTS", "APP__ACCOUNTS"),
        ("pre_authorized", "DEVNET_PRE_AUTHORIZED", "APP__PRE_AUTHORIZED"),
        ("auto_approve", "DEVNET_AUTO_APPROVE", "APP__AUTO_APPROVE"),
        (
            "confirmation_delay_ms",
            "DEVNET_CONFIRMATION_DELAY_MS",
            "APP__CONFIRMATION_DELAY_MS",
        ),
    ];
    for (key, devnet_var, app_var) in KEYS {
        for var in [*devnet_var, *app_var] {
            if let Some(value) = lookup(var) {
                apply_key(settings, key, &value)
                    .with_context(|| format!("invalid value in {var}"))?;
            }
        }
    }
    Ok(())
}

fn apply_key(settings: &mut Settings, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "bind_addr" => settings.bind_addr = value.to_string(),
        "chain_id" => settings.chain_id = parse_chain(value)?,
        "registry_chain_id" => settings.registry_chain_id = parse_chain(value)?,
        "known_chains" => {
            settings.known_chains = split_list(value)
                .map(parse_chain)
                .collect::<anyhow::Result<_>>()?;
        }
        "accounts" => settings.accounts = split_list(value).map(Address::new).collect(),
        "pre_authorized" => settings.pre_authorized = value.parse()?,
        "auto_approve" => settings.auto_approve = value.parse()?,
        "confirmation_delay_ms" => {
            settings.confirmation_delay = Duration::from_millis(value.parse()?);
        }
        _ => tracing::warn!(key, "devnet: ignoring unknown setting"),
    }
    Ok(())
}

fn parse_chain(value: &str) -> anyhow::Result<ChainId> {
    ChainId::from_str(value.trim()).map_err(|err| anyhow!("bad chain id '{value}': {err}"))
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|item| item.trim().trim_matches('"'))
        .filter(|item| !item.is_empty())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
