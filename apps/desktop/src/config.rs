use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::DEFAULT_SETTLE_DELAY;
use serde::Deserialize;
use shared::domain::ChainDescriptor;

pub const SETTINGS_FILE: &str = "namesvc.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub rpc_url: String,
    pub settle_delay: Duration,
    /// Suffix shown after every registered name.
    pub tld: String,
    pub target: ChainDescriptor,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545/rpc".into(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            tld: ".emoji".into(),
            target: ChainDescriptor::polygon_mumbai(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    rpc_url: Option<String>,
    settle_delay_ms: Option<u64>,
    tld: Option<String>,
    target: Option<ChainDescriptor>,
}

impl ClientSettings {
    pub fn display_name(&self, name: &str) -> String {
        format!("{name}{}", self.tld)
    }
}

/// Defaults, then `path` (or `namesvc.toml` when present), then environment.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    let path = path.unwrap_or_else(|| Path::new(SETTINGS_FILE));
    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid settings in {}", path.display()))?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

pub fn apply_file(settings: &mut ClientSettings, raw: &str) -> anyhow::Result<()> {
    let file: FileSettings = toml::from_str(raw)?;
    if let Some(rpc_url) = file.rpc_url {
        settings.rpc_url = rpc_url;
    }
    if let Some(ms) = file.settle_delay_ms {
        settings.settle_delay = Duration::from_millis(ms);
    }
    if let Some(tld) = file.tld {
        settings.tld = tld;
    }
    if let Some(target) = file.target {
        target.validate()?;
        settings.target = target;
    }
    Ok(())
}

pub fn apply_env(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("NAMESVC_RPC_URL") {
        settings.rpc_url = v;
    }
    if let Some(v) = lookup("APP__RPC_URL") {
        settings.rpc_url = v;
    }
    if let Some(v) = lookup("NAMESVC_SETTLE_DELAY_MS") {
        let ms: u64 = v
            .parse()
            .with_context(|| format!("NAMESVC_SETTLE_DELAY_MS must be milliseconds, got '{v}'"))?;
        settings.settle_delay = Duration::from_millis(ms);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
