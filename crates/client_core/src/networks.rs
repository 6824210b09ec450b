use std::collections::BTreeMap;

use shared::domain::{ChainId, NetworkName};

const KNOWN_NETWORKS: &[(u64, &str)] = &[
    (0x1, "Mainnet"),
    (0x3, "Ropsten"),
    (0x2a, "Kovan"),
    (0x4, "Rinkeby"),
    (0x5, "Goerli"),
    (0x61, "BSC Testnet"),
    (0x38, "BSC Mainnet"),
    (0x89, "Polygon Mainnet"),
    (0x13881, "Polygon Mumbai Testnet"),
    (0xa86a, "AVAX Mainnet"),
];

/// Static chain id to display name mapping.
#[derive(Debug, Clone)]
pub struct NetworkTable {
    names: BTreeMap<ChainId, NetworkName>,
}

impl Default for NetworkTable {
    fn default() -> Self {
        Self::from_entries(
            KNOWN_NETWORKS
                .iter()
                .map(|(id, name)| (ChainId(*id), (*name).to_string())),
        )
    }
}

impl NetworkTable {
    pub fn from_entries(entries: impl IntoIterator<Item = (ChainId, String)>) -> Self {
        Self {
            names: entries
                .into_iter()
                .map(|(id, name)| (id, NetworkName(name)))
                .collect(),
        }
    }

    pub fn with_entry(mut self, chain_id: ChainId, name: impl Into<String>) -> Self {
        self.names.insert(chain_id, NetworkName(name.into()));
        self
    }

    pub fn lookup(&self, chain_id: ChainId) -> Option<NetworkName> {
        self.names.get(&chain_id).cloned()
    }
}
