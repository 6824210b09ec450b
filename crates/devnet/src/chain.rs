//! In-memory chain state behind the devnet: one simulated wallet plus the
//! name registry contract deployed on a single chain.

use std::{
    collections::{BTreeSet, HashMap},
    time::Duration,
};

use shared::{
    domain::{
        Address, BlockNumber, ChainDescriptor, ChainId, Receipt, TxHash, TxStatus, Wei,
    },
    error::{ErrorCode, RpcError},
};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::Settings;

const MIN_NAME_LEN: usize = 3;
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Fee the registry contract charges for `name`, or `None` when the name is
/// too short to register.
pub fn registry_fee(name: &str) -> Option<Wei> {
    match name.chars().count() {
        len if len < MIN_NAME_LEN => None,
        3 => Some(Wei::from_milli(500)),
        4 => Some(Wei::from_milli(300)),
        _ => Some(Wei::from_milli(100)),
    }
}

struct PendingReceipt {
    receipt: Receipt,
    ready_at: Instant,
}

pub struct DevChain {
    accounts: Vec<Address>,
    authorized: bool,
    auto_approve: bool,
    chain_id: ChainId,
    registry_chain: ChainId,
    known_chains: BTreeSet<ChainId>,
    names: Vec<String>,
    owners: HashMap<String, Address>,
    records: HashMap<String, String>,
    receipts: HashMap<TxHash, PendingReceipt>,
    block: u64,
    confirmation_delay: Duration,
}

impl DevChain {
    pub fn new(settings: &Settings) -> Self {
        Self {
            accounts: settings.accounts.clone(),
            authorized: settings.pre_authorized,
            auto_approve: settings.auto_approve,
            chain_id: settings.chain_id,
            registry_chain: settings.registry_chain_id,
            known_chains: settings
                .known_chains
                .iter()
                .copied()
                .chain([settings.chain_id])
                .collect(),
            names: Vec::new(),
            owners: HashMap::new(),
            records: HashMap::new(),
            receipts: HashMap::new(),
            block: 0,
            confirmation_delay: settings.confirmation_delay,
        }
    }

    pub fn authorized_accounts(&self) -> Vec<Address> {
        if self.authorized {
            self.accounts.clone()
        } else {
            Vec::new()
        }
    }

    pub fn request_accounts(&mut self) -> Result<Vec<Address>, RpcError> {
        if !self.auto_approve {
            info!("wallet: account request declined");
            return Err(RpcError::new(
                ErrorCode::UserRejected,
                "User rejected the request.",
            ));
        }
        self.authorized = true;
        Ok(self.accounts.clone())
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn switch_chain(&mut self, chain_id: ChainId) -> Result<(), RpcError> {
        if !self.known_chains.contains(&chain_id) {
            return Err(RpcError::new(
                ErrorCode::UnrecognizedChain,
                format!("Unrecognized chain ID \"{chain_id}\". Try adding the chain using wallet_addEthereumChain first."),
            ));
        }
        info!(from = %self.chain_id, to = %chain_id, "wallet: switched chain");
        self.chain_id = chain_id;
        Ok(())
    }

    /// Learns the chain and switches to it.
    pub fn add_chain(&mut self, descriptor: &ChainDescriptor) -> Result<(), RpcError> {
        descriptor
            .validate()
            .map_err(|err| RpcError::new(ErrorCode::InvalidParams, err.to_string()))?;
        self.known_chains.insert(descriptor.chain_id);
        info!(chain_id = %descriptor.chain_id, name = %descriptor.chain_name, "wallet: added chain");
        self.chain_id = descriptor.chain_id;
        Ok(())
    }

    /// Payable registration. Insufficient payment, a taken name or a name
    /// below the minimum length still yields a transaction, with a failed
    /// receipt.
    pub fn register(&mut self, from: &Address, name: &str, value: Wei) -> Result<TxHash, RpcError> {
        self.require_registry(from)?;
        let status = match registry_fee(name) {
            None => {
                warn!(name, "registry: name too short");
                TxStatus::Failure
            }
            Some(fee) if value < fee => {
                warn!(name, paid = %value, fee = %fee, "registry: insufficient payment");
                TxStatus::Failure
            }
            Some(_) if self.owners.contains_key(name) => {
                warn!(name, "registry: name already taken");
                TxStatus::Failure
            }
            Some(_) => {
                self.names.push(name.to_string());
                self.owners.insert(name.to_string(), from.clone());
                info!(name, owner = %from, "registry: registered");
                TxStatus::Success
            }
        };
        Ok(self.issue(status))
    }

    /// Only the owner may set a record; anyone else gets a failed receipt.
    pub fn set_record(&mut self, from: &Address, name: &str, record: &str) -> Result<TxHash, RpcError> {
        self.require_registry(from)?;
        let status = match self.owners.get(name) {
            Some(owner) if owner == from => {
                self.records.insert(name.to_string(), record.to_string());
                info!(name, "registry: record set");
                TxStatus::Success
            }
            _ => {
                warn!(name, sender = %from, "registry: set record by non-owner");
                TxStatus::Failure
            }
        };
        Ok(self.issue(status))
    }

    pub fn names(&self) -> Vec<String> {
        self.names.clone()
    }

    pub fn record(&self, name: &str) -> String {
        self.records.get(name).cloned().unwrap_or_default()
    }

    pub fn owner(&self, name: &str) -> Address {
        self.owners
            .get(name)
            .cloned()
            .unwrap_or_else(|| Address::new(ZERO_ADDRESS))
    }

    /// `None` until the confirmation delay has passed, and for unknown hashes.
    pub fn receipt(&self, hash: &TxHash) -> Option<Receipt> {
        self.receipts
            .get(hash)
            .filter(|pending| Instant::now() >= pending.ready_at)
            .map(|pending| pending.receipt.clone())
    }

    fn require_registry(&self, from: &Address) -> Result<(), RpcError> {
        if self.chain_id != self.registry_chain {
            return Err(RpcError::new(
                ErrorCode::Internal,
                format!("no registry deployed on chain {}", self.chain_id),
            ));
        }
        if !self.authorized || !self.accounts.contains(from) {
            return Err(RpcError::new(
                ErrorCode::InvalidParams,
                format!("sender {from} is not an authorized account"),
            ));
        }
        Ok(())
    }

    fn issue(&mut self, status: TxStatus) -> TxHash {
        self.block += 1;
        let hash = TxHash(format!("0x{:064x}", self.block));
        self.receipts.insert(
            hash.clone(),
            PendingReceipt {
                receipt: Receipt {
                    transaction_hash: hash.clone(),
                    status,
                    block_number: BlockNumber(self.block),
                },
                ready_at: Instant::now() + self.confirmation_delay,
            },
        );
        hash
    }
}

#[cfg(test)]
#[path = "tests/chain_tests.rs"]
mod tests;
