use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Decimal places of the native currency on every supported chain.
pub const NATIVE_DECIMALS: u32 = 18;
const WEI_PER_MILLI: u128 = 10u128.pow(NATIVE_DECIMALS - 3);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid hex quantity '{0}'")]
pub struct QuantityParseError(pub String);

fn parse_quantity(raw: &str) -> Result<u128, QuantityParseError> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() => u128::from_str_radix(hex, 16),
        Some(_) => return Err(QuantityParseError(raw.to_string())),
        None => trimmed.parse::<u128>(),
    };
    parsed.map_err(|_| QuantityParseError(raw.to_string()))
}

/// Account address as reported by the wallet provider.
///
/// Comparison and hashing ignore ASCII case so checksummed and lowercase
/// renderings of the same account are treated as one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0
            .trim_start_matches("0x")
            .chars()
            .all(|character| character == '0')
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! quantity_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:x}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = QuantityParseError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let value = parse_quantity(raw)?;
                u64::try_from(value)
                    .map($name)
                    .map_err(|_| QuantityParseError(raw.to_string()))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

quantity_newtype!(ChainId);
quantity_newtype!(BlockNumber);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkName(pub String);

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Amount in the smallest unit of the native currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Wei(pub u128);

impl Wei {
    pub const fn from_milli(milli: u128) -> Self {
        Self(milli * WEI_PER_MILLI)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = 10u128.pow(NATIVE_DECIMALS);
        let whole = self.0 / unit;
        let fraction = self.0 % unit;
        if fraction == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{fraction:0width$}", width = NATIVE_DECIMALS as usize);
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("0x{:x}", self.0))
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_quantity(&raw).map(Wei).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failure,
}

impl Serialize for TxStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            TxStatus::Success => "0x1",
            TxStatus::Failure => "0x0",
        })
    }
}

impl<'de> Deserialize<'de> for TxStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match parse_quantity(&raw).map_err(de::Error::custom)? {
            1 => Ok(TxStatus::Success),
            _ => Ok(TxStatus::Failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub status: TxStatus,
    pub block_number: BlockNumber,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == TxStatus::Success
    }
}

/// A registered name as observed in the most recent catalog fetch.
///
/// `id` is the position of the name in the registry's list at fetch time and
/// carries no meaning across refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: usize,
    pub name: String,
    pub owner: Address,
    pub record: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Parameters handed to the wallet when it must learn about a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("chain descriptor for {0} has no rpc url")]
    MissingRpcUrl(ChainId),
    #[error("chain descriptor url '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ChainDescriptor {
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.rpc_urls.is_empty() {
            return Err(DescriptorError::MissingRpcUrl(self.chain_id));
        }
        for raw in self.rpc_urls.iter().chain(self.block_explorer_urls.iter()) {
            url::Url::parse(raw).map_err(|err| DescriptorError::InvalidUrl {
                url: raw.clone(),
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }

    /// Polygon Mumbai testnet, the chain the registry is deployed on.
    pub fn polygon_mumbai() -> Self {
        Self {
            chain_id: ChainId(0x13881),
            chain_name: "Polygon Mumbai Testnet".to_string(),
            rpc_urls: vec!["https://rpc-mumbai.maticvigil.com/".to_string()],
            native_currency: NativeCurrency {
                name: "Mumbai Matic".to_string(),
                symbol: "MATIC".to_string(),
                decimals: 18,
            },
            block_explorer_urls: vec!["https://mumbai.polygonscan.com/".to_string()],
        }
    }
}
