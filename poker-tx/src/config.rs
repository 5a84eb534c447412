//! Network configuration.
//!
//! Everything that identifies a target network lives in [`NetworkConfig`] and is
//! passed into the pipeline explicitly, so several networks can be driven from
//! one process.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Production gRPC endpoint.
pub const POKERCHAIN_GRPC_URL: &str = "https://node.texashodl.net:9443";
/// Production chain identifier.
pub const POKERCHAIN_CHAIN_ID: &str = "pokerchain";
/// Bech32 prefix for pokerchain accounts.
pub const POKERCHAIN_ADDRESS_PREFIX: &str = "b52";
/// SLIP-44 coin type shared with the Cosmos hub.
pub const COSMOS_COIN_TYPE: u32 = 118;
/// Default gas ceiling per transaction.
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;
/// Fee amount paid per transaction.
pub const DEFAULT_FEE_AMOUNT: u128 = 300;
/// Fee denomination.
pub const DEFAULT_FEE_DENOM: &str = "stake";
/// Upper bound on each remote call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Offset marking a hardened BIP-32 child index.
pub const HARDENED: u32 = 0x8000_0000;

/// BIP-44 derivation path `m/purpose'/coin_type'/account'/change/address_index`.
///
/// The hardened components are fixed by the network; changing any of them moves
/// the keypair into a different address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationPath {
    /// BIP-43 purpose, always 44 for BIP-44 wallets.
    pub purpose: u32,
    /// SLIP-44 registered coin type.
    pub coin_type: u32,
    /// Account index.
    pub account: u32,
    /// External (0) or internal (1) chain.
    pub change: u32,
    /// Address index within the chain.
    pub address_index: u32,
}

impl DerivationPath {
    /// The path the Cosmos SDK derives by default: `m/44'/118'/0'/0/0`.
    pub const fn cosmos() -> Self {
        Self {
            purpose: 44,
            coin_type: COSMOS_COIN_TYPE,
            account: 0,
            change: 0,
            address_index: 0,
        }
    }

    /// Child indices in derivation order, hardened components flagged.
    pub fn indices(&self) -> [u32; 5] {
        [
            self.purpose | HARDENED,
            self.coin_type | HARDENED,
            self.account | HARDENED,
            self.change,
            self.address_index,
        ]
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self::cosmos()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}/{}",
            self.purpose, self.coin_type, self.account, self.change, self.address_index
        )
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidParameters {
            field: "derivation_path",
            reason: format!("{reason} in '{s}'"),
        };

        let mut parts = s.split('/');
        if parts.next() != Some("m") {
            return Err(invalid("path must start with 'm'"));
        }

        let parts: Vec<&str> = parts.collect();
        if parts.len() != 5 {
            return Err(invalid("expected five components"));
        }

        let mut values = [0u32; 5];
        for (i, part) in parts.iter().enumerate() {
            let hardened = part.ends_with('\'');
            // The first three components are hardened, the last two are not.
            if hardened != (i < 3) {
                return Err(invalid("wrong hardening"));
            }
            values[i] = part
                .trim_end_matches('\'')
                .parse()
                .map_err(|_| invalid("non numeric component"))?;
            if values[i] >= HARDENED {
                return Err(invalid("component out of range"));
            }
        }

        Ok(Self {
            purpose: values[0],
            coin_type: values[1],
            account: values[2],
            change: values[3],
            address_index: values[4],
        })
    }
}

/// A fee amount in a single denomination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fee {
    /// Token denomination.
    pub denom: String,
    /// Amount in the smallest unit.
    pub amount: u128,
}

impl Fee {
    /// Creates a fee.
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl Default for Fee {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_DENOM, DEFAULT_FEE_AMOUNT)
    }
}

/// Everything the pipeline needs to know about its target network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// gRPC endpoint of the node. `https` enables TLS.
    pub grpc_url: Url,
    /// Chain identifier bound into every signature.
    pub chain_id: String,
    /// Bech32 prefix of account addresses.
    pub address_prefix: String,
    /// HD path used to derive the signing key.
    pub derivation_path: DerivationPath,
    /// Fee attached to each transaction.
    pub fee: Fee,
    /// Gas ceiling attached to each transaction.
    pub gas_limit: u64,
    /// Optional memo written into the transaction body.
    pub memo: String,
    /// Upper bound on the account lookup and on the broadcast.
    pub request_timeout: Duration,
}

impl NetworkConfig {
    /// Production pokerchain network.
    pub fn pokerchain() -> Self {
        Self {
            // Constant literal, parsing cannot fail.
            grpc_url: Url::parse(POKERCHAIN_GRPC_URL).unwrap_or_else(|_| unreachable!()),
            chain_id: POKERCHAIN_CHAIN_ID.to_string(),
            address_prefix: POKERCHAIN_ADDRESS_PREFIX.to_string(),
            derivation_path: DerivationPath::cosmos(),
            fee: Fee::default(),
            gas_limit: DEFAULT_GAS_LIMIT,
            memo: String::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// A node running on this machine with plaintext gRPC.
    pub fn localnet() -> Self {
        Self {
            grpc_url: Url::parse("http://127.0.0.1:9090").unwrap_or_else(|_| unreachable!()),
            ..Self::pokerchain()
        }
    }

    /// Whether the gRPC channel is secured with TLS.
    pub fn uses_tls(&self) -> bool {
        self.grpc_url.scheme() == "https"
    }

    /// Endpoint string handed to the gRPC transport, without a trailing slash.
    pub fn endpoint(&self) -> String {
        self.grpc_url.as_str().trim_end_matches('/').to_string()
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::pokerchain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn we_can_round_trip_the_cosmos_path_through_its_string_form() {
        let path = DerivationPath::cosmos();
        assert_eq!(path.to_string(), "m/44'/118'/0'/0/0");
        assert_eq!(path.to_string().parse::<DerivationPath>().unwrap(), path);
    }

    #[test]
    fn we_cannot_parse_paths_with_wrong_hardening_or_length() {
        assert!("m/44/118'/0'/0/0".parse::<DerivationPath>().is_err());
        assert!("m/44'/118'/0'/0'/0".parse::<DerivationPath>().is_err());
        assert!("m/44'/118'/0'/0".parse::<DerivationPath>().is_err());
        assert!("44'/118'/0'/0/0".parse::<DerivationPath>().is_err());
        assert!("m/44'/x'/0'/0/0".parse::<DerivationPath>().is_err());
    }

    #[test]
    fn hardened_components_are_flagged_in_indices() {
        let indices = DerivationPath::cosmos().indices();
        assert_eq!(indices, [44 | HARDENED, 118 | HARDENED, HARDENED, 0, 0]);
    }

    #[test]
    fn tls_follows_the_url_scheme() {
        assert!(NetworkConfig::pokerchain().uses_tls());
        assert!(!NetworkConfig::localnet().uses_tls());
        assert_eq!(
            NetworkConfig::pokerchain().endpoint(),
            "https://node.texashodl.net:9443"
        );
    }
}
