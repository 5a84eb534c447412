//! # Pokerchain Transaction Library
//!
//! This library derives signing keys from a seed phrase and submits signed
//! table actions (create, join, leave, act) to a pokerchain node over gRPC.

/// Error handling module.
///
/// Defines a custom error type using the `snafu` crate, tagging every failure with the
/// pipeline stage it came from.
pub mod error;

/// Network configuration.
pub mod config;

/// Key derivation module.
///
/// Turns a BIP-39 seed phrase into a secp256k1 keypair and a bech32 account address,
/// and loads seed phrases from disk.
pub mod keys;

/// Protobuf wire types.
pub mod proto;

/// Validated table actions.
pub mod messages;

/// Unsigned transaction assembly.
pub mod assembler;

/// Cryptographic signer module.
///
/// Binds an unsigned transaction to its signing context and produces the `TxRaw` bytes
/// the ledger accepts.
pub mod signer;

/// Ledger client trait and its gRPC implementation.
pub mod transport;

/// Result interpretation
pub mod outcome;

/// Transaction submission module.
///
/// Runs lookup, assembly, signing, broadcast and interpretation once per submission,
/// under a timeout and a cancellation token.
pub mod pipeline;

pub use config::NetworkConfig;
pub use error::{Error, Result, Stage};
pub use keys::{load_seed_phrase, AccountId, SeedPhrase};
pub use messages::{CreateTableParams, PlayerAction, TableAction};
pub use outcome::Accepted;
pub use pipeline::TxPipeline;
pub use transport::{Balance, GrpcLedgerClient, LedgerClient};
