//! Error type shared by every stage of the pipeline.

use std::fmt;
use std::time::Duration;

use snafu::Snafu;

/// The pipeline stage an error originated from.
///
/// Every diagnostic printed for a failed invocation names one of these so the
/// operator knows how far the submission got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Loading the credential or deriving the keypair.
    KeyDerivation,
    /// Opening the channel to the node.
    Connect,
    /// Fetching account number and sequence from the ledger.
    AccountLookup,
    /// Validating and rendering the action payload.
    MessageBuild,
    /// Assembling the unsigned transaction.
    Assembly,
    /// Signing the canonical bytes.
    Signing,
    /// Submitting the signed transaction.
    Broadcast,
    /// Reading the submission result.
    Interpretation,
    /// A read-only query that is not part of the submission pipeline.
    Query,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::KeyDerivation => "key derivation",
            Stage::Connect => "connection",
            Stage::AccountLookup => "account lookup",
            Stage::MessageBuild => "message build",
            Stage::Assembly => "transaction assembly",
            Stage::Signing => "signing",
            Stage::Broadcast => "broadcast",
            Stage::Interpretation => "result interpretation",
            Stage::Query => "query",
        };
        f.write_str(name)
    }
}

/// Why the signer refused to produce a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// The keypair's public key differs from the one declared in the signing context.
    PublicKeyMismatch,
    /// The sequence embedded in the auth info differs from the signing context.
    SequenceMismatch {
        /// Sequence found in the encoded auth info.
        embedded: u64,
        /// Sequence carried by the signing context.
        context: u64,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::PublicKeyMismatch => {
                f.write_str("keypair does not match the public key in the signing context")
            }
            RejectReason::SequenceMismatch { embedded, context } => write!(
                f,
                "embedded sequence {embedded} does not match signing context sequence {context}"
            ),
        }
    }
}

/// Represents errors that can occur while deriving keys, building, signing and
/// submitting pokerchain transactions.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Error when reading a seed phrase from a file.
    #[snafu(display("Failed to read seed phrase from file '{}': {}", path, source))]
    SeedFileRead {
        /// The path of the seed file that could not be read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The seed phrase failed BIP-39 validation (unknown word, bad length or checksum).
    #[snafu(display("Invalid seed phrase: {source}"))]
    InvalidSeedPhrase {
        /// The underlying mnemonic error.
        source: bip39::Error,
    },

    /// Hierarchical derivation produced an unusable child key.
    #[snafu(display("Key derivation failed: {reason}"))]
    KeyDerivation {
        /// What went wrong.
        reason: String,
    },

    /// The account identifier could not be rendered or parsed as bech32.
    #[snafu(display("Invalid account address for prefix '{prefix}': {source}"))]
    AddressEncoding {
        /// The bech32 human readable prefix in use.
        prefix: String,
        /// The underlying bech32 error.
        source: bech32::Error,
    },

    /// An action parameter violated its structural constraints.
    #[snafu(display("Invalid parameter '{field}': {reason}"))]
    InvalidParameters {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The ledger has never seen this account; it needs funding first.
    #[snafu(display("Account {address} not found on chain (has it been funded?)"))]
    AccountNotFound {
        /// The bech32 address that was looked up.
        address: String,
    },

    /// A payload or transaction could not be canonically encoded or decoded.
    #[snafu(display("Encoding error: {reason}"))]
    EncodingError {
        /// What could not be encoded.
        reason: String,
    },

    /// Curve arithmetic failed while signing.
    #[snafu(display("Signing error: {source}"))]
    SigningError {
        /// The underlying ECDSA error.
        source: k256::ecdsa::Error,
    },

    /// The signer refused to sign because the signing context is inconsistent.
    #[snafu(display("Transaction rejected locally: {reason}"))]
    LocalRejection {
        /// Which consistency check failed.
        reason: RejectReason,
    },

    /// The configured endpoint is not a valid URI.
    #[snafu(display("Invalid endpoint '{endpoint}': {source}"))]
    InvalidEndpoint {
        /// The endpoint as configured.
        endpoint: String,
        /// The underlying URI error.
        source: tonic::codegen::http::uri::InvalidUri,
    },

    /// The node could not be reached (connection refused, TLS handshake failure, ...).
    #[snafu(display("Error connecting to {endpoint}: {source}"))]
    TransportError {
        /// The endpoint that was dialled.
        endpoint: String,
        /// The underlying transport error.
        source: tonic::transport::Error,
    },

    /// The node has no table with this id.
    #[snafu(display("Table {table_id} not found on chain"))]
    TableNotFound {
        /// The requested table id.
        table_id: String,
    },

    /// The node answered an RPC with a non-OK gRPC status.
    #[snafu(display("RPC {method} failed: {source}"))]
    RpcFailed {
        /// Fully qualified gRPC method.
        method: &'static str,
        /// The status returned by the node.
        source: tonic::Status,
    },

    /// The node answered with a response missing required fields.
    #[snafu(display("Malformed response from {method}: {reason}"))]
    MalformedResponse {
        /// Fully qualified gRPC method.
        method: &'static str,
        /// What was missing or unexpected.
        reason: String,
    },

    /// A remote call did not complete within the configured timeout.
    #[snafu(display("Timed out during {stage} after {}s", after.as_secs_f64()))]
    Timeout {
        /// The stage that was waiting.
        stage: Stage,
        /// The configured timeout.
        after: Duration,
    },

    /// The caller cancelled the pipeline while a remote call was pending.
    #[snafu(display("Cancelled during {stage}"))]
    Cancelled {
        /// The stage that was waiting.
        stage: Stage,
    },

    /// The ledger accepted the request but rejected the transaction.
    #[snafu(display("Transaction failed with code {code} ({codespace}): {raw_log}"))]
    RejectedByLedger {
        /// Non-zero ABCI result code.
        code: u32,
        /// Module namespace for the code.
        codespace: String,
        /// Raw diagnostic log, verbatim.
        raw_log: String,
        /// Hash of the rejected transaction, when the node reported one.
        tx_hash: String,
    },
}

impl Error {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Error::SeedFileRead { .. }
            | Error::InvalidSeedPhrase { .. }
            | Error::KeyDerivation { .. }
            | Error::AddressEncoding { .. } => Stage::KeyDerivation,
            Error::InvalidParameters { .. } => Stage::MessageBuild,
            Error::AccountNotFound { .. } => Stage::AccountLookup,
            Error::EncodingError { .. } => Stage::Assembly,
            Error::SigningError { .. } | Error::LocalRejection { .. } => Stage::Signing,
            Error::InvalidEndpoint { .. } | Error::TransportError { .. } => Stage::Connect,
            Error::TableNotFound { .. } => Stage::Query,
            Error::RpcFailed { method, .. } | Error::MalformedResponse { method, .. } => {
                stage_for_method(method)
            }
            Error::Timeout { stage, .. } | Error::Cancelled { stage } => *stage,
            Error::RejectedByLedger { .. } => Stage::Interpretation,
        }
    }
}

/// Maps a gRPC method path onto the stage that issues it.
fn stage_for_method(method: &str) -> Stage {
    if method.ends_with("/Account") {
        Stage::AccountLookup
    } else if method.ends_with("/BroadcastTx") {
        Stage::Broadcast
    } else {
        Stage::Query
    }
}

/// Type alias for results that return a `Result<T, Error>`, simplifying error handling.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_failures_are_not_reported_as_broadcasts() {
        let uri_error = "not a uri".parse::<tonic::codegen::http::Uri>().unwrap_err();
        let error = Error::InvalidEndpoint {
            endpoint: "not a uri".to_string(),
            source: uri_error,
        };
        assert_eq!(error.stage(), Stage::Connect);
        assert_eq!(error.stage().to_string(), "connection");
    }

    #[test]
    fn rpc_failures_map_to_the_stage_of_their_method() {
        let failed = |method| Error::RpcFailed {
            method,
            source: tonic::Status::unavailable("down"),
        };
        assert_eq!(
            failed("/cosmos.auth.v1beta1.Query/Account").stage(),
            Stage::AccountLookup
        );
        assert_eq!(
            failed("/cosmos.tx.v1beta1.Service/BroadcastTx").stage(),
            Stage::Broadcast
        );
        assert_eq!(
            failed("/cosmos.bank.v1beta1.Query/AllBalances").stage(),
            Stage::Query
        );
        assert_eq!(
            failed("/pokerchain.poker.v1.Query/Game").stage(),
            Stage::Query
        );
    }
}
