//! Interpretation of broadcast results.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::transport::SubmissionResult;

/// A transaction the ledger accepted into its mempool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    /// Uppercase hex transaction hash, as reported by the node.
    pub tx_hash: String,
    /// Block height, zero until the transaction is included.
    pub height: i64,
    /// Gas requested.
    pub gas_wanted: i64,
    /// Gas consumed by the check.
    pub gas_used: i64,
}

/// Splits a submission result into acceptance or [`Error::RejectedByLedger`].
///
/// The remote code, codespace and log are carried through verbatim.
pub fn interpret(result: SubmissionResult) -> Result<Accepted> {
    if result.code != 0 {
        return Err(Error::RejectedByLedger {
            code: result.code,
            codespace: result.codespace,
            raw_log: result.raw_log,
            tx_hash: result.tx_hash,
        });
    }

    Ok(Accepted {
        tx_hash: result.tx_hash,
        height: result.height,
        gas_wanted: result.gas_wanted,
        gas_used: result.gas_used,
    })
}
