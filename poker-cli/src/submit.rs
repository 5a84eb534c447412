use anyhow::Error;
use log::info;
use poker_tx::{Accepted, GrpcLedgerClient, TableAction, TxPipeline};
use serde::Serialize;

/// What gets printed as JSON after a submission.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub(crate) enum Report<'a> {
    /// The ledger took the transaction.
    Accepted {
        /// Signing account.
        signer: &'a str,
        /// The submitted payload.
        payload: &'a TableAction,
        /// Ledger acknowledgement.
        result: &'a Accepted,
    },
    /// The ledger refused the transaction.
    Rejected {
        /// Signing account.
        signer: &'a str,
        /// The submitted payload.
        payload: &'a TableAction,
        /// Remote result code.
        code: u32,
        /// Module that produced the code.
        codespace: &'a str,
        /// Remote log, verbatim.
        raw_log: &'a str,
        /// Hash of the refused transaction.
        tx_hash: &'a str,
    },
}

/// Submits `action` and prints the outcome.
///
/// A ledger rejection is printed in full and then returned as the error.
pub(crate) async fn submit_action(
    pipeline: &TxPipeline<GrpcLedgerClient>,
    action: TableAction,
) -> Result<(), Error> {
    let signer = pipeline.account_id().as_str();
    info!("Submitting {} as {signer}", action.describe());

    match pipeline.submit(&action).await {
        Ok(accepted) => {
            println!("✅ {} accepted", action.describe());
            println!("   tx hash: {}", accepted.tx_hash);
            print_json(&Report::Accepted {
                signer,
                payload: &action,
                result: &accepted,
            })?;
            Ok(())
        }
        Err(err) => {
            if let poker_tx::Error::RejectedByLedger {
                code,
                codespace,
                raw_log,
                tx_hash,
            } = &err
            {
                println!("❌ {} rejected by the ledger (code {code})", action.describe());
                print_json(&Report::Rejected {
                    signer,
                    payload: &action,
                    code: *code,
                    codespace,
                    raw_log,
                    tx_hash,
                })?;
            }
            Err(err.into())
        }
    }
}

/// Pretty-prints `value` to stdout.
pub(crate) fn print_json(value: &impl Serialize) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
