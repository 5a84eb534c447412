use anyhow::Error;
use log::warn;
use poker_tx::keys::derive;
use poker_tx::messages::validate_table_id;
use poker_tx::{GrpcLedgerClient, LedgerClient, NetworkConfig, SeedPhrase, TxPipeline};
use serde_json::{json, Value};

use crate::submit::print_json;

/// Prints the account address derived from `seed_phrase` without touching the network.
pub(crate) fn print_address(config: &NetworkConfig, seed_phrase: &SeedPhrase) -> Result<(), Error> {
    let (_, account) = derive(seed_phrase, &config.derivation_path, &config.address_prefix)?;
    println!("{account}");
    print_json(&json!({
        "address": account.as_str(),
        "derivation_path": config.derivation_path.to_string(),
    }))
}

/// Prints the signer's legal actions at `table_id`.
pub(crate) async fn print_legal_actions(
    pipeline: &TxPipeline<GrpcLedgerClient>,
    table_id: &str,
) -> Result<(), Error> {
    let document = pipeline.legal_actions(table_id).await?;
    println!(
        "Legal actions for {} at table {table_id}:",
        pipeline.account_id()
    );
    print_document(&document)
}

/// Prints every balance of the signing account.
pub(crate) async fn print_balances(pipeline: &TxPipeline<GrpcLedgerClient>) -> Result<(), Error> {
    let balances = pipeline.balances().await?;
    if balances.is_empty() {
        println!(
            "No balances found for {} (account may not be funded yet)",
            pipeline.account_id()
        );
    } else {
        println!("Balances of {}:", pipeline.account_id());
        for balance in &balances {
            println!("   {} {}", balance.amount, balance.denom);
        }
    }
    print_json(&json!({
        "address": pipeline.account_id().as_str(),
        "balances": balances,
    }))
}

/// Prints the public state of `table_id`. No seed phrase is needed.
pub(crate) async fn print_game(config: &NetworkConfig, table_id: &str) -> Result<(), Error> {
    let table_id = validate_table_id(table_id)?;
    let client = GrpcLedgerClient::connect(config).await?;
    let document = client.game(&table_id).await?;
    println!("Table {table_id}:");
    print_document(&document)
}

/// Pretty-prints a JSON document returned by the node, or prints it raw.
fn print_document(document: &str) -> Result<(), Error> {
    match serde_json::from_str::<Value>(document) {
        Ok(value) => print_json(&value),
        Err(err) => {
            warn!("⚠️ Response is not valid JSON ({err}), printing as-is");
            println!("{document}");
            Ok(())
        }
    }
}
