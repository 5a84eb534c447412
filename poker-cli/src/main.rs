//! Command line client for pokerchain tables.
//!
//! Derives the signing account from a seed phrase, submits table actions over
//! gRPC and follows table events over WebSocket.
//!
//! ## Usage
//! ```sh
//! export POKER_MNEMONIC_FILE=~/.pokerchain/seed
//! poker-cli address
//! poker-cli balance
//! poker-cli create-table --small-blind 500000 --big-blind 1000000
//! poker-cli join-table 0xabc 3 100000000
//! poker-cli action 0xabc raise 2000000
//! poker-cli game 0xabc
//! poker-cli watch 0xabc
//! ```

mod common;
mod query;
mod submit;
mod watch;

use std::process;

use anyhow::Error;
use clap::{Parser, Subcommand};
use log::error;
use poker_tx::{CreateTableParams, PlayerAction, TableAction};

use crate::common::{CredentialArgs, NetworkArgs};

/// CLI entrypoint
#[derive(Parser, Debug)]
#[command(name = "poker-cli", version, about = "CLI for playing on pokerchain")]
struct Cli {
    /// Network selection
    #[command(flatten)]
    network: NetworkArgs,

    /// Seed phrase source
    #[command(flatten)]
    credentials: CredentialArgs,

    /// Event server for `watch`
    #[arg(long, env = "POKER_WS_URL", default_value = table_events::client::DEFAULT_EVENT_URL, global = true)]
    ws_url: String,

    /// What to do
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the address of the signing account
    Address,

    /// Create a new table
    CreateTable {
        /// Smallest buy-in
        #[arg(long, default_value_t = 100_000_000)]
        min_buy_in: u64,

        /// Largest buy-in
        #[arg(long, default_value_t = 1_000_000_000)]
        max_buy_in: u64,

        /// Players needed to start a hand
        #[arg(long, default_value_t = 2)]
        min_players: i64,

        /// Seats at the table
        #[arg(long, default_value_t = 9)]
        max_players: i64,

        /// Small blind
        #[arg(long, default_value_t = 500_000)]
        small_blind: u64,

        /// Big blind
        #[arg(long, default_value_t = 1_000_000)]
        big_blind: u64,

        /// Seconds a player may take to act
        #[arg(long, default_value_t = 60)]
        timeout: i64,

        /// Game variant
        #[arg(long, default_value = "nlhe")]
        game_type: String,
    },

    /// Take a seat at a table
    JoinTable {
        /// Table identifier
        table_id: String,

        /// Seat number, starting at 1
        seat: u64,

        /// Chips brought to the table
        buy_in: u64,

        /// Seats at the table, if known
        #[arg(long)]
        capacity: Option<u64>,
    },

    /// Leave a table
    LeaveTable {
        /// Table identifier
        table_id: String,
    },

    /// Act in the current hand
    Action {
        /// Table identifier
        table_id: String,

        /// fold, check, call, bet or raise
        action: String,

        /// Chips for bet and raise
        amount: Option<u64>,
    },

    /// Show the balances of the signing account
    Balance,

    /// Show the public state of a table
    Game {
        /// Table identifier
        table_id: String,
    },

    /// Show the actions the signing account may take at a table
    LegalActions {
        /// Table identifier
        table_id: String,
    },

    /// Stream events for a table
    Watch {
        /// Table identifier
        table_id: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        report_failure(&err);
        process::exit(1);
    }
}

/// Executes one subcommand.
async fn run(cli: Cli) -> Result<(), Error> {
    let action = match cli.command {
        Commands::Address => {
            let seed_phrase = cli.credentials.seed_phrase().await?;
            return query::print_address(&cli.network.network_config(), &seed_phrase);
        }
        Commands::Watch { table_id } => return watch::watch_table(&cli.ws_url, &table_id).await,
        Commands::Balance => {
            let pipeline = common::create_pipeline(&cli.network, &cli.credentials).await?;
            return query::print_balances(&pipeline).await;
        }
        Commands::Game { table_id } => {
            return query::print_game(&cli.network.network_config(), &table_id).await;
        }
        Commands::LegalActions { table_id } => {
            let pipeline = common::create_pipeline(&cli.network, &cli.credentials).await?;
            return query::print_legal_actions(&pipeline, &table_id).await;
        }
        Commands::CreateTable {
            min_buy_in,
            max_buy_in,
            min_players,
            max_players,
            small_blind,
            big_blind,
            timeout,
            game_type,
        } => TableAction::create_table(CreateTableParams {
            min_buy_in,
            max_buy_in,
            min_players,
            max_players,
            small_blind,
            big_blind,
            timeout,
            game_type,
        })?,
        Commands::JoinTable {
            table_id,
            seat,
            buy_in,
            capacity,
        } => TableAction::join_table(&table_id, seat, buy_in, capacity)?,
        Commands::LeaveTable { table_id } => TableAction::leave_table(&table_id)?,
        Commands::Action {
            table_id,
            action,
            amount,
        } => TableAction::perform_action(&table_id, PlayerAction::new(&action, amount)?)?,
    };

    // Parameters are validated above, before any connection is opened.
    let pipeline = common::create_pipeline(&cli.network, &cli.credentials).await?;
    submit::submit_action(&pipeline, action).await
}

/// Prints a diagnostic naming the failing stage.
fn report_failure(err: &Error) {
    match err.downcast_ref::<poker_tx::Error>() {
        Some(err) => {
            println!("❌ {} failed: {err}", err.stage());
            error!("{} failed: {err:?}", err.stage());
        }
        None => {
            println!("❌ {err:#}");
            error!("{err:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn we_can_parse_a_join_table_command() {
        let cli = Cli::parse_from(["poker-cli", "join-table", "0xabc", "3", "1000", "--capacity", "6"]);
        match cli.command {
            Commands::JoinTable {
                table_id,
                seat,
                buy_in,
                capacity,
            } => {
                assert_eq!(table_id, "0xabc");
                assert_eq!(seat, 3);
                assert_eq!(buy_in, 1000);
                assert_eq!(capacity, Some(6));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn create_table_defaults_to_the_reference_table() {
        let cli = Cli::parse_from(["poker-cli", "create-table"]);
        match cli.command {
            Commands::CreateTable {
                min_buy_in,
                big_blind,
                game_type,
                ..
            } => {
                assert_eq!(min_buy_in, 100_000_000);
                assert_eq!(big_blind, 1_000_000);
                assert_eq!(game_type, "nlhe");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn we_can_parse_the_read_only_queries() {
        let cli = Cli::parse_from(["poker-cli", "game", "0xabc"]);
        assert!(matches!(cli.command, Commands::Game { table_id } if table_id == "0xabc"));

        let cli = Cli::parse_from(["poker-cli", "balance"]);
        assert!(matches!(cli.command, Commands::Balance));
    }

    #[tokio::test]
    async fn we_cannot_query_a_malformed_table_id_before_connecting() {
        let cli = Cli::parse_from([
            "poker-cli",
            "--grpc-url",
            "http://127.0.0.1:1",
            "game",
            "0xnothex",
        ]);
        let err = run(cli).await.unwrap_err();
        let err = err.downcast_ref::<poker_tx::Error>().unwrap();
        assert!(matches!(
            err,
            poker_tx::Error::InvalidParameters {
                field: "table_id",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn we_cannot_join_seat_zero_before_connecting() {
        let cli = Cli::parse_from([
            "poker-cli",
            "--grpc-url",
            "http://127.0.0.1:1",
            "--mnemonic",
            "not a real phrase",
            "join-table",
            "0xabc",
            "0",
            "1000",
        ]);
        let err = run(cli).await.unwrap_err();
        let err = err.downcast_ref::<poker_tx::Error>().unwrap();
        assert!(matches!(err, poker_tx::Error::InvalidParameters { field: "seat", .. }));
    }
}
