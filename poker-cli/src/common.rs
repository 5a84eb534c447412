use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Error};
use clap::Args;
use log::{info, warn};
use poker_tx::config::Fee;
use poker_tx::{load_seed_phrase, GrpcLedgerClient, NetworkConfig, SeedPhrase, TxPipeline};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Network selection shared by every ledger command.
#[derive(Args, Debug, Clone)]
pub(crate) struct NetworkArgs {
    /// gRPC endpoint of the node; `https` enables TLS
    #[arg(long, env = "POKER_GRPC_URL", global = true)]
    pub grpc_url: Option<Url>,

    /// Chain identifier bound into signatures
    #[arg(long, env = "POKER_CHAIN_ID", global = true)]
    pub chain_id: Option<String>,

    /// Bech32 prefix of account addresses
    #[arg(long, env = "POKER_ADDRESS_PREFIX", global = true)]
    pub address_prefix: Option<String>,

    /// Fee amount attached to each transaction
    #[arg(long, env = "POKER_FEE_AMOUNT", global = true)]
    pub fee_amount: Option<u128>,

    /// Fee denomination
    #[arg(long, env = "POKER_FEE_DENOM", global = true)]
    pub fee_denom: Option<String>,

    /// Gas ceiling attached to each transaction
    #[arg(long, env = "POKER_GAS_LIMIT", global = true)]
    pub gas_limit: Option<u64>,

    /// Seconds to wait for the account lookup and for the broadcast
    #[arg(long, env = "POKER_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Memo written into the transaction body
    #[arg(long, global = true)]
    pub memo: Option<String>,
}

impl NetworkArgs {
    /// Production defaults overridden by whatever was given on the command line.
    pub(crate) fn network_config(&self) -> NetworkConfig {
        let mut config = NetworkConfig::pokerchain();
        if let Some(url) = &self.grpc_url {
            config.grpc_url = url.clone();
        }
        if let Some(chain_id) = &self.chain_id {
            config.chain_id = chain_id.clone();
        }
        if let Some(prefix) = &self.address_prefix {
            config.address_prefix = prefix.clone();
        }
        let denom = self.fee_denom.clone().unwrap_or(config.fee.denom.clone());
        let amount = self.fee_amount.unwrap_or(config.fee.amount);
        config.fee = Fee::new(denom, amount);
        if let Some(gas_limit) = self.gas_limit {
            config.gas_limit = gas_limit;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(memo) = &self.memo {
            config.memo = memo.clone();
        }
        config
    }
}

/// Where the seed phrase comes from. Exactly one source is required.
#[derive(Args, Debug, Clone)]
pub(crate) struct CredentialArgs {
    /// Seed phrase of the signing account
    #[arg(
        long,
        env = "POKER_MNEMONIC",
        hide_env_values = true,
        global = true,
        conflicts_with = "mnemonic_file"
    )]
    pub mnemonic: Option<String>,

    /// File holding the seed phrase
    #[arg(long, env = "POKER_MNEMONIC_FILE", global = true)]
    pub mnemonic_file: Option<PathBuf>,
}

impl CredentialArgs {
    /// Loads and validates the seed phrase.
    pub(crate) async fn seed_phrase(&self) -> Result<SeedPhrase, Error> {
        match (&self.mnemonic, &self.mnemonic_file) {
            (Some(phrase), _) => Ok(SeedPhrase::parse(phrase)?),
            (None, Some(path)) => {
                info!("Reading seed phrase from {}", path.display());
                Ok(load_seed_phrase(&path.to_string_lossy()).await?)
            }
            (None, None) => Err(anyhow!(
                "no seed phrase given: pass --mnemonic, --mnemonic-file, POKER_MNEMONIC or POKER_MNEMONIC_FILE"
            )),
        }
    }
}

/// Connects to the node and prepares a pipeline signing for the configured account.
///
/// Ctrl-C cancels whatever remote call is pending.
pub(crate) async fn create_pipeline(
    network: &NetworkArgs,
    credentials: &CredentialArgs,
) -> Result<TxPipeline<GrpcLedgerClient>, Error> {
    let seed_phrase = credentials.seed_phrase().await?;
    let config = network.network_config();
    info!(
        "Using chain {} at {} (fee {}{}, gas {})",
        config.chain_id, config.grpc_url, config.fee.amount, config.fee.denom, config.gas_limit
    );

    let client = GrpcLedgerClient::connect(&config).await?;
    let pipeline = TxPipeline::new(client, config, &seed_phrase)?;
    Ok(pipeline.with_cancellation(cancel_on_ctrl_c()))
}

/// A token cancelled by the first Ctrl-C.
pub(crate) fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ Interrupted, cancelling");
            trigger.cancel();
        }
    });
    token
}
